use crate::controller::{remote, ApiResponse};
use crate::extractors::{
    authenticated_user::AuthenticatedUser, compare_api_version::CompareApiVersion,
};
use crate::params::mind_map::{CreateParams, NodeParams};
use crate::{AppState, Error};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::error::EntityErrorKind;
use domain::mind_map::MindMapBoard;
use domain::Id;
use log::*;
use service::config::ApiVersion;

/// GET the mind maps of a meeting, newest first
#[utoipa::path(
    get,
    path = "/meetings/{code}/mind_maps",
    params(
        ApiVersion,
        ("code" = String, Path, description = "Join code of the meeting")
    ),
    responses(
        (status = 200, description = "Successfully retrieved the mind maps", body = [domain::mind_maps::Model]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Meeting not found"),
        (status = 503, description = "Service temporarily unavailable")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn index(
    CompareApiVersion(_v): CompareApiVersion,
    user: AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET Mind maps of {code}");

    let mut board = MindMapBoard::new(remote(&app_state), user.session());
    board.load(&code).await?;

    Ok(Json(ApiResponse::new(
        StatusCode::OK.into(),
        board.maps().to_vec(),
    )))
}

/// POST create a mind map holding a single central node
#[utoipa::path(
    post,
    path = "/meetings/{code}/mind_maps",
    params(
        ApiVersion,
        ("code" = String, Path, description = "Join code of the meeting")
    ),
    request_body = CreateParams,
    responses(
        (status = 201, description = "Successfully created the mind map", body = domain::mind_maps::Model),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Meeting not found"),
        (status = 422, description = "Unprocessable Entity"),
        (status = 503, description = "Service temporarily unavailable")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn create(
    CompareApiVersion(_v): CompareApiVersion,
    user: AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(code): Path<String>,
    Json(params): Json<CreateParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST Create mind map in {code}: {:?}", params.title);

    let mut board = MindMapBoard::new(remote(&app_state), user.session());
    board.load(&code).await?;
    let mind_map = board.create(&params.title, &params.central_topic).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(StatusCode::CREATED.into(), mind_map)),
    ))
}

/// POST add a node to a mind map
#[utoipa::path(
    post,
    path = "/meetings/{code}/mind_maps/{id}/nodes",
    params(
        ApiVersion,
        ("code" = String, Path, description = "Join code of the meeting"),
        ("id" = Uuid, Path, description = "Id of the mind map to add to")
    ),
    request_body = NodeParams,
    responses(
        (status = 201, description = "Successfully added the node", body = domain::mind_maps::Model),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Mind map not found in this meeting"),
        (status = 409, description = "Kept losing to concurrent edits"),
        (status = 422, description = "Blank text or unknown parent node"),
        (status = 503, description = "Service temporarily unavailable")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn add_node(
    CompareApiVersion(_v): CompareApiVersion,
    user: AuthenticatedUser,
    State(app_state): State<AppState>,
    Path((code, id)): Path<(String, Id)>,
    Json(params): Json<NodeParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST Add node to mind map {id} in {code}: {:?}", params.text);

    let mut board = MindMapBoard::new(remote(&app_state), user.session());
    board.load(&code).await?;
    if !board.select(id) {
        return Err(Error::from(EntityErrorKind::NotFound));
    }
    board.add_node(&params.text, params.parent_id.as_deref()).await?;
    let mind_map = board
        .current()
        .cloned()
        .ok_or_else(|| Error::from(EntityErrorKind::NotFound))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(StatusCode::CREATED.into(), mind_map)),
    ))
}
