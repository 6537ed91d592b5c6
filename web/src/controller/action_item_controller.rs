use crate::controller::{remote, ApiResponse};
use crate::extractors::{
    authenticated_user::AuthenticatedUser, compare_api_version::CompareApiVersion,
};
use crate::{AppState, Error};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::action_item::ActionItemBoard;
use domain::remote::{ActionItemChanges, NewActionItem};
use domain::Id;
use log::*;
use service::config::ApiVersion;

/// GET the action items of a meeting, newest first
#[utoipa::path(
    get,
    path = "/meetings/{code}/action_items",
    params(
        ApiVersion,
        ("code" = String, Path, description = "Join code of the meeting")
    ),
    responses(
        (status = 200, description = "Successfully retrieved the action items", body = [domain::action_items::Model]),
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
    debug!("GET Action items of {code}");

    let mut board = ActionItemBoard::new(remote(&app_state), user.session());
    board.load(&code).await?;

    Ok(Json(ApiResponse::new(
        StatusCode::OK.into(),
        board.items().to_vec(),
    )))
}

/// POST create a pending action item owned by the caller
#[utoipa::path(
    post,
    path = "/meetings/{code}/action_items",
    params(
        ApiVersion,
        ("code" = String, Path, description = "Join code of the meeting")
    ),
    request_body = domain::remote::NewActionItem,
    responses(
        (status = 201, description = "Successfully created the action item", body = domain::action_items::Model),
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
    Json(item): Json<NewActionItem>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST Create action item in {code}: {:?}", item.title);

    let mut board = ActionItemBoard::new(remote(&app_state), user.session());
    board.load(&code).await?;
    let created = board.add(item).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(StatusCode::CREATED.into(), created)),
    ))
}

/// PUT change some fields of an action item
#[utoipa::path(
    put,
    path = "/meetings/{code}/action_items/{id}",
    params(
        ApiVersion,
        ("code" = String, Path, description = "Join code of the meeting"),
        ("id" = Uuid, Path, description = "Id of the action item to update")
    ),
    request_body = domain::remote::ActionItemChanges,
    responses(
        (status = 200, description = "Successfully updated the action item", body = domain::action_items::Model),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Action item not found in this meeting"),
        (status = 422, description = "No changes"),
        (status = 503, description = "Service temporarily unavailable")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn update(
    CompareApiVersion(_v): CompareApiVersion,
    user: AuthenticatedUser,
    State(app_state): State<AppState>,
    Path((code, id)): Path<(String, Id)>,
    Json(changes): Json<ActionItemChanges>,
) -> Result<impl IntoResponse, Error> {
    debug!("PUT Update action item {id} in {code}: {changes:?}");

    let mut board = ActionItemBoard::new(remote(&app_state), user.session());
    board.load(&code).await?;
    let updated = board.update(id, changes).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), updated)))
}

/// PUT flip an action item between completed and pending
#[utoipa::path(
    put,
    path = "/meetings/{code}/action_items/{id}/toggle",
    params(
        ApiVersion,
        ("code" = String, Path, description = "Join code of the meeting"),
        ("id" = Uuid, Path, description = "Id of the action item to toggle")
    ),
    responses(
        (status = 200, description = "Successfully toggled the action item", body = domain::action_items::Model),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Action item not found in this meeting"),
        (status = 503, description = "Service temporarily unavailable")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn toggle(
    CompareApiVersion(_v): CompareApiVersion,
    user: AuthenticatedUser,
    State(app_state): State<AppState>,
    Path((code, id)): Path<(String, Id)>,
) -> Result<impl IntoResponse, Error> {
    debug!("PUT Toggle action item {id} in {code}");

    let mut board = ActionItemBoard::new(remote(&app_state), user.session());
    board.load(&code).await?;
    let toggled = board.toggle(id).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), toggled)))
}
