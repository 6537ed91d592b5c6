use crate::controller::{remote, ApiResponse};
use crate::extractors::{
    authenticated_user::AuthenticatedUser, compare_api_version::CompareApiVersion,
};
use crate::params::transcript::CreateParams;
use crate::{AppState, Error};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::transcript::TranscriptLog;
use log::*;
use service::config::ApiVersion;

/// GET the transcript of a meeting, oldest entry first
#[utoipa::path(
    get,
    path = "/meetings/{code}/transcripts",
    params(
        ApiVersion,
        ("code" = String, Path, description = "Join code of the meeting")
    ),
    responses(
        (status = 200, description = "Successfully retrieved the transcript", body = [domain::transcripts::Model]),
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
    debug!("GET Transcript of {code}");

    let mut log = TranscriptLog::new(remote(&app_state), user.session());
    log.load(&code).await?;

    Ok(Json(ApiResponse::new(
        StatusCode::OK.into(),
        log.entries().to_vec(),
    )))
}

/// POST one finalized utterance, spoken by the caller
#[utoipa::path(
    post,
    path = "/meetings/{code}/transcripts",
    params(
        ApiVersion,
        ("code" = String, Path, description = "Join code of the meeting")
    ),
    request_body = CreateParams,
    responses(
        (status = 201, description = "Successfully stored the entry", body = domain::transcripts::Model),
        (status = 204, description = "Blank content, nothing stored"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Meeting not found"),
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
    let session = user.session();
    let mut log = TranscriptLog::new(remote(&app_state), session.clone());
    log.load(&code).await?;

    match log.add_entry(&session.display_name, &params.content).await? {
        Some(entry) => Ok((
            StatusCode::CREATED,
            Json(ApiResponse::new(StatusCode::CREATED.into(), entry)),
        )
            .into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}
