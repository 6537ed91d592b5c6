use crate::controller::{remote, ApiResponse};
use crate::extractors::{
    authenticated_user::AuthenticatedUser, compare_api_version::CompareApiVersion,
};
use crate::{AppState, Error};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::meeting::MeetingRoom;
use domain::remote::ParticipantChanges;
use log::*;
use service::config::ApiVersion;

/// PUT the caller's own mute, camera, speaking and presence state
#[utoipa::path(
    put,
    path = "/meetings/{code}/participants/me",
    params(
        ApiVersion,
        ("code" = String, Path, description = "Join code of the meeting")
    ),
    request_body = domain::remote::ParticipantChanges,
    responses(
        (status = 200, description = "Successfully updated the caller's participant row", body = domain::participants::Model),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not in this meeting"),
        (status = 422, description = "No changes, or the meeting has ended"),
        (status = 503, description = "Service temporarily unavailable")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn update_me(
    CompareApiVersion(_v): CompareApiVersion,
    user: AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(code): Path<String>,
    Json(changes): Json<ParticipantChanges>,
) -> Result<impl IntoResponse, Error> {
    debug!("PUT participant state in {code}: {changes:?}");

    let mut room = MeetingRoom::new(remote(&app_state), user.session());
    room.load(&code).await?;
    let participant = room.update_status(changes).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), participant)))
}
