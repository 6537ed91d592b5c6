use crate::controller::{remote, ApiResponse};
use crate::extractors::compare_api_version::CompareApiVersion;
use crate::params::recording::UploadParams;
use crate::{AppState, Error};
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::error::EntityErrorKind;
use domain::remote::Remote;
use domain::{meeting as MeetingApi, recording as RecordingApi};
use log::*;
use service::config::ApiVersion;

/// GET the recordings of a meeting
#[utoipa::path(
    get,
    path = "/meetings/{code}/recordings",
    params(
        ApiVersion,
        ("code" = String, Path, description = "Join code of the meeting")
    ),
    responses(
        (status = 200, description = "Successfully retrieved the recordings", body = [domain::recordings::Model]),
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
    State(app_state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET Recordings of {code}");

    let remote = remote(&app_state);
    let meeting = MeetingApi::find_by_code(remote.as_ref(), &code).await?;
    let recordings = remote.list_recordings(meeting.id).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), recordings)))
}

/// POST upload a finished screen recording.
///
/// The request body is the recorded webm blob; the capture window travels in
/// the query string.
#[utoipa::path(
    post,
    path = "/meetings/{code}/recordings",
    params(
        ApiVersion,
        UploadParams,
        ("code" = String, Path, description = "Join code of the meeting")
    ),
    request_body(content = Vec<u8>, content_type = "video/webm"),
    responses(
        (status = 201, description = "Successfully stored the recording", body = domain::recordings::Model),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Meeting not found"),
        (status = 413, description = "Recording too large"),
        (status = 422, description = "Empty recording or capture window ends before it starts"),
        (status = 502, description = "Object storage failed"),
        (status = 503, description = "Service temporarily unavailable")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn create(
    CompareApiVersion(_v): CompareApiVersion,
    State(app_state): State<AppState>,
    Path(code): Path<String>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> Result<impl IntoResponse, Error> {
    debug!(
        "POST Upload {} byte recording for {code} ({} to {})",
        body.len(),
        params.started_at,
        params.ended_at
    );
    if body.is_empty() {
        return Err(Error::from(EntityErrorKind::Invalid));
    }

    let recording = RecordingApi::save(
        remote(&app_state).as_ref(),
        &code,
        body.to_vec(),
        params.started_at,
        params.ended_at,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(StatusCode::CREATED.into(), recording)),
    ))
}
