//! Downloads of a meeting's artifacts, served as attachments.

use crate::controller::remote;
use crate::extractors::compare_api_version::CompareApiVersion;
use crate::{AppState, Error};
use axum::extract::{Path, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::IntoResponse;
use domain::error::EntityErrorKind;
use domain::export::{self as ExportApi, MeetingExport};
use log::*;
use service::config::ApiVersion;

fn attachment(
    content_type: &'static str,
    filename: String,
    body: String,
) -> impl IntoResponse {
    (
        [
            (CONTENT_TYPE, content_type.to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
}

/// GET the transcript as plain text
#[utoipa::path(
    get,
    path = "/meetings/{code}/exports/transcript",
    params(
        ApiVersion,
        ("code" = String, Path, description = "Join code of the meeting")
    ),
    responses(
        (status = 200, description = "meeting-transcript-<code>.txt", content_type = "text/plain", body = String),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Meeting not found"),
        (status = 503, description = "Service temporarily unavailable")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn transcript(
    CompareApiVersion(_v): CompareApiVersion,
    State(app_state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET Transcript export of {code}");

    let export = MeetingExport::gather(remote(&app_state).as_ref(), &code).await?;

    Ok(attachment(
        "text/plain; charset=utf-8",
        ExportApi::transcript_filename(&export.meeting.code),
        ExportApi::transcript_text(&export.transcript),
    ))
}

/// GET the action items as CSV
#[utoipa::path(
    get,
    path = "/meetings/{code}/exports/action_items",
    params(
        ApiVersion,
        ("code" = String, Path, description = "Join code of the meeting")
    ),
    responses(
        (status = 200, description = "action-items-<code>.csv", content_type = "text/csv", body = String),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Meeting not found"),
        (status = 503, description = "Service temporarily unavailable")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn action_items(
    CompareApiVersion(_v): CompareApiVersion,
    State(app_state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET Action item export of {code}");

    let export = MeetingExport::gather(remote(&app_state).as_ref(), &code).await?;
    let rows = ExportApi::action_item_rows(&export.action_items, &export.participants);

    Ok(attachment(
        "text/csv; charset=utf-8",
        ExportApi::action_items_filename(&export.meeting.code),
        ExportApi::action_items_csv(&rows)?,
    ))
}

/// GET the current mind map as SVG
#[utoipa::path(
    get,
    path = "/meetings/{code}/exports/mind_map",
    params(
        ApiVersion,
        ("code" = String, Path, description = "Join code of the meeting")
    ),
    responses(
        (status = 200, description = "mind-map-<code>.svg", content_type = "image/svg+xml", body = String),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Meeting not found or it has no mind map"),
        (status = 503, description = "Service temporarily unavailable")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn mind_map(
    CompareApiVersion(_v): CompareApiVersion,
    State(app_state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET Mind map export of {code}");

    let export = MeetingExport::gather(remote(&app_state).as_ref(), &code).await?;
    let mind_map = export
        .current_mind_map()
        .ok_or_else(|| Error::from(EntityErrorKind::NotFound))?;

    Ok(attachment(
        "image/svg+xml",
        ExportApi::mind_map_filename(&export.meeting.code),
        ExportApi::mind_map_svg(&mind_map.content),
    ))
}

/// GET everything recorded about the meeting as one JSON document
#[utoipa::path(
    get,
    path = "/meetings/{code}/exports/meeting",
    params(
        ApiVersion,
        ("code" = String, Path, description = "Join code of the meeting")
    ),
    responses(
        (status = 200, description = "meeting-<code>.json", content_type = "application/json", body = String),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Meeting not found"),
        (status = 503, description = "Service temporarily unavailable")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn meeting(
    CompareApiVersion(_v): CompareApiVersion,
    State(app_state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET Full export of {code}");

    let export = MeetingExport::gather(remote(&app_state).as_ref(), &code).await?;

    Ok(attachment(
        "application/json",
        ExportApi::meeting_filename(&export.meeting.code),
        export.to_json()?,
    ))
}
