use crate::controller::{remote, ApiResponse};
use crate::extractors::{
    authenticated_user::AuthenticatedUser, compare_api_version::CompareApiVersion,
};
use crate::params::meeting::{CreateParams, JoinParams, ScheduleParams};
use crate::{AppState, Error};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::error::{EntityErrorKind, Error as DomainError};
use domain::meeting::MeetingRoom;
use domain::{meetings, participants};
use log::*;
use serde::Serialize;
use service::config::ApiVersion;
use utoipa::ToSchema;

/// A meeting as seen from the call page.
#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct RoomView {
    pub meeting: meetings::Model,
    /// Participants currently in the meeting.
    pub participants: Vec<participants::Model>,
    pub is_host: bool,
}

impl RoomView {
    fn of(room: &MeetingRoom) -> Result<Self, DomainError> {
        let meeting = room
            .meeting()
            .cloned()
            .ok_or_else(|| DomainError::from(EntityErrorKind::NotFound))?;
        Ok(Self {
            meeting,
            participants: room.participants().to_vec(),
            is_host: room.is_host(),
        })
    }
}

/// POST start a new meeting hosted by the caller
#[utoipa::path(
    post,
    path = "/meetings",
    params(ApiVersion),
    request_body = CreateParams,
    responses(
        (status = 201, description = "Successfully created a meeting", body = RoomView),
        (status = 401, description = "Unauthorized"),
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
    Json(params): Json<CreateParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST Create a new meeting {:?}", params.title);

    let mut room = MeetingRoom::new(remote(&app_state), user.session());
    let code = room.create(&params.title).await?;
    room.load(&code).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(StatusCode::CREATED.into(), RoomView::of(&room)?)),
    ))
}

/// POST plan a meeting for a later date and time (UTC)
#[utoipa::path(
    post,
    path = "/meetings/schedule",
    params(ApiVersion),
    request_body = ScheduleParams,
    responses(
        (status = 201, description = "Successfully scheduled a meeting", body = RoomView),
        (status = 401, description = "Unauthorized"),
        (status = 422, description = "Unprocessable Entity"),
        (status = 503, description = "Service temporarily unavailable")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn schedule(
    CompareApiVersion(_v): CompareApiVersion,
    user: AuthenticatedUser,
    State(app_state): State<AppState>,
    Json(params): Json<ScheduleParams>,
) -> Result<impl IntoResponse, Error> {
    debug!(
        "POST Schedule meeting {:?} for {} {}",
        params.title, params.date, params.time
    );

    let mut room = MeetingRoom::new(remote(&app_state), user.session());
    let code = room
        .schedule(&params.title, params.date, params.time)
        .await?;
    room.load(&code).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(StatusCode::CREATED.into(), RoomView::of(&room)?)),
    ))
}

/// GET the meeting behind a join code and who is in it
#[utoipa::path(
    get,
    path = "/meetings/{code}",
    params(
        ApiVersion,
        ("code" = String, Path, description = "Join code of the meeting")
    ),
    responses(
        (status = 200, description = "Successfully retrieved the meeting", body = RoomView),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Meeting not found"),
        (status = 503, description = "Service temporarily unavailable")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn read(
    CompareApiVersion(_v): CompareApiVersion,
    user: AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET Meeting by code: {code}");

    let mut room = MeetingRoom::new(remote(&app_state), user.session());
    room.load(&code).await?;

    Ok(Json(ApiResponse::new(
        StatusCode::OK.into(),
        RoomView::of(&room)?,
    )))
}

/// POST join the meeting behind a join code
#[utoipa::path(
    post,
    path = "/meetings/{code}/join",
    params(
        ApiVersion,
        ("code" = String, Path, description = "Join code of the meeting")
    ),
    request_body = JoinParams,
    responses(
        (status = 200, description = "Successfully joined the meeting", body = RoomView),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Meeting not found"),
        (status = 422, description = "The meeting has ended"),
        (status = 503, description = "Service temporarily unavailable")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn join(
    CompareApiVersion(_v): CompareApiVersion,
    user: AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(code): Path<String>,
    Json(params): Json<JoinParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST Join meeting {code} as {:?}", params.display_name);

    let mut room = MeetingRoom::new(remote(&app_state), user.session());
    room.join(&code, &params.display_name).await?;

    Ok(Json(ApiResponse::new(
        StatusCode::OK.into(),
        RoomView::of(&room)?,
    )))
}

/// POST leave the meeting. The meeting ends when its host leaves.
#[utoipa::path(
    post,
    path = "/meetings/{code}/leave",
    params(
        ApiVersion,
        ("code" = String, Path, description = "Join code of the meeting")
    ),
    responses(
        (status = 200, description = "Successfully left the meeting"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Meeting not found"),
        (status = 503, description = "Service temporarily unavailable")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn leave(
    CompareApiVersion(_v): CompareApiVersion,
    user: AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST Leave meeting {code}");

    let mut room = MeetingRoom::new(remote(&app_state), user.session());
    room.load(&code).await?;
    room.leave().await?;

    Ok(Json(ApiResponse::<()>::no_content(StatusCode::OK.into())))
}
