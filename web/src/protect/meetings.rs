use crate::params::meeting::MeetingPath;
use crate::protect::{authorize, Predicate, UserJoinedMeeting};
use crate::{extractors::authenticated_user::AuthenticatedUser, AppState};
use axum::{
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::Next,
    response::IntoResponse,
};
use domain::code::is_valid_meeting_code;
use domain::error::EntityErrorKind;
use domain::meeting as MeetingApi;
use domain::remote::DbRemote;
use log::*;

/// Checks that the meeting behind `:code`
///     * exists
///     * has been joined by the authenticated user at some point.
///  Intended to be given to axum::middleware::from_fn_with_state in the router
pub(crate) async fn participant(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(path): Path<MeetingPath>,
    request: Request,
    next: Next,
) -> impl IntoResponse {
    if !is_valid_meeting_code(&path.code) {
        debug!("Rejecting malformed meeting code {:?}", path.code);
        return (StatusCode::NOT_FOUND, "NOT FOUND").into_response();
    }

    let meeting =
        match MeetingApi::find_by_code(&DbRemote::from_app_state(&app_state), &path.code).await {
            Ok(meeting) => meeting,
            Err(e) if e.entity_kind() == Some(&EntityErrorKind::NotFound) => {
                return (StatusCode::NOT_FOUND, "NOT FOUND").into_response();
            }
            Err(e) => {
                error!("Authorization error finding meeting {}: {e:?}", path.code);
                return (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL SERVER ERROR")
                    .into_response();
            }
        };

    let checks = vec![Predicate::new(UserJoinedMeeting, vec![meeting.id])];
    authorize(&app_state, user, request, next, checks)
        .await
        .into_response()
}
