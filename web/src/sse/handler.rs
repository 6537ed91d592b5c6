use crate::extractors::authenticated_user::AuthenticatedUser;
use crate::{AppState, Error};
use async_stream::stream;
use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use domain::meeting as MeetingApi;
use domain::remote::DbRemote;
use futures::Stream;
use log::*;
use ::sse::connection::ConnectionId;
use ::sse::Manager;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Unregisters the connection however the stream ends, including when the
/// client goes away and axum drops the stream mid-await.
struct ConnectionGuard {
    manager: Arc<Manager>,
    connection_id: ConnectionId,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.manager.unregister_connection(&self.connection_id);
    }
}

/// Streams every row change of one meeting to the caller as it is committed.
///
/// Events are named `<table>:<kind>`, e.g. `action_items:update`, and carry
/// the changed row.
pub(crate) async fn sse_handler(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, Error> {
    let meeting =
        MeetingApi::find_by_code(&DbRemote::from_app_state(&app_state), &code).await?;
    debug!(
        "Establishing SSE connection for user {} in meeting {}",
        user.id, meeting.code
    );

    let (tx, mut rx) = mpsc::unbounded_channel();
    let connection_id = app_state.sse_manager.register_connection(
        user.id.to_string(),
        meeting.id.to_string(),
        tx,
    );
    let guard = ConnectionGuard {
        manager: app_state.sse_manager.clone(),
        connection_id,
    };

    let stream = stream! {
        let _guard = guard;
        while let Some(event) = rx.recv().await {
            yield event;
        }
        debug!("SSE connection closed for user {}", user.id);
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
