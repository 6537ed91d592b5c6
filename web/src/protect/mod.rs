//! Authorization for meeting resources.
//!
//! A meeting's join code is its public entry point: anyone signed in who has
//! the code can look the meeting up and join it. Everything else below
//! `/meetings/:code` (transcript, action items, mind maps, recordings,
//! exports and the event stream) is limited to people who have joined the
//! meeting at some point.

pub(crate) mod meetings;

use crate::AppState;
use async_trait::async_trait;
use axum::{extract::Request, http::StatusCode, middleware::Next, response::IntoResponse};
use domain::remote::{DbRemote, Remote};
use domain::Id;
use log::*;

/// A single authorization rule: may the authenticated user proceed?
#[async_trait]
pub trait Check: Send + Sync {
    async fn eval(&self, app: &AppState, user: &domain::users::Model, args: Vec<Id>) -> bool;
}

/// Pairs a [`Check`] with the arguments it is evaluated with.
pub(crate) struct Predicate {
    predicate: Box<dyn Check>,
    args: Vec<Id>,
}

impl Predicate {
    pub(crate) fn new<C: Check + 'static>(predicate: C, args: Vec<Id>) -> Self {
        Self {
            predicate: Box::new(predicate),
            args,
        }
    }

    pub(crate) async fn check(&self, app_state: &AppState, user: &domain::users::Model) -> bool {
        self.predicate
            .eval(app_state, user, self.args.clone())
            .await
    }
}

/// Runs `checks` in order and answers **403 FORBIDDEN** at the first one
/// that fails. When all pass the wrapped handler runs.
pub(crate) async fn authorize(
    app_state: &AppState,
    authenticated_user: domain::users::Model,
    request: Request,
    next: Next,
    checks: Vec<Predicate>,
) -> impl IntoResponse {
    for check in checks {
        if !check.check(app_state, &authenticated_user).await {
            return (StatusCode::FORBIDDEN, "FORBIDDEN").into_response();
        }
    }
    next.run(request).await
}

/// The user has a participant row in the meeting, present or departed.
pub struct UserJoinedMeeting;

#[async_trait]
impl Check for UserJoinedMeeting {
    async fn eval(
        &self,
        app_state: &AppState,
        authenticated_user: &domain::users::Model,
        args: Vec<Id>,
    ) -> bool {
        let Some(meeting_id) = args.first().copied() else {
            return false;
        };
        match DbRemote::from_app_state(app_state)
            .list_participants(meeting_id, true)
            .await
        {
            Ok(participants) => participants
                .iter()
                .any(|participant| participant.user_id == authenticated_user.id),
            Err(e) => {
                error!("Error listing participants of meeting {meeting_id}: {e:?}");
                false
            }
        }
    }
}
