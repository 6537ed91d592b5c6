use crate::extractors::RejectionType;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use axum_login::AuthSession;
use domain::{users, Session};
use log::*;

/// The logged-in account, along with the session its stores act for.
pub(crate) struct AuthenticatedUser(pub users::Model);

impl AuthenticatedUser {
    pub(crate) fn session(&self) -> Session {
        Session::from(&self.0)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = RejectionType;

    // Wraps axum_login's AuthSession extractor; requests without a logged-in
    // user are rejected with 401.
    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session: domain::user::AuthSession = AuthSession::from_request_parts(parts, state)
            .await
            .map_err(|(status, msg)| (status, msg.to_string()))?;

        match session.user {
            Some(user) => {
                trace!("Authenticated request for user {}", user.id);
                Ok(AuthenticatedUser(user))
            }
            None => Err((StatusCode::UNAUTHORIZED, "Unauthorized".to_string())),
        }
    }
}
