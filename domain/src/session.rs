//! The signed-in user on whose behalf the stores act.

use crate::{users, Id};
use serde::Serialize;

/// Established at login and handed to every store explicitly. Stores never
/// look up "the current user" on their own.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Session {
    pub user_id: Id,
    pub email: String,
    /// Name shown to other participants and used as the transcript speaker.
    pub display_name: String,
}

impl Session {
    pub fn new(user_id: Id, email: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            user_id,
            email: email.into(),
            display_name: display_name.into(),
        }
    }
}

impl From<&users::Model> for Session {
    fn from(user: &users::Model) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            display_name: user.default_name(),
        }
    }
}
