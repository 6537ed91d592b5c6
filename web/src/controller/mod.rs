use crate::AppState;
use domain::remote::{DbRemote, Remote};
use serde::Serialize;
use std::sync::Arc;

pub(crate) mod action_item_controller;
pub(crate) mod dashboard_controller;
pub(crate) mod export_controller;
pub(crate) mod health_check_controller;
pub(crate) mod meeting_controller;
pub(crate) mod mind_map_controller;
pub(crate) mod participant_controller;
pub(crate) mod recording_controller;
pub(crate) mod transcript_controller;
pub(crate) mod user_controller;
pub(crate) mod user_session_controller;

#[derive(Debug, Serialize)]
struct ApiResponse<T: Serialize> {
    status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(status_code: u16, data: T) -> Self {
        Self {
            status_code,
            data: Some(data),
        }
    }

    pub fn no_content(status_code: u16) -> ApiResponse<()> {
        ApiResponse {
            status_code,
            data: None,
        }
    }
}

/// The data client every request handler works through.
fn remote(app_state: &AppState) -> Arc<dyn Remote> {
    Arc::new(DbRemote::from_app_state(app_state))
}
