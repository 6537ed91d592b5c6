use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::IntoParams;

/// Capture window of an uploaded recording; the body is the raw webm blob.
#[derive(Debug, Deserialize, IntoParams)]
pub(crate) struct UploadParams {
    #[param(value_type = String, format = DateTime)]
    pub(crate) started_at: DateTime<Utc>,
    #[param(value_type = String, format = DateTime)]
    pub(crate) ended_at: DateTime<Utc>,
}
