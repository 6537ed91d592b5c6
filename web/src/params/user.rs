use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
pub(crate) struct ConfirmParams {
    /// Token from the confirmation link.
    pub(crate) token: String,
}
