use serde::Deserialize;
use utoipa::ToSchema;

/// One finalized utterance of the caller.
#[derive(Debug, Deserialize, ToSchema)]
#[schema(as = params::transcript::CreateParams)]
pub(crate) struct CreateParams {
    pub(crate) content: String,
}
