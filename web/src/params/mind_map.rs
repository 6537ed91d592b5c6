use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
#[schema(as = params::mind_map::CreateParams)]
pub(crate) struct CreateParams {
    pub(crate) title: String,
    /// Text of the central node.
    pub(crate) central_topic: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[schema(as = params::mind_map::NodeParams)]
pub(crate) struct NodeParams {
    pub(crate) text: String,
    /// Existing node to branch from. Without one the node is a free-standing leaf.
    pub(crate) parent_id: Option<String>,
}
