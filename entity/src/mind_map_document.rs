//! The nested document stored in `mind_maps.content`.

use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Id of the root topic node every mind map is created with.
pub const CENTRAL_NODE_ID: &str = "central";

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Central,
    Branch,
    Leaf,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MindMapNode {
    pub id: String,
    pub text: String,
    pub x: f64,
    pub y: f64,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(rename = "parentId", default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Connection {
    pub from: String,
    pub to: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, FromJsonQueryResult, ToSchema)]
pub struct MindMapDocument {
    #[serde(default)]
    pub nodes: Vec<MindMapNode>,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

impl MindMapDocument {
    /// A document holding only the central topic node.
    pub fn with_central_topic(topic: &str) -> Self {
        Self {
            nodes: vec![MindMapNode {
                id: CENTRAL_NODE_ID.to_string(),
                text: topic.to_string(),
                x: 400.0,
                y: 300.0,
                node_type: NodeType::Central,
                parent_id: None,
                color: Some("#8b5cf6".to_string()),
            }],
            connections: Vec::new(),
        }
    }

    pub fn node(&self, id: &str) -> Option<&MindMapNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    pub fn central_node(&self) -> Option<&MindMapNode> {
        self.nodes
            .iter()
            .find(|node| node.node_type == NodeType::Central)
    }

    /// Appends `node`, plus a connection from its parent when it has one.
    pub fn push_node(&mut self, node: MindMapNode) {
        if let Some(parent_id) = &node.parent_id {
            self.connections.push(Connection {
                from: parent_id.clone(),
                to: node.id.clone(),
            });
        }
        self.nodes.push(node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_original_field_names() {
        let mut document = MindMapDocument::with_central_topic("Q4");
        document.push_node(MindMapNode {
            id: "node_1".to_string(),
            text: "Budget".to_string(),
            x: 120.0,
            y: 240.0,
            node_type: NodeType::Branch,
            parent_id: Some(CENTRAL_NODE_ID.to_string()),
            color: None,
        });

        let json = serde_json::to_value(&document).unwrap();

        assert_eq!(json["nodes"][0]["type"], "central");
        assert_eq!(json["nodes"][1]["parentId"], "central");
        assert_eq!(json["connections"][0]["from"], "central");
        assert_eq!(json["connections"][0]["to"], "node_1");
    }

    #[test]
    fn leaf_without_parent_adds_no_connection() {
        let mut document = MindMapDocument::with_central_topic("Q4");
        document.push_node(MindMapNode {
            id: "node_2".to_string(),
            text: "Loose idea".to_string(),
            x: 0.0,
            y: 0.0,
            node_type: NodeType::Leaf,
            parent_id: None,
            color: None,
        });

        assert_eq!(document.nodes.len(), 2);
        assert!(document.connections.is_empty());
    }
}
