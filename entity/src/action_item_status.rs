use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug,
    Clone,
    Copy,
    Eq,
    PartialEq,
    EnumIter,
    Deserialize,
    Default,
    Serialize,
    DeriveActiveEnum,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "action_item_status")]
pub enum ActionItemStatus {
    #[serde(rename = "pending")]
    #[sea_orm(string_value = "pending")]
    #[default]
    Pending,
    // Older clients send the hyphenated spelling.
    #[serde(rename = "in_progress", alias = "in-progress")]
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[serde(rename = "completed")]
    #[sea_orm(string_value = "completed")]
    Completed,
}

impl ActionItemStatus {
    /// The status a checkbox toggle moves to.
    pub fn toggled(self) -> ActionItemStatus {
        match self {
            ActionItemStatus::Completed => ActionItemStatus::Pending,
            ActionItemStatus::Pending | ActionItemStatus::InProgress => {
                ActionItemStatus::Completed
            }
        }
    }
}

impl std::fmt::Display for ActionItemStatus {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionItemStatus::Pending => write!(fmt, "pending"),
            ActionItemStatus::InProgress => write!(fmt, "in_progress"),
            ActionItemStatus::Completed => write!(fmt, "completed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_hyphenated_in_progress() {
        let status: ActionItemStatus = serde_json::from_str("\"in-progress\"").unwrap();
        assert_eq!(status, ActionItemStatus::InProgress);
    }

    #[test]
    fn toggle_flips_between_pending_and_completed() {
        assert_eq!(
            ActionItemStatus::Pending.toggled(),
            ActionItemStatus::Completed
        );
        assert_eq!(
            ActionItemStatus::Completed.toggled(),
            ActionItemStatus::Pending
        );
        assert_eq!(
            ActionItemStatus::InProgress.toggled(),
            ActionItemStatus::Completed
        );
    }
}
