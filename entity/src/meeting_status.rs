use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Lifecycle of a meeting. Transitions only move forward:
/// `waiting -> active` when the host joins and `active -> ended` when the host leaves.
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
#[serde(rename_all = "lowercase")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "meeting_status")]
pub enum MeetingStatus {
    #[sea_orm(string_value = "waiting")]
    #[default]
    Waiting,
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "ended")]
    Ended,
}

impl MeetingStatus {
    /// Returns true when moving from `self` to `next` is a legal lifecycle step.
    /// Staying in the same state is allowed for every state but `ended`, which is final.
    pub fn can_transition_to(self, next: MeetingStatus) -> bool {
        matches!(
            (self, next),
            (MeetingStatus::Waiting, _) | (MeetingStatus::Active, MeetingStatus::Active)
                | (MeetingStatus::Active, MeetingStatus::Ended)
        )
    }
}

impl std::fmt::Display for MeetingStatus {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MeetingStatus::Waiting => write!(fmt, "waiting"),
            MeetingStatus::Active => write!(fmt, "active"),
            MeetingStatus::Ended => write!(fmt, "ended"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ended_is_final() {
        assert!(!MeetingStatus::Ended.can_transition_to(MeetingStatus::Active));
        assert!(!MeetingStatus::Ended.can_transition_to(MeetingStatus::Waiting));
        assert!(!MeetingStatus::Ended.can_transition_to(MeetingStatus::Ended));
    }

    #[test]
    fn lifecycle_moves_forward() {
        assert!(MeetingStatus::Waiting.can_transition_to(MeetingStatus::Active));
        assert!(MeetingStatus::Active.can_transition_to(MeetingStatus::Ended));
        assert!(!MeetingStatus::Active.can_transition_to(MeetingStatus::Waiting));
    }
}
