use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Presence shown next to a participant's name.
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
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "presence_status")]
pub enum PresenceStatus {
    #[sea_orm(string_value = "online")]
    #[default]
    Online,
    #[sea_orm(string_value = "away")]
    Away,
    #[sea_orm(string_value = "busy")]
    Busy,
}

impl std::fmt::Display for PresenceStatus {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PresenceStatus::Online => write!(fmt, "online"),
            PresenceStatus::Away => write!(fmt, "away"),
            PresenceStatus::Busy => write!(fmt, "busy"),
        }
    }
}
