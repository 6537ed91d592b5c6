//! SeaORM Entity for the meetings table.

use crate::meeting_status::MeetingStatus;
use crate::Id;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = entity::meetings::Model)]
#[sea_orm(schema_name = "meeting_hub", table_name = "meetings")]
pub struct Model {
    #[sea_orm(primary_key)]
    #[schema(value_type = Uuid)]
    pub id: Id,

    /// Public, shareable join code. Distinct from the internal `id`.
    #[sea_orm(unique)]
    pub code: String,

    pub title: String,

    pub status: MeetingStatus,

    #[schema(value_type = Uuid)]
    pub host_id: Id,

    /// Set when the meeting was created from the schedule page
    #[schema(value_type = Option<String>, format = DateTime)]
    pub scheduled_for: Option<DateTimeWithTimeZone>,

    #[schema(value_type = Option<String>, format = DateTime)]
    pub started_at: Option<DateTimeWithTimeZone>,

    #[schema(value_type = Option<String>, format = DateTime)]
    pub ended_at: Option<DateTimeWithTimeZone>,

    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeWithTimeZone,

    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    pub fn is_hosted_by(&self, user_id: Id) -> bool {
        self.host_id == user_id
    }

    /// Whole seconds between start and end, when both are known.
    pub fn duration_seconds(&self) -> Option<i64> {
        match (self.started_at, self.ended_at) {
            (Some(started_at), Some(ended_at)) => {
                Some((ended_at - started_at).num_seconds().max(0))
            }
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::HostId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Users,
    #[sea_orm(has_many = "super::participants::Entity")]
    Participants,
    #[sea_orm(has_many = "super::transcripts::Entity")]
    Transcripts,
    #[sea_orm(has_many = "super::action_items::Entity")]
    ActionItems,
    #[sea_orm(has_many = "super::mind_maps::Entity")]
    MindMaps,
    #[sea_orm(has_many = "super::recordings::Entity")]
    Recordings,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::participants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Participants.def()
    }
}

impl Related<super::transcripts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transcripts.def()
    }
}

impl Related<super::action_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ActionItems.def()
    }
}

impl Related<super::mind_maps::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MindMaps.def()
    }
}

impl Related<super::recordings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Recordings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
