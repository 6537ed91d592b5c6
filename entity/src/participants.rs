//! SeaORM Entity for the participants table.
//! Rows are closed by stamping `left_at`, never deleted while a meeting is live.

use crate::presence_status::PresenceStatus;
use crate::Id;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = entity::participants::Model)]
#[sea_orm(schema_name = "meeting_hub", table_name = "participants")]
pub struct Model {
    #[sea_orm(primary_key)]
    #[schema(value_type = Uuid)]
    pub id: Id,

    #[schema(value_type = Uuid)]
    pub meeting_id: Id,

    #[schema(value_type = Uuid)]
    pub user_id: Id,

    pub name: String,

    pub is_muted: bool,

    pub is_video_on: bool,

    pub is_speaking: bool,

    pub status: PresenceStatus,

    #[schema(value_type = String, format = DateTime)]
    pub joined_at: DateTimeWithTimeZone,

    #[schema(value_type = Option<String>, format = DateTime)]
    pub left_at: Option<DateTimeWithTimeZone>,
}

impl Model {
    pub fn is_present(&self) -> bool {
        self.left_at.is_none()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::meetings::Entity",
        from = "Column::MeetingId",
        to = "super::meetings::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Meetings,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Users,
}

impl Related<super::meetings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Meetings.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
