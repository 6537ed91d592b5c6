//! SeaORM Entity for the recordings table.
//! One row per finished capture session; the media itself lives in object storage.

use crate::Id;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = entity::recordings::Model)]
#[sea_orm(schema_name = "meeting_hub", table_name = "recordings")]
pub struct Model {
    #[sea_orm(primary_key)]
    #[schema(value_type = Uuid)]
    pub id: Id,

    #[schema(value_type = Uuid)]
    pub meeting_id: Id,

    /// Object storage path, `<meeting_code>/<unix_ms>.webm`
    pub file_path: String,

    /// Size of the stored blob in bytes
    pub file_size: i64,

    /// Duration of the recording in whole seconds
    pub duration_seconds: i32,

    #[schema(value_type = String, format = DateTime)]
    pub started_at: DateTimeWithTimeZone,

    #[schema(value_type = String, format = DateTime)]
    pub ended_at: DateTimeWithTimeZone,

    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeWithTimeZone,
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
}

impl Related<super::meetings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Meetings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
