//! SeaORM Entity for the mind_maps table.
//! `content` is rewritten whole on every change; `version` guards those writes.

use crate::mind_map_document::MindMapDocument;
use crate::Id;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = entity::mind_maps::Model)]
#[sea_orm(schema_name = "meeting_hub", table_name = "mind_maps")]
pub struct Model {
    #[sea_orm(primary_key)]
    #[schema(value_type = Uuid)]
    pub id: Id,

    #[schema(value_type = Uuid)]
    pub meeting_id: Id,

    pub title: String,

    #[sea_orm(column_type = "JsonBinary")]
    pub content: MindMapDocument,

    /// Incremented on every content write
    pub version: i32,

    #[schema(value_type = Uuid)]
    pub created_by: Id,

    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeWithTimeZone,

    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTimeWithTimeZone,
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
