use super::error::{EntityApiErrorKind, Error};
use super::mutate::{self, UpdateMap};
use entity::action_items::{ActiveModel, Column, Entity, Model};
use entity::Id;
use log::*;
use sea_orm::{
    entity::prelude::*, ActiveValue::Set, ConnectionTrait, DatabaseConnection, QueryOrder,
    TryIntoModel,
};

pub async fn create(db: &impl ConnectionTrait, action_item_model: Model) -> Result<Model, Error> {
    debug!("New Action Item Model to be inserted: {action_item_model:?}");

    let now = chrono::Utc::now();
    let action_item_active_model: ActiveModel = ActiveModel {
        id: Set(Id::new_v4()),
        meeting_id: Set(action_item_model.meeting_id),
        title: Set(action_item_model.title),
        description: Set(action_item_model.description),
        status: Set(action_item_model.status),
        priority: Set(action_item_model.priority),
        context: Set(action_item_model.context),
        assigned_to: Set(action_item_model.assigned_to),
        created_by: Set(action_item_model.created_by),
        due_date: Set(action_item_model.due_date),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };

    Ok(action_item_active_model.insert(db).await?.try_into_model()?)
}

pub async fn find_by_id(db: &impl ConnectionTrait, id: Id) -> Result<Model, Error> {
    Entity::find_by_id(id).one(db).await?.ok_or_else(|| Error {
        source: None,
        error_kind: EntityApiErrorKind::RecordNotFound,
    })
}

/// All items of a meeting, newest first.
pub async fn find_by_meeting(db: &impl ConnectionTrait, meeting_id: Id) -> Result<Vec<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::MeetingId.eq(meeting_id))
        .order_by_desc(Column::CreatedAt)
        .all(db)
        .await?)
}

pub async fn update(db: &DatabaseConnection, id: Id, mut update_map: UpdateMap) -> Result<Model, Error> {
    let action_item = find_by_id(db, id).await?;
    debug!("Existing Action Item model to be Updated: {action_item:?}");

    // Ownership columns are fixed at creation.
    update_map.remove("id");
    update_map.remove("meeting_id");
    update_map.remove("created_by");
    update_map.remove("created_at");
    update_map.insert(
        Column::UpdatedAt.to_string(),
        Some(Value::ChronoDateTimeWithTimeZone(Some(Box::new(
            chrono::Utc::now().into(),
        )))),
    );

    let active_model: ActiveModel = action_item.into();
    mutate::update::<ActiveModel, Column>(db, active_model, update_map).await
}
