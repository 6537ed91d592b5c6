use super::error::{EntityApiErrorKind, Error};
use super::mutate::{self, UpdateMap};
use entity::participants::{ActiveModel, Column, Entity, Model};
use entity::Id;
use log::*;
use sea_orm::{
    entity::prelude::*, ActiveValue::Set, ConnectionTrait, DatabaseConnection, QueryOrder,
    TryIntoModel,
};

pub async fn create(db: &impl ConnectionTrait, participant_model: Model) -> Result<Model, Error> {
    debug!("New Participant Model to be inserted: {participant_model:?}");

    let participant_active_model: ActiveModel = ActiveModel {
        id: Set(Id::new_v4()),
        meeting_id: Set(participant_model.meeting_id),
        user_id: Set(participant_model.user_id),
        name: Set(participant_model.name),
        is_muted: Set(participant_model.is_muted),
        is_video_on: Set(participant_model.is_video_on),
        is_speaking: Set(false),
        status: Set(participant_model.status),
        joined_at: Set(chrono::Utc::now().into()),
        left_at: Set(None),
    };

    Ok(participant_active_model.insert(db).await?.try_into_model()?)
}

pub async fn find_by_id(db: &impl ConnectionTrait, id: Id) -> Result<Model, Error> {
    Entity::find_by_id(id).one(db).await?.ok_or_else(|| Error {
        source: None,
        error_kind: EntityApiErrorKind::RecordNotFound,
    })
}

/// Participants of a meeting in join order. Departed rows are skipped unless
/// `include_departed` is set.
pub async fn find_by_meeting(
    db: &impl ConnectionTrait,
    meeting_id: Id,
    include_departed: bool,
) -> Result<Vec<Model>, Error> {
    let mut query = Entity::find().filter(Column::MeetingId.eq(meeting_id));
    if !include_departed {
        query = query.filter(Column::LeftAt.is_null());
    }

    Ok(query.order_by_asc(Column::JoinedAt).all(db).await?)
}

/// The user's current (not yet departed) row in a meeting, if any.
pub async fn find_present(
    db: &impl ConnectionTrait,
    meeting_id: Id,
    user_id: Id,
) -> Result<Option<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::MeetingId.eq(meeting_id))
        .filter(Column::UserId.eq(user_id))
        .filter(Column::LeftAt.is_null())
        .order_by_desc(Column::JoinedAt)
        .one(db)
        .await?)
}

/// Partial update of the presence flags. Only columns present in `update_map`
/// are written.
pub async fn update(db: &DatabaseConnection, id: Id, update_map: UpdateMap) -> Result<Model, Error> {
    let participant = find_by_id(db, id).await?;
    debug!("Existing Participant model to be Updated: {participant:?}");

    let active_model: ActiveModel = participant.into();
    mutate::update::<ActiveModel, Column>(db, active_model, update_map).await
}

/// Closes the row by stamping `left_at`. Rows are never deleted.
pub async fn mark_left(db: &impl ConnectionTrait, id: Id) -> Result<Model, Error> {
    let participant = find_by_id(db, id).await?;

    let mut active_model: ActiveModel = participant.into();
    active_model.left_at = Set(Some(chrono::Utc::now().into()));
    active_model.is_speaking = Set(false);

    Ok(active_model.update(db).await?.try_into_model()?)
}
