use super::error::{EntityApiErrorKind, Error};
use entity::meeting_status::MeetingStatus;
use entity::meetings::{ActiveModel, Column, Entity, Model};
use entity::{participants, Id};
use log::*;
use sea_orm::{
    entity::prelude::*, ActiveValue::Set, Condition, ConnectionTrait, QueryOrder, QuerySelect,
    TryIntoModel,
};

pub async fn create(db: &impl ConnectionTrait, meeting_model: Model) -> Result<Model, Error> {
    debug!("New Meeting Model to be inserted: {meeting_model:?}");

    let now = chrono::Utc::now();
    let meeting_active_model: ActiveModel = ActiveModel {
        id: Set(Id::new_v4()),
        code: Set(meeting_model.code),
        title: Set(meeting_model.title),
        status: Set(meeting_model.status),
        host_id: Set(meeting_model.host_id),
        scheduled_for: Set(meeting_model.scheduled_for),
        started_at: Set(None),
        ended_at: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };

    Ok(meeting_active_model.insert(db).await?.try_into_model()?)
}

pub async fn find_by_id(db: &impl ConnectionTrait, id: Id) -> Result<Model, Error> {
    Entity::find_by_id(id).one(db).await?.ok_or_else(|| Error {
        source: None,
        error_kind: EntityApiErrorKind::RecordNotFound,
    })
}

/// Resolves a public join code to its meeting row.
pub async fn find_by_code(db: &impl ConnectionTrait, code: &str) -> Result<Option<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::Code.eq(code))
        .one(db)
        .await?)
}

/// Writes a new lifecycle status, stamping `started_at` the first time a meeting
/// becomes active and `ended_at` when it ends.
pub async fn update_status(
    db: &impl ConnectionTrait,
    id: Id,
    status: MeetingStatus,
) -> Result<Model, Error> {
    let meeting = find_by_id(db, id).await?;
    debug!("Existing Meeting model to be Updated: {meeting:?}");

    let now = chrono::Utc::now();
    let started_at = meeting.started_at;
    let mut active_model: ActiveModel = meeting.into();
    active_model.status = Set(status);
    active_model.updated_at = Set(now.into());
    match status {
        MeetingStatus::Active if started_at.is_none() => {
            active_model.started_at = Set(Some(now.into()))
        }
        MeetingStatus::Ended => active_model.ended_at = Set(Some(now.into())),
        _ => {}
    }

    Ok(active_model.update(db).await?.try_into_model()?)
}

/// Meetings the user hosts or has ever joined, newest first.
pub async fn find_by_member(db: &impl ConnectionTrait, user_id: Id) -> Result<Vec<Model>, Error> {
    let joined_meeting_ids: Vec<Id> = participants::Entity::find()
        .select_only()
        .column(participants::Column::MeetingId)
        .filter(participants::Column::UserId.eq(user_id))
        .distinct()
        .into_tuple()
        .all(db)
        .await?;

    let meetings = Entity::find()
        .filter(
            Condition::any()
                .add(Column::HostId.eq(user_id))
                .add(Column::Id.is_in(joined_meeting_ids)),
        )
        .order_by_desc(Column::CreatedAt)
        .all(db)
        .await?;

    debug!("Found {} meetings for user {user_id}", meetings.len());

    Ok(meetings)
}
