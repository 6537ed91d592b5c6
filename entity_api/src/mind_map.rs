use super::error::{EntityApiErrorKind, Error};
use entity::mind_map_document::MindMapDocument;
use entity::mind_maps::{ActiveModel, Column, Entity, Model};
use entity::Id;
use log::*;
use sea_orm::{
    entity::prelude::*, sea_query::Expr, ActiveValue::Set, ConnectionTrait, QueryOrder,
    TryIntoModel,
};

pub async fn create(db: &impl ConnectionTrait, mind_map_model: Model) -> Result<Model, Error> {
    debug!("New Mind Map Model to be inserted: {mind_map_model:?}");

    let now = chrono::Utc::now();
    let mind_map_active_model: ActiveModel = ActiveModel {
        id: Set(Id::new_v4()),
        meeting_id: Set(mind_map_model.meeting_id),
        title: Set(mind_map_model.title),
        content: Set(mind_map_model.content),
        version: Set(1),
        created_by: Set(mind_map_model.created_by),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };

    Ok(mind_map_active_model.insert(db).await?.try_into_model()?)
}

pub async fn find_by_id(db: &impl ConnectionTrait, id: Id) -> Result<Model, Error> {
    Entity::find_by_id(id).one(db).await?.ok_or_else(|| Error {
        source: None,
        error_kind: EntityApiErrorKind::RecordNotFound,
    })
}

/// All mind maps of a meeting, newest first. The head of the list is the current one.
pub async fn find_by_meeting(db: &impl ConnectionTrait, meeting_id: Id) -> Result<Vec<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::MeetingId.eq(meeting_id))
        .order_by_desc(Column::CreatedAt)
        .all(db)
        .await?)
}

/// Replaces the document only if the stored version still equals
/// `expected_version`, bumping the version by one.
///
/// Returns `Ok(None)` when another writer got there first; the caller is
/// expected to re-read and re-apply its change.
pub async fn update_content(
    db: &impl ConnectionTrait,
    id: Id,
    expected_version: i32,
    content: MindMapDocument,
) -> Result<Option<Model>, Error> {
    let result = Entity::update_many()
        .col_expr(Column::Content, Expr::value(content))
        .col_expr(Column::Version, Expr::value(expected_version + 1))
        .col_expr(
            Column::UpdatedAt,
            Expr::value(Value::ChronoDateTimeWithTimeZone(Some(Box::new(
                chrono::Utc::now().into(),
            )))),
        )
        .filter(Column::Id.eq(id))
        .filter(Column::Version.eq(expected_version))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        warn!("Mind map {id} was changed by another writer (expected version {expected_version})");
        return Ok(None);
    }

    Ok(Some(find_by_id(db, id).await?))
}
