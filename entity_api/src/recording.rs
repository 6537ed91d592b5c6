use super::error::{EntityApiErrorKind, Error};
use entity::recordings::{ActiveModel, Column, Entity, Model};
use entity::Id;
use log::*;
use sea_orm::{entity::prelude::*, ActiveValue::Set, ConnectionTrait, QueryOrder, TryIntoModel};

pub async fn create(db: &impl ConnectionTrait, recording_model: Model) -> Result<Model, Error> {
    debug!("New Recording Model to be inserted: {recording_model:?}");

    if recording_model.duration_seconds < 0 {
        warn!(
            "Refusing to store recording {} with negative duration",
            recording_model.file_path
        );
        return Err(Error {
            source: None,
            error_kind: EntityApiErrorKind::ValidationError,
        });
    }

    let recording_active_model: ActiveModel = ActiveModel {
        id: Set(Id::new_v4()),
        meeting_id: Set(recording_model.meeting_id),
        file_path: Set(recording_model.file_path),
        file_size: Set(recording_model.file_size),
        duration_seconds: Set(recording_model.duration_seconds),
        started_at: Set(recording_model.started_at),
        ended_at: Set(recording_model.ended_at),
        created_at: Set(chrono::Utc::now().into()),
    };

    Ok(recording_active_model.insert(db).await?.try_into_model()?)
}

pub async fn find_by_meeting(db: &impl ConnectionTrait, meeting_id: Id) -> Result<Vec<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::MeetingId.eq(meeting_id))
        .order_by_desc(Column::StartedAt)
        .all(db)
        .await?)
}

#[cfg(test)]
// We need to gate seaORM's mock feature behind conditional compilation because
// the feature removes the Clone trait implementation from seaORM's DatabaseConnection.
// see https://github.com/SeaQL/sea-orm/issues/830
#[cfg(feature = "mock")]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn recording_model(duration_seconds: i32) -> Model {
        let now = chrono::Utc::now();
        Model {
            id: Id::new_v4(),
            meeting_id: Id::new_v4(),
            file_path: "abc/1700000000000.webm".to_owned(),
            file_size: 2048,
            duration_seconds,
            started_at: now.into(),
            ended_at: now.into(),
            created_at: now.into(),
        }
    }

    #[tokio::test]
    async fn create_returns_a_new_recording_model() -> Result<(), Error> {
        let recording = recording_model(42);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[recording.clone()]])
            .into_connection();

        let created = create(&db, recording.clone()).await?;

        assert_eq!(created.duration_seconds, 42);

        Ok(())
    }

    #[tokio::test]
    async fn create_rejects_negative_durations_without_touching_the_database() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let result = create(&db, recording_model(-1)).await;

        assert_eq!(
            result.unwrap_err().error_kind,
            EntityApiErrorKind::ValidationError
        );
        assert!(db.into_transaction_log().is_empty());
    }
}
