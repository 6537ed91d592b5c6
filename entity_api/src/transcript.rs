use super::error::Error;
use entity::transcripts::{ActiveModel, Column, Entity, Model};
use entity::Id;
use log::*;
use sea_orm::{entity::prelude::*, ActiveValue::Set, ConnectionTrait, QueryOrder, TryIntoModel};

pub async fn create(db: &impl ConnectionTrait, transcript_model: Model) -> Result<Model, Error> {
    debug!("New Transcript Model to be inserted: {transcript_model:?}");

    let transcript_active_model: ActiveModel = ActiveModel {
        id: Set(Id::new_v4()),
        meeting_id: Set(transcript_model.meeting_id),
        speaker_name: Set(transcript_model.speaker_name),
        content: Set(transcript_model.content),
        timestamp: Set(transcript_model.timestamp),
        created_at: Set(chrono::Utc::now().into()),
    };

    Ok(transcript_active_model.insert(db).await?.try_into_model()?)
}

/// All entries of a meeting, oldest first.
pub async fn find_by_meeting(db: &impl ConnectionTrait, meeting_id: Id) -> Result<Vec<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::MeetingId.eq(meeting_id))
        .order_by_asc(Column::Timestamp)
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

    #[tokio::test]
    async fn create_returns_a_new_transcript_model() -> Result<(), Error> {
        let now = chrono::Utc::now();
        let transcript = Model {
            id: Id::new_v4(),
            meeting_id: Id::new_v4(),
            speaker_name: "Alice".to_owned(),
            content: "Let's review the metrics".to_owned(),
            timestamp: now.into(),
            created_at: now.into(),
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[transcript.clone()]])
            .into_connection();

        let created = create(&db, transcript.clone()).await?;

        assert_eq!(created.content, transcript.content);

        Ok(())
    }

    #[tokio::test]
    async fn find_by_meeting_orders_by_timestamp_ascending() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<Model>::new()])
            .into_connection();

        find_by_meeting(&db, Id::new_v4()).await?;

        let log = db.into_transaction_log();
        assert!(log[0].statements()[0]
            .sql
            .ends_with(r#"ORDER BY "transcripts"."timestamp" ASC"#));

        Ok(())
    }
}
