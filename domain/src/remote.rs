//! The data client every store talks through.
//!
//! [`Remote`] exposes exactly the reads and writes the stores need plus a
//! change-feed subscription. [`DbRemote`] runs them against Postgres through
//! `entity_api` and announces every committed write as a [`RowChange`], so a
//! store sees its own writes and everyone else's through the same feed.

use crate::error::{EntityErrorKind, Error};
use crate::session::Session;
use crate::{
    action_items, meetings, mind_maps, participants, recordings, transcripts, Id, IntoUpdateMap,
    UpdateMap,
};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use entity::action_item_priority::Priority;
use entity::action_item_status::ActionItemStatus;
use entity::meeting_status::MeetingStatus;
use entity::mind_map_document::MindMapDocument;
use entity::presence_status::PresenceStatus;
use events::{ChangeFeed, ChangeKind, DomainEvent, EventPublisher, FeedFilter, RowChange, Subscription, Table};
use log::*;
use sea_orm::{DatabaseConnection, Value};
use serde::{Deserialize, Serialize};
use service::storage::ObjectStorage;
use service::AppState;
use std::sync::Arc;
use utoipa::ToSchema;

#[cfg(test)]
pub(crate) mod memory;

#[derive(Clone, Debug, PartialEq)]
pub struct NewMeeting {
    pub code: String,
    pub title: String,
    pub scheduled_for: Option<DateTime<FixedOffset>>,
}

/// Partial update of the caller's own participant row. `None` fields are left alone.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, ToSchema)]
#[schema(as = domain::remote::ParticipantChanges)]
pub struct ParticipantChanges {
    pub is_muted: Option<bool>,
    pub is_video_on: Option<bool>,
    pub is_speaking: Option<bool>,
    pub status: Option<PresenceStatus>,
}

impl ParticipantChanges {
    pub fn apply_to(&self, participant: &mut participants::Model) {
        if let Some(is_muted) = self.is_muted {
            participant.is_muted = is_muted;
        }
        if let Some(is_video_on) = self.is_video_on {
            participant.is_video_on = is_video_on;
        }
        if let Some(is_speaking) = self.is_speaking {
            participant.is_speaking = is_speaking;
        }
        if let Some(status) = self.status {
            participant.status = status;
        }
    }
}

impl IntoUpdateMap for ParticipantChanges {
    fn into_update_map(self) -> UpdateMap {
        let mut update_map = UpdateMap::new();
        update_map.insert("is_muted".to_string(), self.is_muted.map(Value::from));
        update_map.insert("is_video_on".to_string(), self.is_video_on.map(Value::from));
        update_map.insert("is_speaking".to_string(), self.is_speaking.map(Value::from));
        update_map.insert("status".to_string(), self.status.map(Into::into));
        update_map
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, ToSchema)]
#[schema(as = domain::remote::NewActionItem)]
pub struct NewActionItem {
    pub title: String,
    pub description: Option<String>,
    /// Defaults to the creator.
    #[schema(value_type = Option<Uuid>)]
    pub assigned_to: Option<Id>,
    pub due_date: Option<NaiveDate>,
    pub priority: Option<Priority>,
    pub context: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, ToSchema)]
#[schema(as = domain::remote::ActionItemChanges)]
pub struct ActionItemChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<ActionItemStatus>,
    pub priority: Option<Priority>,
    pub context: Option<String>,
    #[schema(value_type = Option<Uuid>)]
    pub assigned_to: Option<Id>,
    pub due_date: Option<NaiveDate>,
}

impl ActionItemChanges {
    pub fn status(status: ActionItemStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// Patches a cached row the same way the database row is patched.
    pub fn apply_to(&self, action_item: &mut action_items::Model) {
        if let Some(title) = &self.title {
            action_item.title = title.clone();
        }
        if let Some(description) = &self.description {
            action_item.description = Some(description.clone());
        }
        if let Some(status) = self.status {
            action_item.status = status;
        }
        if let Some(priority) = self.priority {
            action_item.priority = priority;
        }
        if let Some(context) = &self.context {
            action_item.context = Some(context.clone());
        }
        if let Some(assigned_to) = self.assigned_to {
            action_item.assigned_to = Some(assigned_to);
        }
        if let Some(due_date) = self.due_date {
            action_item.due_date = Some(due_date);
        }
    }
}

impl IntoUpdateMap for ActionItemChanges {
    fn into_update_map(self) -> UpdateMap {
        let mut update_map = UpdateMap::new();
        update_map.insert("title".to_string(), self.title.map(Value::from));
        update_map.insert("description".to_string(), self.description.map(Value::from));
        update_map.insert("status".to_string(), self.status.map(Into::into));
        update_map.insert("priority".to_string(), self.priority.map(Into::into));
        update_map.insert("context".to_string(), self.context.map(Value::from));
        update_map.insert("assigned_to".to_string(), self.assigned_to.map(Value::from));
        update_map.insert("due_date".to_string(), self.due_date.map(Value::from));
        update_map
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewRecording {
    pub file_path: String,
    pub file_size: i64,
    pub duration_seconds: i32,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

#[async_trait]
pub trait Remote: Send + Sync {
    async fn find_meeting_by_code(&self, code: &str) -> Result<Option<meetings::Model>, Error>;
    async fn find_meeting(&self, id: Id) -> Result<meetings::Model, Error>;
    /// Inserts a `waiting` meeting hosted by the session's user.
    async fn insert_meeting(
        &self,
        session: &Session,
        meeting: NewMeeting,
    ) -> Result<meetings::Model, Error>;
    async fn update_meeting_status(
        &self,
        id: Id,
        status: MeetingStatus,
    ) -> Result<meetings::Model, Error>;
    /// Meetings the user hosts or has joined, newest first.
    async fn meetings_for_member(&self, user_id: Id) -> Result<Vec<meetings::Model>, Error>;

    /// Participants in join order.
    async fn list_participants(
        &self,
        meeting_id: Id,
        include_departed: bool,
    ) -> Result<Vec<participants::Model>, Error>;
    async fn find_present_participant(
        &self,
        meeting_id: Id,
        user_id: Id,
    ) -> Result<Option<participants::Model>, Error>;
    async fn insert_participant(
        &self,
        session: &Session,
        meeting_id: Id,
        name: String,
    ) -> Result<participants::Model, Error>;
    /// Updates the session user's present row in the meeting and nobody else's.
    async fn update_participant(
        &self,
        session: &Session,
        meeting_id: Id,
        changes: ParticipantChanges,
    ) -> Result<participants::Model, Error>;
    /// Stamps `left_at` on the session user's present row, if there is one.
    async fn mark_participant_left(
        &self,
        session: &Session,
        meeting_id: Id,
    ) -> Result<Option<participants::Model>, Error>;

    /// Entries oldest first.
    async fn list_transcripts(&self, meeting_id: Id) -> Result<Vec<transcripts::Model>, Error>;
    async fn insert_transcript(
        &self,
        meeting_id: Id,
        speaker_name: String,
        content: String,
    ) -> Result<transcripts::Model, Error>;

    /// Items newest first.
    async fn list_action_items(&self, meeting_id: Id) -> Result<Vec<action_items::Model>, Error>;
    async fn insert_action_item(
        &self,
        session: &Session,
        meeting_id: Id,
        item: NewActionItem,
    ) -> Result<action_items::Model, Error>;
    async fn update_action_item(
        &self,
        id: Id,
        changes: ActionItemChanges,
    ) -> Result<action_items::Model, Error>;

    /// Maps newest first.
    async fn list_mind_maps(&self, meeting_id: Id) -> Result<Vec<mind_maps::Model>, Error>;
    async fn find_mind_map(&self, id: Id) -> Result<mind_maps::Model, Error>;
    async fn insert_mind_map(
        &self,
        session: &Session,
        meeting_id: Id,
        title: String,
        content: MindMapDocument,
    ) -> Result<mind_maps::Model, Error>;
    /// Writes `content` only if the stored version is still `expected_version`.
    /// `Ok(None)` means another writer won.
    async fn update_mind_map(
        &self,
        id: Id,
        expected_version: i32,
        content: MindMapDocument,
    ) -> Result<Option<mind_maps::Model>, Error>;

    /// Stores a blob in the recordings bucket and returns its size.
    async fn upload_recording(&self, path: &str, bytes: Vec<u8>) -> Result<u64, Error>;
    /// Removes an uploaded blob that never got its metadata row.
    async fn discard_recording(&self, path: &str) -> Result<(), Error>;
    async fn insert_recording(
        &self,
        meeting_id: Id,
        recording: NewRecording,
    ) -> Result<recordings::Model, Error>;
    async fn list_recordings(&self, meeting_id: Id) -> Result<Vec<recordings::Model>, Error>;

    fn subscribe(&self, filter: FeedFilter) -> Subscription;
}

/// [`Remote`] backed by Postgres and the configured object store.
#[derive(Clone)]
pub struct DbRemote {
    db: Arc<DatabaseConnection>,
    event_publisher: Arc<EventPublisher>,
    change_feed: ChangeFeed,
    storage: Arc<dyn ObjectStorage>,
}

impl DbRemote {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_publisher: Arc<EventPublisher>,
        change_feed: ChangeFeed,
        storage: Arc<dyn ObjectStorage>,
    ) -> Self {
        Self {
            db,
            event_publisher,
            change_feed,
            storage,
        }
    }

    pub fn from_app_state(app_state: &AppState) -> Self {
        Self::new(
            Arc::clone(&app_state.database_connection),
            Arc::clone(&app_state.event_publisher),
            app_state.change_feed.clone(),
            Arc::clone(&app_state.storage),
        )
    }

    fn db(&self) -> &DatabaseConnection {
        self.db.as_ref()
    }

    async fn publish<M: Serialize>(
        &self,
        table: Table,
        kind: ChangeKind,
        meeting_id: Id,
        record_id: Id,
        model: &M,
    ) {
        let record = match serde_json::to_value(model) {
            Ok(record) => record,
            Err(e) => {
                warn!("Not publishing {kind} on {table} {record_id}, row did not serialize: {e:?}");
                return;
            }
        };

        let change = RowChange {
            table,
            kind,
            meeting_id,
            record_id,
            record,
        };
        self.event_publisher
            .publish(DomainEvent::RowChanged(change))
            .await;
    }

    async fn present_participant(
        &self,
        session: &Session,
        meeting_id: Id,
    ) -> Result<Option<participants::Model>, Error> {
        Ok(entity_api::participant::find_present(self.db(), meeting_id, session.user_id).await?)
    }
}

#[async_trait]
impl Remote for DbRemote {
    async fn find_meeting_by_code(&self, code: &str) -> Result<Option<meetings::Model>, Error> {
        Ok(entity_api::meeting::find_by_code(self.db(), code).await?)
    }

    async fn find_meeting(&self, id: Id) -> Result<meetings::Model, Error> {
        Ok(entity_api::meeting::find_by_id(self.db(), id).await?)
    }

    async fn insert_meeting(
        &self,
        session: &Session,
        meeting: NewMeeting,
    ) -> Result<meetings::Model, Error> {
        let now = Utc::now();
        let meeting = entity_api::meeting::create(
            self.db(),
            meetings::Model {
                id: Id::nil(),
                code: meeting.code,
                title: meeting.title,
                status: MeetingStatus::Waiting,
                host_id: session.user_id,
                scheduled_for: meeting.scheduled_for,
                started_at: None,
                ended_at: None,
                created_at: now.into(),
                updated_at: now.into(),
            },
        )
        .await?;

        self.publish(Table::Meetings, ChangeKind::Insert, meeting.id, meeting.id, &meeting)
            .await;
        Ok(meeting)
    }

    async fn update_meeting_status(
        &self,
        id: Id,
        status: MeetingStatus,
    ) -> Result<meetings::Model, Error> {
        let meeting = entity_api::meeting::update_status(self.db(), id, status).await?;
        self.publish(Table::Meetings, ChangeKind::Update, meeting.id, meeting.id, &meeting)
            .await;
        Ok(meeting)
    }

    async fn meetings_for_member(&self, user_id: Id) -> Result<Vec<meetings::Model>, Error> {
        Ok(entity_api::meeting::find_by_member(self.db(), user_id).await?)
    }

    async fn list_participants(
        &self,
        meeting_id: Id,
        include_departed: bool,
    ) -> Result<Vec<participants::Model>, Error> {
        Ok(
            entity_api::participant::find_by_meeting(self.db(), meeting_id, include_departed)
                .await?,
        )
    }

    async fn find_present_participant(
        &self,
        meeting_id: Id,
        user_id: Id,
    ) -> Result<Option<participants::Model>, Error> {
        Ok(entity_api::participant::find_present(self.db(), meeting_id, user_id).await?)
    }

    async fn insert_participant(
        &self,
        session: &Session,
        meeting_id: Id,
        name: String,
    ) -> Result<participants::Model, Error> {
        let now = Utc::now();
        let participant = entity_api::participant::create(
            self.db(),
            participants::Model {
                id: Id::nil(),
                meeting_id,
                user_id: session.user_id,
                name,
                is_muted: false,
                is_video_on: true,
                is_speaking: false,
                status: PresenceStatus::Online,
                joined_at: now.into(),
                left_at: None,
            },
        )
        .await?;

        self.publish(
            Table::Participants,
            ChangeKind::Insert,
            meeting_id,
            participant.id,
            &participant,
        )
        .await;
        Ok(participant)
    }

    async fn update_participant(
        &self,
        session: &Session,
        meeting_id: Id,
        changes: ParticipantChanges,
    ) -> Result<participants::Model, Error> {
        let participant = self
            .present_participant(session, meeting_id)
            .await?
            .ok_or_else(|| Error::entity(EntityErrorKind::NotFound))?;

        let participant = entity_api::participant::update(
            self.db(),
            participant.id,
            changes.into_update_map(),
        )
        .await?;

        self.publish(
            Table::Participants,
            ChangeKind::Update,
            meeting_id,
            participant.id,
            &participant,
        )
        .await;
        Ok(participant)
    }

    async fn mark_participant_left(
        &self,
        session: &Session,
        meeting_id: Id,
    ) -> Result<Option<participants::Model>, Error> {
        let Some(participant) = self.present_participant(session, meeting_id).await? else {
            return Ok(None);
        };

        let participant = entity_api::participant::mark_left(self.db(), participant.id).await?;
        self.publish(
            Table::Participants,
            ChangeKind::Update,
            meeting_id,
            participant.id,
            &participant,
        )
        .await;
        Ok(Some(participant))
    }

    async fn list_transcripts(&self, meeting_id: Id) -> Result<Vec<transcripts::Model>, Error> {
        Ok(entity_api::transcript::find_by_meeting(self.db(), meeting_id).await?)
    }

    async fn insert_transcript(
        &self,
        meeting_id: Id,
        speaker_name: String,
        content: String,
    ) -> Result<transcripts::Model, Error> {
        let now = Utc::now();
        let entry = entity_api::transcript::create(
            self.db(),
            transcripts::Model {
                id: Id::nil(),
                meeting_id,
                speaker_name,
                content,
                timestamp: now.into(),
                created_at: now.into(),
            },
        )
        .await?;

        self.publish(Table::Transcripts, ChangeKind::Insert, meeting_id, entry.id, &entry)
            .await;
        Ok(entry)
    }

    async fn list_action_items(&self, meeting_id: Id) -> Result<Vec<action_items::Model>, Error> {
        Ok(entity_api::action_item::find_by_meeting(self.db(), meeting_id).await?)
    }

    async fn insert_action_item(
        &self,
        session: &Session,
        meeting_id: Id,
        item: NewActionItem,
    ) -> Result<action_items::Model, Error> {
        let now = Utc::now();
        let action_item = entity_api::action_item::create(
            self.db(),
            action_items::Model {
                id: Id::nil(),
                meeting_id,
                title: item.title,
                description: item.description,
                status: ActionItemStatus::Pending,
                priority: item.priority.unwrap_or_default(),
                context: item.context,
                assigned_to: Some(item.assigned_to.unwrap_or(session.user_id)),
                created_by: session.user_id,
                due_date: item.due_date,
                created_at: now.into(),
                updated_at: now.into(),
            },
        )
        .await?;

        self.publish(
            Table::ActionItems,
            ChangeKind::Insert,
            meeting_id,
            action_item.id,
            &action_item,
        )
        .await;
        Ok(action_item)
    }

    async fn update_action_item(
        &self,
        id: Id,
        changes: ActionItemChanges,
    ) -> Result<action_items::Model, Error> {
        let action_item =
            entity_api::action_item::update(self.db(), id, changes.into_update_map()).await?;
        self.publish(
            Table::ActionItems,
            ChangeKind::Update,
            action_item.meeting_id,
            action_item.id,
            &action_item,
        )
        .await;
        Ok(action_item)
    }

    async fn list_mind_maps(&self, meeting_id: Id) -> Result<Vec<mind_maps::Model>, Error> {
        Ok(entity_api::mind_map::find_by_meeting(self.db(), meeting_id).await?)
    }

    async fn find_mind_map(&self, id: Id) -> Result<mind_maps::Model, Error> {
        Ok(entity_api::mind_map::find_by_id(self.db(), id).await?)
    }

    async fn insert_mind_map(
        &self,
        session: &Session,
        meeting_id: Id,
        title: String,
        content: MindMapDocument,
    ) -> Result<mind_maps::Model, Error> {
        let now = Utc::now();
        let mind_map = entity_api::mind_map::create(
            self.db(),
            mind_maps::Model {
                id: Id::nil(),
                meeting_id,
                title,
                content,
                version: 1,
                created_by: session.user_id,
                created_at: now.into(),
                updated_at: now.into(),
            },
        )
        .await?;

        self.publish(Table::MindMaps, ChangeKind::Insert, meeting_id, mind_map.id, &mind_map)
            .await;
        Ok(mind_map)
    }

    async fn update_mind_map(
        &self,
        id: Id,
        expected_version: i32,
        content: MindMapDocument,
    ) -> Result<Option<mind_maps::Model>, Error> {
        let Some(mind_map) =
            entity_api::mind_map::update_content(self.db(), id, expected_version, content).await?
        else {
            return Ok(None);
        };

        self.publish(
            Table::MindMaps,
            ChangeKind::Update,
            mind_map.meeting_id,
            mind_map.id,
            &mind_map,
        )
        .await;
        Ok(Some(mind_map))
    }

    async fn upload_recording(&self, path: &str, bytes: Vec<u8>) -> Result<u64, Error> {
        Ok(self.storage.put_object(path, bytes).await?)
    }

    async fn discard_recording(&self, path: &str) -> Result<(), Error> {
        Ok(self.storage.delete_object(path).await?)
    }

    async fn insert_recording(
        &self,
        meeting_id: Id,
        recording: NewRecording,
    ) -> Result<recordings::Model, Error> {
        let recording = entity_api::recording::create(
            self.db(),
            recordings::Model {
                id: Id::nil(),
                meeting_id,
                file_path: recording.file_path,
                file_size: recording.file_size,
                duration_seconds: recording.duration_seconds,
                started_at: recording.started_at.into(),
                ended_at: recording.ended_at.into(),
                created_at: Utc::now().into(),
            },
        )
        .await?;

        self.publish(
            Table::Recordings,
            ChangeKind::Insert,
            meeting_id,
            recording.id,
            &recording,
        )
        .await;
        Ok(recording)
    }

    async fn list_recordings(&self, meeting_id: Id) -> Result<Vec<recordings::Model>, Error> {
        Ok(entity_api::recording::find_by_meeting(self.db(), meeting_id).await?)
    }

    fn subscribe(&self, filter: FeedFilter) -> Subscription {
        self.change_feed.subscribe(filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn participant_changes_only_map_the_fields_given() {
        let update_map = ParticipantChanges {
            is_muted: Some(true),
            ..Default::default()
        }
        .into_update_map();

        assert_eq!(update_map.get("is_muted"), Some(&Value::from(true)));
        assert!(update_map.get("is_video_on").is_none());
        assert!(update_map.get("status").is_none());
    }

    #[test]
    fn empty_changes_are_an_empty_update() {
        assert!(ParticipantChanges::default().into_update_map().is_empty());
        assert!(ActionItemChanges::default().into_update_map().is_empty());
    }

    #[test]
    fn action_item_changes_patch_a_cached_row() {
        let now = Utc::now();
        let mut item = action_items::Model {
            id: Id::new_v4(),
            meeting_id: Id::new_v4(),
            title: "Review metrics".to_string(),
            description: None,
            status: ActionItemStatus::Pending,
            priority: Priority::Medium,
            context: None,
            assigned_to: None,
            created_by: Id::new_v4(),
            due_date: None,
            created_at: now.into(),
            updated_at: now.into(),
        };

        ActionItemChanges {
            status: Some(ActionItemStatus::Completed),
            priority: Some(Priority::High),
            ..Default::default()
        }
        .apply_to(&mut item);

        assert_eq!(item.status, ActionItemStatus::Completed);
        assert_eq!(item.priority, Priority::High);
        assert_eq!(item.title, "Review metrics");
    }
}
