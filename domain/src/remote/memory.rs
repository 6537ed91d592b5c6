//! An in-memory [`Remote`] for store tests. Writes are announced through a
//! real [`ChangeFeed`], the same way [`super::DbRemote`] announces them.

use super::*;
use entity::mind_map_document::{MindMapNode, NodeType};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

#[derive(Default)]
struct Tables {
    meetings: Vec<meetings::Model>,
    participants: Vec<participants::Model>,
    transcripts: Vec<transcripts::Model>,
    action_items: Vec<action_items::Model>,
    mind_maps: Vec<mind_maps::Model>,
    recordings: Vec<recordings::Model>,
    objects: HashMap<String, Vec<u8>>,
}

pub(crate) struct MemoryRemote {
    tables: Mutex<Tables>,
    feed: ChangeFeed,
    failing: Mutex<HashSet<&'static str>>,
    /// How many upcoming mind map writes lose to a simulated concurrent writer.
    lost_mind_map_writes: Mutex<u32>,
}

impl MemoryRemote {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            tables: Mutex::new(Tables::default()),
            feed: ChangeFeed::default(),
            failing: Mutex::new(HashSet::new()),
            lost_mind_map_writes: Mutex::new(0),
        })
    }

    /// Makes every later call of `operation` fail as a database error.
    pub(crate) fn fail(&self, operation: &'static str) {
        self.failing.lock().unwrap().insert(operation);
    }

    pub(crate) fn lose_next_mind_map_writes(&self, count: u32) {
        *self.lost_mind_map_writes.lock().unwrap() = count;
    }

    pub(crate) fn participants(&self) -> Vec<participants::Model> {
        self.tables.lock().unwrap().participants.clone()
    }

    pub(crate) fn meeting(&self, id: Id) -> Option<meetings::Model> {
        self.tables
            .lock()
            .unwrap()
            .meetings
            .iter()
            .find(|m| m.id == id)
            .cloned()
    }

    pub(crate) fn recordings(&self) -> Vec<recordings::Model> {
        self.tables.lock().unwrap().recordings.clone()
    }

    pub(crate) fn object(&self, path: &str) -> Option<Vec<u8>> {
        self.tables.lock().unwrap().objects.get(path).cloned()
    }

    pub(crate) fn mind_map(&self, id: Id) -> Option<mind_maps::Model> {
        self.tables
            .lock()
            .unwrap()
            .mind_maps
            .iter()
            .find(|m| m.id == id)
            .cloned()
    }

    fn check(&self, operation: &'static str) -> Result<(), Error> {
        if self.failing.lock().unwrap().contains(operation) {
            return Err(Error::entity(EntityErrorKind::DbTransaction));
        }
        Ok(())
    }

    fn emit<M: Serialize>(&self, table: Table, kind: ChangeKind, meeting_id: Id, id: Id, model: &M) {
        self.feed.publish(RowChange {
            table,
            kind,
            meeting_id,
            record_id: id,
            record: serde_json::to_value(model).unwrap(),
        });
    }
}

#[async_trait]
impl Remote for MemoryRemote {
    async fn find_meeting_by_code(&self, code: &str) -> Result<Option<meetings::Model>, Error> {
        self.check("find_meeting_by_code")?;
        let tables = self.tables.lock().unwrap();
        Ok(tables.meetings.iter().find(|m| m.code == code).cloned())
    }

    async fn find_meeting(&self, id: Id) -> Result<meetings::Model, Error> {
        self.meeting(id)
            .ok_or_else(|| Error::entity(EntityErrorKind::NotFound))
    }

    async fn insert_meeting(
        &self,
        session: &Session,
        meeting: NewMeeting,
    ) -> Result<meetings::Model, Error> {
        self.check("insert_meeting")?;
        let now = Utc::now();
        let meeting = meetings::Model {
            id: Id::new_v4(),
            code: meeting.code,
            title: meeting.title,
            status: MeetingStatus::Waiting,
            host_id: session.user_id,
            scheduled_for: meeting.scheduled_for,
            started_at: None,
            ended_at: None,
            created_at: now.into(),
            updated_at: now.into(),
        };
        self.tables.lock().unwrap().meetings.push(meeting.clone());
        self.emit(Table::Meetings, ChangeKind::Insert, meeting.id, meeting.id, &meeting);
        Ok(meeting)
    }

    async fn update_meeting_status(
        &self,
        id: Id,
        status: MeetingStatus,
    ) -> Result<meetings::Model, Error> {
        self.check("update_meeting_status")?;
        let meeting = {
            let mut tables = self.tables.lock().unwrap();
            let meeting = tables
                .meetings
                .iter_mut()
                .find(|m| m.id == id)
                .ok_or_else(|| Error::entity(EntityErrorKind::NotFound))?;
            let now = Utc::now();
            meeting.status = status;
            match status {
                MeetingStatus::Active if meeting.started_at.is_none() => {
                    meeting.started_at = Some(now.into())
                }
                MeetingStatus::Ended => meeting.ended_at = Some(now.into()),
                _ => {}
            }
            meeting.clone()
        };
        self.emit(Table::Meetings, ChangeKind::Update, id, id, &meeting);
        Ok(meeting)
    }

    async fn meetings_for_member(&self, user_id: Id) -> Result<Vec<meetings::Model>, Error> {
        let tables = self.tables.lock().unwrap();
        let mut meetings: Vec<_> = tables
            .meetings
            .iter()
            .filter(|m| {
                m.host_id == user_id
                    || tables
                        .participants
                        .iter()
                        .any(|p| p.meeting_id == m.id && p.user_id == user_id)
            })
            .cloned()
            .collect();
        meetings.reverse();
        Ok(meetings)
    }

    async fn list_participants(
        &self,
        meeting_id: Id,
        include_departed: bool,
    ) -> Result<Vec<participants::Model>, Error> {
        self.check("list_participants")?;
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .participants
            .iter()
            .filter(|p| p.meeting_id == meeting_id && (include_departed || p.is_present()))
            .cloned()
            .collect())
    }

    async fn find_present_participant(
        &self,
        meeting_id: Id,
        user_id: Id,
    ) -> Result<Option<participants::Model>, Error> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .participants
            .iter()
            .rev()
            .find(|p| p.meeting_id == meeting_id && p.user_id == user_id && p.is_present())
            .cloned())
    }

    async fn insert_participant(
        &self,
        session: &Session,
        meeting_id: Id,
        name: String,
    ) -> Result<participants::Model, Error> {
        self.check("insert_participant")?;
        let participant = participants::Model {
            id: Id::new_v4(),
            meeting_id,
            user_id: session.user_id,
            name,
            is_muted: false,
            is_video_on: true,
            is_speaking: false,
            status: PresenceStatus::Online,
            joined_at: Utc::now().into(),
            left_at: None,
        };
        self.tables
            .lock()
            .unwrap()
            .participants
            .push(participant.clone());
        self.emit(
            Table::Participants,
            ChangeKind::Insert,
            meeting_id,
            participant.id,
            &participant,
        );
        Ok(participant)
    }

    async fn update_participant(
        &self,
        session: &Session,
        meeting_id: Id,
        changes: ParticipantChanges,
    ) -> Result<participants::Model, Error> {
        self.check("update_participant")?;
        let participant = {
            let mut tables = self.tables.lock().unwrap();
            let participant = tables
                .participants
                .iter_mut()
                .rev()
                .find(|p| p.meeting_id == meeting_id && p.user_id == session.user_id && p.is_present())
                .ok_or_else(|| Error::entity(EntityErrorKind::NotFound))?;
            changes.apply_to(participant);
            participant.clone()
        };
        self.emit(
            Table::Participants,
            ChangeKind::Update,
            meeting_id,
            participant.id,
            &participant,
        );
        Ok(participant)
    }

    async fn mark_participant_left(
        &self,
        session: &Session,
        meeting_id: Id,
    ) -> Result<Option<participants::Model>, Error> {
        self.check("mark_participant_left")?;
        let participant = {
            let mut tables = self.tables.lock().unwrap();
            let Some(participant) = tables
                .participants
                .iter_mut()
                .rev()
                .find(|p| p.meeting_id == meeting_id && p.user_id == session.user_id && p.is_present())
            else {
                return Ok(None);
            };
            participant.left_at = Some(Utc::now().into());
            participant.is_speaking = false;
            participant.clone()
        };
        self.emit(
            Table::Participants,
            ChangeKind::Update,
            meeting_id,
            participant.id,
            &participant,
        );
        Ok(Some(participant))
    }

    async fn list_transcripts(&self, meeting_id: Id) -> Result<Vec<transcripts::Model>, Error> {
        let tables = self.tables.lock().unwrap();
        let mut entries: Vec<_> = tables
            .transcripts
            .iter()
            .filter(|t| t.meeting_id == meeting_id)
            .cloned()
            .collect();
        entries.sort_by_key(|t| t.timestamp);
        Ok(entries)
    }

    async fn insert_transcript(
        &self,
        meeting_id: Id,
        speaker_name: String,
        content: String,
    ) -> Result<transcripts::Model, Error> {
        self.check("insert_transcript")?;
        let now = Utc::now();
        let entry = transcripts::Model {
            id: Id::new_v4(),
            meeting_id,
            speaker_name,
            content,
            timestamp: now.into(),
            created_at: now.into(),
        };
        self.tables.lock().unwrap().transcripts.push(entry.clone());
        self.emit(Table::Transcripts, ChangeKind::Insert, meeting_id, entry.id, &entry);
        Ok(entry)
    }

    async fn list_action_items(&self, meeting_id: Id) -> Result<Vec<action_items::Model>, Error> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .action_items
            .iter()
            .rev()
            .filter(|a| a.meeting_id == meeting_id)
            .cloned()
            .collect())
    }

    async fn insert_action_item(
        &self,
        session: &Session,
        meeting_id: Id,
        item: NewActionItem,
    ) -> Result<action_items::Model, Error> {
        self.check("insert_action_item")?;
        let now = Utc::now();
        let action_item = action_items::Model {
            id: Id::new_v4(),
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
        };
        self.tables
            .lock()
            .unwrap()
            .action_items
            .push(action_item.clone());
        self.emit(
            Table::ActionItems,
            ChangeKind::Insert,
            meeting_id,
            action_item.id,
            &action_item,
        );
        Ok(action_item)
    }

    async fn update_action_item(
        &self,
        id: Id,
        changes: ActionItemChanges,
    ) -> Result<action_items::Model, Error> {
        self.check("update_action_item")?;
        let action_item = {
            let mut tables = self.tables.lock().unwrap();
            let action_item = tables
                .action_items
                .iter_mut()
                .find(|a| a.id == id)
                .ok_or_else(|| Error::entity(EntityErrorKind::NotFound))?;
            changes.apply_to(action_item);
            action_item.updated_at = Utc::now().into();
            action_item.clone()
        };
        self.emit(
            Table::ActionItems,
            ChangeKind::Update,
            action_item.meeting_id,
            id,
            &action_item,
        );
        Ok(action_item)
    }

    async fn list_mind_maps(&self, meeting_id: Id) -> Result<Vec<mind_maps::Model>, Error> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .mind_maps
            .iter()
            .rev()
            .filter(|m| m.meeting_id == meeting_id)
            .cloned()
            .collect())
    }

    async fn find_mind_map(&self, id: Id) -> Result<mind_maps::Model, Error> {
        self.mind_map(id)
            .ok_or_else(|| Error::entity(EntityErrorKind::NotFound))
    }

    async fn insert_mind_map(
        &self,
        session: &Session,
        meeting_id: Id,
        title: String,
        content: MindMapDocument,
    ) -> Result<mind_maps::Model, Error> {
        self.check("insert_mind_map")?;
        let now = Utc::now();
        let mind_map = mind_maps::Model {
            id: Id::new_v4(),
            meeting_id,
            title,
            content,
            version: 1,
            created_by: session.user_id,
            created_at: now.into(),
            updated_at: now.into(),
        };
        self.tables.lock().unwrap().mind_maps.push(mind_map.clone());
        self.emit(Table::MindMaps, ChangeKind::Insert, meeting_id, mind_map.id, &mind_map);
        Ok(mind_map)
    }

    async fn update_mind_map(
        &self,
        id: Id,
        expected_version: i32,
        content: MindMapDocument,
    ) -> Result<Option<mind_maps::Model>, Error> {
        self.check("update_mind_map")?;

        let lose = {
            let mut lost = self.lost_mind_map_writes.lock().unwrap();
            let lose = *lost > 0;
            *lost = lost.saturating_sub(1);
            lose
        };

        let (mind_map, won) = {
            let mut tables = self.tables.lock().unwrap();
            let mind_map = tables
                .mind_maps
                .iter_mut()
                .find(|m| m.id == id)
                .ok_or_else(|| Error::entity(EntityErrorKind::NotFound))?;

            if lose {
                // Someone else appends a node first.
                let node_id = format!("other_{}", mind_map.version);
                mind_map.content.push_node(MindMapNode {
                    id: node_id,
                    text: "Concurrent idea".to_string(),
                    x: 150.0,
                    y: 150.0,
                    node_type: NodeType::Leaf,
                    parent_id: None,
                    color: None,
                });
                mind_map.version += 1;
                (mind_map.clone(), false)
            } else if mind_map.version != expected_version {
                return Ok(None);
            } else {
                mind_map.content = content;
                mind_map.version += 1;
                mind_map.updated_at = Utc::now().into();
                (mind_map.clone(), true)
            }
        };

        self.emit(
            Table::MindMaps,
            ChangeKind::Update,
            mind_map.meeting_id,
            id,
            &mind_map,
        );
        Ok(won.then_some(mind_map))
    }

    async fn upload_recording(&self, path: &str, bytes: Vec<u8>) -> Result<u64, Error> {
        if self.failing.lock().unwrap().contains("upload_recording") {
            return Err(service::storage::StorageError::from(std::io::Error::other(
                "bucket unavailable",
            ))
            .into());
        }
        let size = bytes.len() as u64;
        self.tables
            .lock()
            .unwrap()
            .objects
            .insert(path.to_string(), bytes);
        Ok(size)
    }

    async fn discard_recording(&self, path: &str) -> Result<(), Error> {
        self.check("discard_recording")?;
        self.tables.lock().unwrap().objects.remove(path);
        Ok(())
    }

    async fn insert_recording(
        &self,
        meeting_id: Id,
        recording: NewRecording,
    ) -> Result<recordings::Model, Error> {
        self.check("insert_recording")?;
        let recording = recordings::Model {
            id: Id::new_v4(),
            meeting_id,
            file_path: recording.file_path,
            file_size: recording.file_size,
            duration_seconds: recording.duration_seconds,
            started_at: recording.started_at.into(),
            ended_at: recording.ended_at.into(),
            created_at: Utc::now().into(),
        };
        self.tables.lock().unwrap().recordings.push(recording.clone());
        self.emit(
            Table::Recordings,
            ChangeKind::Insert,
            meeting_id,
            recording.id,
            &recording,
        );
        Ok(recording)
    }

    async fn list_recordings(&self, meeting_id: Id) -> Result<Vec<recordings::Model>, Error> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .recordings
            .iter()
            .filter(|r| r.meeting_id == meeting_id)
            .cloned()
            .collect())
    }

    fn subscribe(&self, filter: FeedFilter) -> Subscription {
        self.feed.subscribe(filter)
    }
}
