//! Meeting lifecycle and the live participant list of one meeting.

use crate::code::generate_meeting_code;
use crate::error::{EntityErrorKind, Error};
use crate::notice::Notices;
use crate::remote::{NewMeeting, ParticipantChanges, Remote};
use crate::session::Session;
use crate::{decode_record, drain_pending, meetings, participants, Id, IntoUpdateMap};
use chrono::{NaiveDate, NaiveTime};
use entity::meeting_status::MeetingStatus;
use events::{ChangeKind, FeedFilter, RowChange, Subscription, Table};
use log::*;
use std::sync::Arc;

/// Resolves a public meeting code to its row.
pub async fn find_by_code(remote: &dyn Remote, code: &str) -> Result<meetings::Model, Error> {
    remote
        .find_meeting_by_code(code)
        .await?
        .ok_or_else(|| Error::entity(EntityErrorKind::NotFound))
}

fn ensure_transition(meeting: &meetings::Model, next: MeetingStatus) -> Result<(), Error> {
    if meeting.status.can_transition_to(next) {
        Ok(())
    } else {
        warn!(
            "Rejecting status change {} -> {next} for meeting {}",
            meeting.status, meeting.id
        );
        Err(Error::entity(EntityErrorKind::Invalid))
    }
}

pub struct MeetingRoom {
    remote: Arc<dyn Remote>,
    session: Session,
    meeting: Option<meetings::Model>,
    /// Present participants in join order.
    participants: Vec<participants::Model>,
    subscription: Option<Subscription>,
    notices: Notices,
}

impl MeetingRoom {
    pub fn new(remote: Arc<dyn Remote>, session: Session) -> Self {
        Self {
            remote,
            session,
            meeting: None,
            participants: Vec::new(),
            subscription: None,
            notices: Notices::default(),
        }
    }

    pub fn meeting(&self) -> Option<&meetings::Model> {
        self.meeting.as_ref()
    }

    pub fn participants(&self) -> &[participants::Model] {
        &self.participants
    }

    /// The caller's own present row, if the caller is in the meeting.
    pub fn me(&self) -> Option<&participants::Model> {
        self.participants
            .iter()
            .find(|p| p.user_id == self.session.user_id)
    }

    pub fn is_host(&self) -> bool {
        self.meeting
            .as_ref()
            .is_some_and(|m| m.is_hosted_by(self.session.user_id))
    }

    pub fn notices(&mut self) -> &mut Notices {
        &mut self.notices
    }

    /// Loads the meeting, its present participants, and starts following
    /// participant and meeting changes.
    pub async fn load(&mut self, code: &str) -> Result<(), Error> {
        match self.fetch(code).await {
            Ok(()) => Ok(()),
            Err(err) => {
                warn!("Error loading meeting {code}: {err:?}");
                self.notices.error(match err.entity_kind() {
                    Some(EntityErrorKind::NotFound) => "Meeting not found",
                    _ => "Failed to load meeting",
                });
                Err(err)
            }
        }
    }

    async fn fetch(&mut self, code: &str) -> Result<(), Error> {
        let meeting = find_by_code(self.remote.as_ref(), code).await?;
        // Subscribe before listing so nothing written in between is missed.
        let subscription = self.remote.subscribe(FeedFilter::meeting(meeting.id));
        let participants = self.remote.list_participants(meeting.id, false).await?;

        debug!(
            "Loaded meeting {} with {} participants",
            meeting.code,
            participants.len()
        );

        self.meeting = Some(meeting);
        self.participants = participants;
        self.subscription = Some(subscription);
        Ok(())
    }

    /// Starts a new meeting hosted by the caller and returns its public code.
    pub async fn create(&mut self, title: &str) -> Result<String, Error> {
        match self.open(title, None).await {
            Ok(code) => {
                self.notices
                    .info("Meeting Created", format!("Meeting code: {code}"));
                Ok(code)
            }
            Err(err) => {
                warn!("Error creating meeting: {err:?}");
                self.notices.error("Failed to create meeting");
                Err(err)
            }
        }
    }

    /// Like [`MeetingRoom::create`], for a meeting planned at `date` `time` (UTC).
    pub async fn schedule(
        &mut self,
        title: &str,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<String, Error> {
        let scheduled_for = date.and_time(time).and_utc().fixed_offset();
        match self.open(title, Some(scheduled_for)).await {
            Ok(code) => {
                self.notices.info(
                    "Meeting Scheduled",
                    format!("Scheduled for {scheduled_for}, code: {code}"),
                );
                Ok(code)
            }
            Err(err) => {
                warn!("Error scheduling meeting: {err:?}");
                self.notices.error("Failed to schedule meeting");
                Err(err)
            }
        }
    }

    async fn open(
        &mut self,
        title: &str,
        scheduled_for: Option<chrono::DateTime<chrono::FixedOffset>>,
    ) -> Result<String, Error> {
        let title = title.trim();
        if title.is_empty() {
            return Err(Error::entity(EntityErrorKind::Invalid));
        }

        let meeting = self
            .remote
            .insert_meeting(
                &self.session,
                NewMeeting {
                    code: generate_meeting_code(),
                    title: title.to_string(),
                    scheduled_for,
                },
            )
            .await?;

        let subscription = self.remote.subscribe(FeedFilter::meeting(meeting.id));
        let host = self
            .remote
            .insert_participant(&self.session, meeting.id, self.session.display_name.clone())
            .await?;

        info!(
            "User {} opened meeting {} ({})",
            self.session.user_id, meeting.code, meeting.title
        );

        let code = meeting.code.clone();
        self.meeting = Some(meeting);
        self.participants = vec![host];
        self.subscription = Some(subscription);
        Ok(code)
    }

    /// Joins the meeting behind `code`. A host joining a waiting meeting starts it.
    pub async fn join(&mut self, code: &str, display_name: &str) -> Result<(), Error> {
        match self.enter(code, display_name).await {
            Ok(()) => Ok(()),
            Err(err) => {
                warn!("Error joining meeting {code}: {err:?}");
                self.notices.error(match err.entity_kind() {
                    Some(EntityErrorKind::NotFound) => "Meeting not found",
                    Some(EntityErrorKind::Invalid) => "This meeting has ended",
                    _ => "Failed to join meeting",
                });
                Err(err)
            }
        }
    }

    async fn enter(&mut self, code: &str, display_name: &str) -> Result<(), Error> {
        let meeting = find_by_code(self.remote.as_ref(), code).await?;
        if meeting.status == MeetingStatus::Ended {
            return Err(Error::entity(EntityErrorKind::Invalid));
        }

        let existing = self
            .remote
            .find_present_participant(meeting.id, self.session.user_id)
            .await?;
        if existing.is_none() {
            let name = match display_name.trim() {
                "" => self.session.display_name.clone(),
                name => name.to_string(),
            };
            self.remote
                .insert_participant(&self.session, meeting.id, name)
                .await?;
        }

        if meeting.is_hosted_by(self.session.user_id) && meeting.status == MeetingStatus::Waiting
        {
            info!("Host joined, starting meeting {}", meeting.code);
            self.remote
                .update_meeting_status(meeting.id, MeetingStatus::Active)
                .await?;
        }

        self.fetch(code).await
    }

    /// Leaves the loaded meeting. When the host leaves, the meeting ends.
    pub async fn leave(&mut self) -> Result<(), Error> {
        let Some(meeting) = self.meeting.clone() else {
            return Err(Error::entity(EntityErrorKind::NotFound));
        };

        match self.exit(&meeting).await {
            Ok(()) => {
                self.meeting = None;
                self.participants.clear();
                self.subscription = None;
                Ok(())
            }
            Err(err) => {
                warn!("Error leaving meeting {}: {err:?}", meeting.code);
                self.notices.error("Failed to leave meeting");
                Err(err)
            }
        }
    }

    async fn exit(&mut self, meeting: &meetings::Model) -> Result<(), Error> {
        self.remote
            .mark_participant_left(&self.session, meeting.id)
            .await?;

        if meeting.is_hosted_by(self.session.user_id) {
            let current = self.remote.find_meeting(meeting.id).await?;
            if current.status != MeetingStatus::Ended {
                ensure_transition(&current, MeetingStatus::Ended)?;
                info!("Host left, ending meeting {}", meeting.code);
                self.remote
                    .update_meeting_status(meeting.id, MeetingStatus::Ended)
                    .await?;
            }
        }
        Ok(())
    }

    /// Writes `changes` to the caller's own participant row.
    pub async fn update_status(
        &mut self,
        changes: ParticipantChanges,
    ) -> Result<participants::Model, Error> {
        let meeting = self
            .meeting
            .as_ref()
            .ok_or_else(|| Error::entity(EntityErrorKind::NotFound))?;
        if meeting.status == MeetingStatus::Ended || changes.clone().into_update_map().is_empty()
        {
            return Err(Error::entity(EntityErrorKind::Invalid));
        }

        let participant = self
            .remote
            .update_participant(&self.session, meeting.id, changes)
            .await
            .inspect_err(|err| warn!("Error updating participant status: {err:?}"))?;

        self.upsert_participant(participant.clone());
        Ok(participant)
    }

    pub async fn toggle_mute(&mut self) -> Result<participants::Model, Error> {
        let is_muted = self
            .me()
            .map(|p| p.is_muted)
            .ok_or_else(|| Error::entity(EntityErrorKind::NotFound))?;
        self.update_status(ParticipantChanges {
            is_muted: Some(!is_muted),
            ..Default::default()
        })
        .await
    }

    fn upsert_participant(&mut self, participant: participants::Model) {
        if !participant.is_present() {
            self.remove_participant(participant.id);
            return;
        }
        match self.participants.iter_mut().find(|p| p.id == participant.id) {
            Some(existing) => *existing = participant,
            None => self.participants.push(participant),
        }
    }

    fn remove_participant(&mut self, id: Id) {
        self.participants.retain(|p| p.id != id);
    }

    /// Merges one change into the cached meeting and participant list.
    pub fn apply(&mut self, change: &RowChange) {
        let Some(meeting_id) = self.meeting.as_ref().map(|m| m.id) else {
            return;
        };
        if change.meeting_id != meeting_id {
            return;
        }

        match (change.table, change.kind) {
            (Table::Participants, ChangeKind::Delete) => self.remove_participant(change.record_id),
            (Table::Participants, _) => {
                if let Some(participant) = decode_record::<participants::Model>(change) {
                    self.upsert_participant(participant);
                }
            }
            (Table::Meetings, ChangeKind::Update) => {
                if let Some(meeting) = decode_record::<meetings::Model>(change) {
                    self.meeting = Some(meeting);
                }
            }
            _ => {}
        }
    }

    /// Applies every change already delivered by the feed. Returns how many were applied.
    pub fn sync(&mut self) -> usize {
        let changes = drain_pending(self.subscription.as_mut());
        for change in &changes {
            self.apply(change);
        }
        changes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notice::NoticeLevel;
    use crate::remote::memory::MemoryRemote;

    fn session(name: &str) -> Session {
        Session::new(Id::new_v4(), format!("{name}@acme.io"), name)
    }

    #[tokio::test]
    async fn create_then_join_from_second_session_yields_two_present_participants() {
        let remote = MemoryRemote::new();
        let mut host = MeetingRoom::new(remote.clone(), session("jane"));
        let mut alice = MeetingRoom::new(remote.clone(), session("alice"));

        let code = host.create("Q4 Planning").await.unwrap();
        host.join(&code, "").await.unwrap();
        alice.join(&code, "Alice").await.unwrap();

        let meeting = host.meeting().unwrap().clone();
        let present: Vec<_> = remote
            .participants()
            .into_iter()
            .filter(|p| p.meeting_id == meeting.id && p.is_present())
            .collect();
        assert_eq!(present.len(), 2);
        assert_eq!(remote.meeting(meeting.id).unwrap().status, MeetingStatus::Active);
        assert!(remote.meeting(meeting.id).unwrap().started_at.is_some());

        host.sync();
        assert_eq!(host.participants().len(), 2);
        assert_eq!(host.participants()[1].name, "Alice");
        assert_eq!(alice.participants().len(), 2);
        assert!(host.is_host());
        assert!(!alice.is_host());
    }

    #[tokio::test]
    async fn rejoining_while_present_does_not_duplicate_the_row() {
        let remote = MemoryRemote::new();
        let mut host = MeetingRoom::new(remote.clone(), session("jane"));

        let code = host.create("Standup").await.unwrap();
        host.join(&code, "Jane").await.unwrap();
        host.join(&code, "Jane").await.unwrap();

        assert_eq!(remote.participants().len(), 1);
    }

    #[tokio::test]
    async fn host_leaving_ends_the_meeting() {
        let remote = MemoryRemote::new();
        let mut host = MeetingRoom::new(remote.clone(), session("jane"));
        let code = host.create("Retro").await.unwrap();
        host.join(&code, "").await.unwrap();
        let meeting_id = host.meeting().unwrap().id;

        host.leave().await.unwrap();

        let meeting = remote.meeting(meeting_id).unwrap();
        assert_eq!(meeting.status, MeetingStatus::Ended);
        assert!(meeting.ended_at.is_some());
        assert!(host.meeting().is_none());
        assert!(host.participants().is_empty());
    }

    #[tokio::test]
    async fn guest_leaving_keeps_the_meeting_running() {
        let remote = MemoryRemote::new();
        let mut host = MeetingRoom::new(remote.clone(), session("jane"));
        let mut alice = MeetingRoom::new(remote.clone(), session("alice"));
        let code = host.create("Retro").await.unwrap();
        host.join(&code, "").await.unwrap();
        alice.join(&code, "Alice").await.unwrap();
        let meeting_id = host.meeting().unwrap().id;

        alice.leave().await.unwrap();

        let meeting = remote.meeting(meeting_id).unwrap();
        assert_eq!(meeting.status, MeetingStatus::Active);
        assert!(meeting.ended_at.is_none());

        host.sync();
        assert_eq!(host.participants().len(), 1);
    }

    #[tokio::test]
    async fn ended_meetings_cannot_be_joined_again() {
        let remote = MemoryRemote::new();
        let mut host = MeetingRoom::new(remote.clone(), session("jane"));
        let code = host.create("Retro").await.unwrap();
        host.join(&code, "").await.unwrap();
        let meeting_id = host.meeting().unwrap().id;
        host.leave().await.unwrap();
        let ended_at = remote.meeting(meeting_id).unwrap().ended_at;

        let result = host.join(&code, "").await;

        assert_eq!(
            result.unwrap_err().entity_kind(),
            Some(&EntityErrorKind::Invalid)
        );
        let meeting = remote.meeting(meeting_id).unwrap();
        assert_eq!(meeting.status, MeetingStatus::Ended);
        assert_eq!(meeting.ended_at, ended_at);
    }

    #[tokio::test]
    async fn toggling_mute_touches_only_the_callers_row() {
        let remote = MemoryRemote::new();
        let mut host = MeetingRoom::new(remote.clone(), session("jane"));
        let mut alice = MeetingRoom::new(remote.clone(), session("alice"));
        let code = host.create("Sync").await.unwrap();
        host.join(&code, "").await.unwrap();
        alice.join(&code, "Alice").await.unwrap();
        let before = remote.participants();

        let updated = alice.toggle_mute().await.unwrap();

        assert!(updated.is_muted);
        let after = remote.participants();
        for (old, new) in before.iter().zip(after.iter()) {
            if new.id == updated.id {
                assert!(new.is_muted);
            } else {
                assert_eq!(old, new);
            }
        }

        host.sync();
        let seen = host
            .participants()
            .iter()
            .find(|p| p.id == updated.id)
            .unwrap();
        assert!(seen.is_muted);
        assert!(!host.me().unwrap().is_muted);
    }

    #[tokio::test]
    async fn unknown_code_reports_meeting_not_found() {
        let remote = MemoryRemote::new();
        let mut room = MeetingRoom::new(remote, session("jane"));

        let result = room.join("nosuchmeeting0000000000000", "Jane").await;

        assert_eq!(
            result.unwrap_err().entity_kind(),
            Some(&EntityErrorKind::NotFound)
        );
        let notice = room.notices().last().unwrap().clone();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.description, "Meeting not found");
    }

    #[tokio::test]
    async fn failed_create_surfaces_a_notice_and_keeps_state() {
        let remote = MemoryRemote::new();
        remote.fail("insert_meeting");
        let mut room = MeetingRoom::new(remote, session("jane"));

        assert!(room.create("Q4 Planning").await.is_err());
        assert!(room.create("   ").await.is_err());

        assert!(room.meeting().is_none());
        let descriptions: Vec<_> = room
            .notices()
            .drain()
            .into_iter()
            .map(|n| n.description)
            .collect();
        assert_eq!(
            descriptions,
            vec!["Failed to create meeting", "Failed to create meeting"]
        );
    }

    #[tokio::test]
    async fn schedule_records_the_planned_time() {
        let remote = MemoryRemote::new();
        let mut room = MeetingRoom::new(remote, session("jane"));

        room.schedule(
            "Board review",
            NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
            NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
        )
        .await
        .unwrap();

        let meeting = room.meeting().unwrap();
        assert_eq!(meeting.status, MeetingStatus::Waiting);
        assert_eq!(
            meeting.scheduled_for.unwrap().to_rfc3339(),
            "2025-03-14T09:30:00+00:00"
        );
    }

    #[tokio::test]
    async fn status_change_is_seen_by_other_viewers() {
        let remote = MemoryRemote::new();
        let mut host = MeetingRoom::new(remote.clone(), session("jane"));
        let mut alice = MeetingRoom::new(remote.clone(), session("alice"));
        let code = host.create("Sync").await.unwrap();
        alice.join(&code, "Alice").await.unwrap();
        assert_eq!(alice.meeting().unwrap().status, MeetingStatus::Waiting);

        host.join(&code, "").await.unwrap();
        alice.sync();

        assert_eq!(alice.meeting().unwrap().status, MeetingStatus::Active);
        assert_eq!(alice.participants().len(), 2);
    }
}
