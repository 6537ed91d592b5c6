//! The append-only transcript of a meeting and the speech-to-text loop that feeds it.

use crate::error::{EntityErrorKind, Error};
use crate::meeting::find_by_code;
use crate::notice::Notices;
use crate::remote::Remote;
use crate::session::Session;
use crate::{decode_record, drain_pending, transcripts, Id};
use async_trait::async_trait;
use events::{ChangeKind, FeedFilter, RowChange, Subscription, Table};
use log::*;
use std::collections::HashMap;
use std::sync::Arc;

/// What a running recognizer reports.
#[derive(Clone, Debug, PartialEq)]
pub enum RecognitionEvent {
    /// Recognized speech. Interim results are superseded by a later final one.
    Result { transcript: String, is_final: bool },
    /// The recognizer failed and stopped.
    Error(String),
    /// The recognizer stopped on its own.
    End,
}

/// A continuous speech recognition session provided by the host platform.
#[async_trait]
pub trait SpeechRecognizer: Send {
    /// Fails when recognition is unsupported or microphone access is denied.
    async fn start(&mut self) -> Result<(), Error>;
    async fn next_event(&mut self) -> RecognitionEvent;
    async fn stop(&mut self);
}

pub struct TranscriptLog {
    remote: Arc<dyn Remote>,
    session: Session,
    meeting_id: Option<Id>,
    entries: Vec<transcripts::Model>,
    /// Display-only rewrites, never written back.
    local_edits: HashMap<Id, String>,
    subscription: Option<Subscription>,
    listening: bool,
    notices: Notices,
}

impl TranscriptLog {
    pub fn new(remote: Arc<dyn Remote>, session: Session) -> Self {
        Self {
            remote,
            session,
            meeting_id: None,
            entries: Vec::new(),
            local_edits: HashMap::new(),
            subscription: None,
            listening: false,
            notices: Notices::default(),
        }
    }

    /// Entries oldest first at load time, then in delivery order.
    pub fn entries(&self) -> &[transcripts::Model] {
        &self.entries
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    pub fn notices(&mut self) -> &mut Notices {
        &mut self.notices
    }

    pub async fn load(&mut self, code: &str) -> Result<(), Error> {
        let meeting = find_by_code(self.remote.as_ref(), code).await?;
        let subscription = self.remote.subscribe(
            FeedFilter::table(Table::Transcripts, meeting.id).kinds([ChangeKind::Insert]),
        );
        let entries = self
            .remote
            .list_transcripts(meeting.id)
            .await
            .inspect_err(|err| warn!("Error loading transcript: {err:?}"))?;

        self.meeting_id = Some(meeting.id);
        self.entries = entries;
        self.local_edits.clear();
        self.subscription = Some(subscription);
        Ok(())
    }

    /// Persists one utterance. Blank content is ignored and returns `Ok(None)`.
    /// The entry shows up locally once its change event is applied.
    pub async fn add_entry(
        &mut self,
        speaker_name: &str,
        content: &str,
    ) -> Result<Option<transcripts::Model>, Error> {
        let content = content.trim();
        if content.is_empty() {
            return Ok(None);
        }
        let meeting_id = self
            .meeting_id
            .ok_or_else(|| Error::entity(EntityErrorKind::NotFound))?;

        let entry = self
            .remote
            .insert_transcript(meeting_id, speaker_name.to_string(), content.to_string())
            .await
            .inspect_err(|err| warn!("Error adding transcript entry: {err:?}"))?;
        Ok(Some(entry))
    }

    /// Text to display for `id`, honoring local edits.
    pub fn display_text(&self, id: Id) -> Option<&str> {
        self.local_edits
            .get(&id)
            .map(String::as_str)
            .or_else(|| {
                self.entries
                    .iter()
                    .find(|e| e.id == id)
                    .map(|e| e.content.as_str())
            })
    }

    /// Rewrites the displayed text of an entry without persisting it.
    pub fn edit_local(&mut self, id: Id, text: &str) -> bool {
        if !self.entries.iter().any(|e| e.id == id) {
            return false;
        }
        self.local_edits.insert(id, text.to_string());
        true
    }

    /// Runs `recognizer` until it ends or fails, persisting every final
    /// utterance under the session's display name. The recognizer is always
    /// stopped before returning. Returns the number of entries written.
    pub async fn listen<R>(&mut self, recognizer: &mut R) -> Result<usize, Error>
    where
        R: SpeechRecognizer + ?Sized,
    {
        if self.meeting_id.is_none() {
            return Err(Error::entity(EntityErrorKind::NotFound));
        }

        if let Err(err) = recognizer.start().await {
            error!("Speech recognition could not start: {err:?}");
            return Err(err);
        }
        self.listening = true;
        debug!("Speech recognition started for {}", self.session.user_id);

        let mut written = 0;
        let outcome = loop {
            match recognizer.next_event().await {
                RecognitionEvent::Result {
                    transcript,
                    is_final: true,
                } => {
                    let speaker = self.session.display_name.clone();
                    match self.add_entry(&speaker, &transcript).await {
                        Ok(Some(_)) => written += 1,
                        Ok(None) => {}
                        // A lost utterance does not end the session.
                        Err(_) => self.notices.error("Failed to save transcript entry"),
                    }
                }
                RecognitionEvent::Result { .. } => {}
                RecognitionEvent::Error(reason) => {
                    error!("Speech recognition error: {reason}");
                    break Err(Error::device(reason));
                }
                RecognitionEvent::End => break Ok(written),
            }
        };

        recognizer.stop().await;
        self.listening = false;
        outcome
    }

    /// Appends a delivered entry to the tail. Entries already held are replaced in place.
    pub fn apply(&mut self, change: &RowChange) {
        if Some(change.meeting_id) != self.meeting_id || change.table != Table::Transcripts {
            return;
        }
        if change.kind != ChangeKind::Insert {
            return;
        }
        let Some(entry) = decode_record::<transcripts::Model>(change) else {
            return;
        };
        match self.entries.iter_mut().find(|e| e.id == entry.id) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn sync(&mut self) -> usize {
        let changes = drain_pending(self.subscription.as_mut());
        for change in &changes {
            self.apply(change);
        }
        changes.len()
    }
}
