//! Screen recording of a meeting.
//!
//! ```text
//! idle --start--> capturing --stop--> idle      (blob uploaded, row written)
//!   |                 |
//!   +--denied---------+--upload/insert fails--> failed
//! ```
//!
//! The whole recording is buffered in memory until stop.

use crate::clock::Clock;
use crate::error::{EntityErrorKind, Error};
use crate::meeting::find_by_code;
use crate::notice::Notices;
use crate::recordings;
use crate::remote::{NewRecording, Remote};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::*;
use std::sync::Arc;

/// A display capture stream with audio, provided by the host platform.
#[async_trait]
pub trait DisplayCapture: Send {
    /// Asks for a screen or tab. Fails when the user declines.
    async fn start(&mut self) -> Result<(), Error>;
    /// Data produced since the previous call.
    async fn take_chunks(&mut self) -> Vec<Vec<u8>>;
    /// Stops every track of the stream.
    async fn stop(&mut self);
}

#[derive(Clone, Debug, PartialEq)]
pub enum RecorderState {
    Idle,
    Capturing {
        meeting_code: String,
        started_at: DateTime<Utc>,
    },
    Failed(String),
}

/// Object path of a recording: `<meeting_code>/<capture start, unix ms>.webm`.
pub fn object_path(meeting_code: &str, started_at: DateTime<Utc>) -> String {
    format!("{meeting_code}/{}.webm", started_at.timestamp_millis())
}

/// Uploads `bytes` and writes the metadata row. Nothing is written when the
/// time span is negative or the meeting is unknown, and the uploaded object
/// is removed again when the row cannot be written.
pub async fn save(
    remote: &dyn Remote,
    meeting_code: &str,
    bytes: Vec<u8>,
    started_at: DateTime<Utc>,
    ended_at: DateTime<Utc>,
) -> Result<recordings::Model, Error> {
    let elapsed_ms = (ended_at - started_at).num_milliseconds();
    if elapsed_ms < 0 {
        warn!("Recording for {meeting_code} ends before it starts");
        return Err(Error::entity(EntityErrorKind::Invalid));
    }
    let duration_seconds =
        i32::try_from(elapsed_ms / 1000).map_err(|_| Error::entity(EntityErrorKind::Invalid))?;

    let meeting = find_by_code(remote, meeting_code).await?;
    let file_path = object_path(&meeting.code, started_at);
    let file_size = remote.upload_recording(&file_path, bytes).await?;

    let inserted = remote
        .insert_recording(
            meeting.id,
            NewRecording {
                file_path: file_path.clone(),
                file_size: file_size as i64,
                duration_seconds,
                started_at,
                ended_at,
            },
        )
        .await;
    let recording = match inserted {
        Ok(recording) => recording,
        Err(err) => {
            warn!("No row written for recording {file_path}, removing the uploaded object");
            if let Err(discard_err) = remote.discard_recording(&file_path).await {
                warn!("Recording {file_path} left orphaned in the bucket: {discard_err:?}");
            }
            return Err(err);
        }
    };

    info!(
        "Saved {}s recording {} ({} bytes)",
        recording.duration_seconds, recording.file_path, recording.file_size
    );
    Ok(recording)
}

pub struct Recorder<C: DisplayCapture> {
    remote: Arc<dyn Remote>,
    capture: C,
    clock: Arc<dyn Clock>,
    state: RecorderState,
    chunks: Vec<Vec<u8>>,
    notices: Notices,
}

impl<C: DisplayCapture> Recorder<C> {
    pub fn new(remote: Arc<dyn Remote>, capture: C, clock: Arc<dyn Clock>) -> Self {
        Self {
            remote,
            capture,
            clock,
            state: RecorderState::Idle,
            chunks: Vec::new(),
            notices: Notices::default(),
        }
    }

    pub fn state(&self) -> &RecorderState {
        &self.state
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.state, RecorderState::Capturing { .. })
    }

    pub fn notices(&mut self) -> &mut Notices {
        &mut self.notices
    }

    pub fn capture(&self) -> &C {
        &self.capture
    }

    pub async fn start(&mut self, meeting_code: Option<&str>) -> Result<(), Error> {
        if self.is_recording() {
            return Ok(());
        }
        let Some(meeting_code) = meeting_code else {
            self.notices.error("No active meeting to record");
            return Err(Error::entity(EntityErrorKind::NotFound));
        };

        if let Err(err) = self.capture.start().await {
            error!("Error starting recording: {err:?}");
            self.state = RecorderState::Failed("capture was not granted".to_string());
            self.notices.error("Failed to start recording");
            return Err(err);
        }

        self.chunks.clear();
        self.state = RecorderState::Capturing {
            meeting_code: meeting_code.to_string(),
            started_at: self.clock.now(),
        };
        self.notices
            .info("Recording Started", "Meeting recording has begun");
        Ok(())
    }

    /// Moves produced data into the buffer, dropping empty chunks.
    pub async fn collect(&mut self) {
        if !self.is_recording() {
            return;
        }
        let chunks = self.capture.take_chunks().await;
        self.chunks
            .extend(chunks.into_iter().filter(|chunk| !chunk.is_empty()));
    }

    /// Stops capturing, then uploads and records the result. Returns
    /// `Ok(None)` when nothing was being recorded.
    pub async fn stop(&mut self) -> Result<Option<recordings::Model>, Error> {
        let RecorderState::Capturing {
            meeting_code,
            started_at,
        } = self.state.clone()
        else {
            return Ok(None);
        };

        // Stopping flushes whatever the capture still holds.
        self.capture.stop().await;
        let ended_at = self.clock.now();
        let trailing = self.capture.take_chunks().await;
        self.chunks
            .extend(trailing.into_iter().filter(|chunk| !chunk.is_empty()));
        let blob = std::mem::take(&mut self.chunks).concat();

        match save(self.remote.as_ref(), &meeting_code, blob, started_at, ended_at).await {
            Ok(recording) => {
                self.state = RecorderState::Idle;
                self.notices.info(
                    "Recording Saved",
                    "Your meeting recording has been saved successfully",
                );
                Ok(Some(recording))
            }
            Err(err) => {
                error!("Error saving recording: {err:?}");
                self.state = RecorderState::Failed(err.to_string());
                self.notices.error("Failed to save recording");
                Err(err)
            }
        }
    }
}
