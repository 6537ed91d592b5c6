//! User-facing notification banners raised by the stores.
//!
//! A failed action is reported once here and once as the returned `Err`.
//! The web layer drops notices; an interactive client drains and shows them.

use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub description: String,
}

#[derive(Clone, Debug, Default)]
pub struct Notices {
    pending: Vec<Notice>,
}

impl Notices {
    pub fn info(&mut self, title: impl Into<String>, description: impl Into<String>) {
        self.pending.push(Notice {
            level: NoticeLevel::Info,
            title: title.into(),
            description: description.into(),
        });
    }

    pub fn error(&mut self, description: impl Into<String>) {
        self.pending.push(Notice {
            level: NoticeLevel::Error,
            title: "Error".to_string(),
            description: description.into(),
        });
    }

    pub fn last(&self) -> Option<&Notice> {
        self.pending.last()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Removes and returns every pending notice, oldest first.
    pub fn drain(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_empties_the_queue_in_order() {
        let mut notices = Notices::default();
        notices.info("Meeting Created", "Meeting code: abc");
        notices.error("Failed to join meeting");

        let drained = notices.drain();

        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].level, NoticeLevel::Info);
        assert_eq!(drained[1].title, "Error");
        assert!(notices.is_empty());
    }
}
