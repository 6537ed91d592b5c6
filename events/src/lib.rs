//! Change-event infrastructure for meeting_hub.
//!
//! Every successful write to a meeting table is described by a [`RowChange`]
//! and published as a [`DomainEvent`]. Handlers registered on the
//! [`EventPublisher`] fan those changes out: the in-process [`ChangeFeed`]
//! feeds the domain stores, and the SSE handler pushes them to browsers.
//!
//! This crate has no dependencies on internal crates (entity, domain, etc.),
//! avoiding circular dependencies. Row data is carried as serialized JSON values.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

mod feed;

pub use feed::{ChangeFeed, FeedFilter, Subscription, DEFAULT_FEED_CAPACITY};

/// A type alias that represents any Entity's internal id field data type.
/// This matches the definition in the entity crate to maintain compatibility.
pub type Id = Uuid;

/// Tables that emit change events. All of them hang off a meeting row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Meetings,
    Participants,
    Transcripts,
    ActionItems,
    MindMaps,
    Recordings,
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Table::Meetings => "meetings",
            Table::Participants => "participants",
            Table::Transcripts => "transcripts",
            Table::ActionItems => "action_items",
            Table::MindMaps => "mind_maps",
            Table::Recordings => "recordings",
        };
        write!(f, "{name}")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChangeKind::Insert => "insert",
            ChangeKind::Update => "update",
            ChangeKind::Delete => "delete",
        };
        write!(f, "{name}")
    }
}

/// One row-level change. `record` is the full row after the change, or the
/// row as it was before a delete.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RowChange {
    pub table: Table,
    pub kind: ChangeKind,
    /// Owning meeting. For the meetings table this is the row's own id.
    pub meeting_id: Id,
    pub record_id: Id,
    pub record: Value,
}

impl RowChange {
    pub fn insert(table: Table, meeting_id: Id, record_id: Id, record: Value) -> Self {
        Self {
            table,
            kind: ChangeKind::Insert,
            meeting_id,
            record_id,
            record,
        }
    }

    pub fn update(table: Table, meeting_id: Id, record_id: Id, record: Value) -> Self {
        Self {
            table,
            kind: ChangeKind::Update,
            meeting_id,
            record_id,
            record,
        }
    }

    pub fn delete(table: Table, meeting_id: Id, record_id: Id, record: Value) -> Self {
        Self {
            table,
            kind: ChangeKind::Delete,
            meeting_id,
            record_id,
            record,
        }
    }
}

/// Domain events that represent business-level changes in the system.
/// These events are emitted after the underlying write has committed.
#[derive(Debug, Clone)]
pub enum DomainEvent {
    /// A row in one of the meeting tables was inserted, updated or deleted.
    RowChanged(RowChange),
}

impl DomainEvent {
    pub fn meeting_id(&self) -> Id {
        match self {
            DomainEvent::RowChanged(change) => change.meeting_id,
        }
    }
}

/// Trait for handling domain events.
/// Implementations can perform side effects like sending notifications,
/// updating caches, logging, etc.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &DomainEvent);
}

/// Publishes domain events to registered handlers.
/// Handlers are called sequentially in registration order.
#[derive(Clone)]
pub struct EventPublisher {
    handlers: Arc<Vec<Arc<dyn EventHandler>>>,
}

impl EventPublisher {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Vec::new()),
        }
    }

    /// Register a new event handler.
    /// Note: This creates a new publisher instance with the additional handler.
    /// Store the returned publisher in your application state.
    pub fn with_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        let mut handlers = (*self.handlers).clone();
        handlers.push(handler);
        self.handlers = Arc::new(handlers);
        self
    }

    pub async fn publish(&self, event: DomainEvent) {
        for handler in self.handlers.iter() {
            handler.handle(&event).await;
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<Id>>,
    }

    #[async_trait]
    impl EventHandler for Recorder {
        async fn handle(&self, event: &DomainEvent) {
            self.seen.lock().unwrap().push(event.meeting_id());
        }
    }

    #[tokio::test]
    async fn publish_reaches_every_registered_handler_in_order() {
        let first = Arc::new(Recorder::default());
        let second = Arc::new(Recorder::default());
        let publisher = EventPublisher::new()
            .with_handler(first.clone())
            .with_handler(second.clone());

        let meeting_id = Id::new_v4();
        publisher
            .publish(DomainEvent::RowChanged(RowChange::insert(
                Table::Transcripts,
                meeting_id,
                Id::new_v4(),
                serde_json::json!({"content": "hello"}),
            )))
            .await;

        assert_eq!(*first.seen.lock().unwrap(), vec![meeting_id]);
        assert_eq!(*second.seen.lock().unwrap(), vec![meeting_id]);
    }

    #[test]
    fn table_names_match_the_database() {
        assert_eq!(Table::ActionItems.to_string(), "action_items");
        assert_eq!(
            serde_json::to_value(Table::MindMaps).unwrap(),
            serde_json::json!("mind_maps")
        );
    }
}
