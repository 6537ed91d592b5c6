use events::{ChangeKind, Table};
use serde::Serialize;
use serde_json::Value;

/// Trait for getting the SSE event type name
pub trait EventType {
    fn event_type(&self) -> String;
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    /// A row belonging to the meeting changed. `record` is the row after the
    /// change (before it, for deletes).
    #[serde(rename = "change")]
    Change {
        table: Table,
        kind: ChangeKind,
        meeting_id: String,
        record_id: String,
        record: Value,
    },
}

impl EventType for Event {
    // e.g. "participants:update", so browsers can listen per table
    fn event_type(&self) -> String {
        match self {
            Event::Change { table, kind, .. } => format!("{table}:{kind}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Message {
    pub event: Event,
    pub scope: MessageScope,
}

#[derive(Debug, Clone)]
pub enum MessageScope {
    /// Send to every connection watching a meeting
    Meeting { meeting_id: String },
    /// Send to all connections for a specific user
    User { user_id: String },
    /// Send to all connected users
    Broadcast,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn change_events_are_named_after_table_and_kind() {
        let event = Event::Change {
            table: Table::ActionItems,
            kind: ChangeKind::Update,
            meeting_id: "m".into(),
            record_id: "r".into(),
            record: json!({"status": "completed"}),
        };

        assert_eq!(event.event_type(), "action_items:update");
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "type": "change",
                "data": {
                    "table": "action_items",
                    "kind": "update",
                    "meeting_id": "m",
                    "record_id": "r",
                    "record": {"status": "completed"}
                }
            })
        );
    }
}
