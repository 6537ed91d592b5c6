use crate::message::{Event as SseEvent, Message as SseMessage, MessageScope};
use crate::Manager;
use async_trait::async_trait;
use events::{DomainEvent, EventHandler};
use log::*;
use std::sync::Arc;

/// Converts domain events into SSE messages scoped to the affected meeting.
pub struct SseDomainEventHandler {
    sse_manager: Arc<Manager>,
}

impl SseDomainEventHandler {
    pub fn new(sse_manager: Arc<Manager>) -> Self {
        Self { sse_manager }
    }
}

#[async_trait]
impl EventHandler for SseDomainEventHandler {
    async fn handle(&self, event: &DomainEvent) {
        match event {
            DomainEvent::RowChanged(change) => {
                let meeting_id = change.meeting_id.to_string();
                debug!(
                    "Sending {} {} to {} connection(s) of meeting {meeting_id}",
                    change.table,
                    change.kind,
                    self.sse_manager.meeting_connection_count(&meeting_id)
                );

                self.sse_manager.send_message(SseMessage {
                    event: SseEvent::Change {
                        table: change.table,
                        kind: change.kind,
                        meeting_id: meeting_id.clone(),
                        record_id: change.record_id.to_string(),
                        record: change.record.clone(),
                    },
                    scope: MessageScope::Meeting { meeting_id },
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use events::{RowChange, Table};
    use tokio::sync::mpsc::unbounded_channel;

    #[tokio::test]
    async fn row_changes_are_forwarded_to_the_meeting_connections() {
        let manager = Arc::new(Manager::new());
        let meeting_id = events::Id::new_v4();
        let (tx, mut rx) = unbounded_channel();
        manager.register_connection("alice".into(), meeting_id.to_string(), tx);
        let (other_tx, mut other_rx) = unbounded_channel();
        manager.register_connection("bob".into(), events::Id::new_v4().to_string(), other_tx);

        let handler = SseDomainEventHandler::new(manager.clone());
        handler
            .handle(&DomainEvent::RowChanged(RowChange::insert(
                Table::Participants,
                meeting_id,
                events::Id::new_v4(),
                serde_json::json!({"name": "Alice"}),
            )))
            .await;

        assert!(rx.try_recv().is_ok());
        assert!(other_rx.try_recv().is_err());
    }
}
