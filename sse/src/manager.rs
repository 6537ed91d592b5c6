use crate::connection::{ConnectionId, ConnectionRegistry, EventSender, MeetingId, UserId};
use crate::message::{EventType, Message as SseMessage, MessageScope};
use axum::response::sse::Event;
use log::*;
use std::sync::Arc;

pub struct Manager {
    registry: Arc<ConnectionRegistry>,
}

impl Manager {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(ConnectionRegistry::new()),
        }
    }

    /// Register a new connection for a meeting and return its unique ID
    pub fn register_connection(
        &self,
        user_id: UserId,
        meeting_id: MeetingId,
        sender: EventSender,
    ) -> ConnectionId {
        let connection_id = self.registry.register(user_id, meeting_id.clone(), sender);
        info!("Registered new SSE connection for meeting {meeting_id}");
        connection_id
    }

    pub fn unregister_connection(&self, connection_id: &ConnectionId) {
        info!("Unregistering SSE connection {}", connection_id.as_str());
        self.registry.unregister(connection_id);
    }

    /// Send a message based on its scope
    pub fn send_message(&self, message: SseMessage) {
        let event_type = message.event.event_type();

        let event_data = match serde_json::to_string(&message.event) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize SSE event: {e}");
                return;
            }
        };

        let event = Event::default().event(event_type).data(event_data);

        match message.scope {
            MessageScope::Meeting { meeting_id } => {
                self.registry.send_to_meeting(&meeting_id, event);
            }
            MessageScope::User { user_id } => {
                self.registry.send_to_user(&user_id, event);
            }
            MessageScope::Broadcast => {
                self.registry.broadcast(event);
            }
        }
    }

    pub fn meeting_connection_count(&self, meeting_id: &MeetingId) -> usize {
        self.registry.meeting_connection_count(meeting_id)
    }
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}
