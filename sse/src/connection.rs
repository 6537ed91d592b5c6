use axum::response::sse::Event;
use dashmap::DashMap;
use log::*;
use std::collections::HashSet;
use std::convert::Infallible;
use tokio::sync::mpsc::UnboundedSender;

// Ids cross this crate as strings; the web layer converts domain::Id.
pub type UserId = String;
pub type MeetingId = String;

pub type EventSender = UnboundedSender<Result<Event, Infallible>>;

/// Unique identifier for a connection (server-generated)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    pub user_id: UserId,
    pub meeting_id: MeetingId,
    pub sender: EventSender,
}

/// Connection registry with secondary indices by user and by meeting.
pub struct ConnectionRegistry {
    connections: DashMap<ConnectionId, ConnectionInfo>,
    user_index: DashMap<UserId, HashSet<ConnectionId>>,
    meeting_index: DashMap<MeetingId, HashSet<ConnectionId>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            user_index: DashMap::new(),
            meeting_index: DashMap::new(),
        }
    }

    pub fn register(
        &self,
        user_id: UserId,
        meeting_id: MeetingId,
        sender: EventSender,
    ) -> ConnectionId {
        let connection_id = ConnectionId::new();

        self.connections.insert(
            connection_id.clone(),
            ConnectionInfo {
                user_id: user_id.clone(),
                meeting_id: meeting_id.clone(),
                sender,
            },
        );

        self.user_index
            .entry(user_id)
            .or_default()
            .insert(connection_id.clone());
        self.meeting_index
            .entry(meeting_id)
            .or_default()
            .insert(connection_id.clone());

        connection_id
    }

    pub fn unregister(&self, connection_id: &ConnectionId) {
        if let Some((_, info)) = self.connections.remove(connection_id) {
            remove_from_index(&self.user_index, &info.user_id, connection_id);
            remove_from_index(&self.meeting_index, &info.meeting_id, connection_id);
        }
    }

    pub fn send_to_user(&self, user_id: &UserId, event: Event) {
        if let Some(connection_ids) = self.user_index.get(user_id) {
            self.send_to_connections(connection_ids.iter(), event);
        }
    }

    pub fn send_to_meeting(&self, meeting_id: &MeetingId, event: Event) {
        if let Some(connection_ids) = self.meeting_index.get(meeting_id) {
            self.send_to_connections(connection_ids.iter(), event);
        }
    }

    pub fn broadcast(&self, event: Event) {
        for entry in self.connections.iter() {
            if let Err(e) = entry.value().sender.send(Ok(event.clone())) {
                warn!(
                    "Failed to send broadcast to connection {}: {}",
                    entry.key().as_str(),
                    e
                );
            }
        }
    }

    pub fn meeting_connection_count(&self, meeting_id: &MeetingId) -> usize {
        self.meeting_index
            .get(meeting_id)
            .map_or(0, |connection_ids| connection_ids.len())
    }

    fn send_to_connections<'a>(
        &self,
        connection_ids: impl Iterator<Item = &'a ConnectionId>,
        event: Event,
    ) {
        for conn_id in connection_ids {
            if let Some(info) = self.connections.get(conn_id) {
                if let Err(e) = info.sender.send(Ok(event.clone())) {
                    warn!(
                        "Failed to send event to connection {}: {}. Connection will be cleaned up.",
                        conn_id.as_str(),
                        e
                    );
                }
            }
        }
    }
}

fn remove_from_index(
    index: &DashMap<String, HashSet<ConnectionId>>,
    key: &String,
    connection_id: &ConnectionId,
) {
    if let Some(mut entry) = index.get_mut(key) {
        entry.remove(connection_id);

        if entry.is_empty() {
            drop(entry); // Release lock before removal
            index.remove(key);
        }
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::unbounded_channel;

    #[test]
    fn send_to_meeting_reaches_only_that_meeting() {
        let registry = ConnectionRegistry::new();
        let (alice_tx, mut alice_rx) = unbounded_channel();
        let (bob_tx, mut bob_rx) = unbounded_channel();
        registry.register("alice".into(), "meeting-a".into(), alice_tx);
        registry.register("bob".into(), "meeting-b".into(), bob_tx);

        registry.send_to_meeting(&"meeting-a".to_string(), Event::default().data("hi"));

        assert!(alice_rx.try_recv().is_ok());
        assert!(bob_rx.try_recv().is_err());
    }

    #[test]
    fn unregister_cleans_up_both_indices() {
        let registry = ConnectionRegistry::new();
        let (tx, _rx) = unbounded_channel();
        let connection_id = registry.register("alice".into(), "meeting-a".into(), tx);
        assert_eq!(registry.meeting_connection_count(&"meeting-a".to_string()), 1);

        registry.unregister(&connection_id);

        assert_eq!(registry.meeting_connection_count(&"meeting-a".to_string()), 0);
        assert!(registry.user_index.is_empty());
        assert!(registry.connections.is_empty());
    }
}
