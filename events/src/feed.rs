//! In-process broadcast of row changes.
//!
//! Delivery is best effort: a subscriber that falls more than the channel
//! capacity behind loses the oldest changes and keeps going.

use crate::{ChangeKind, DomainEvent, EventHandler, Id, RowChange, Table};
use async_trait::async_trait;
use log::*;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

pub const DEFAULT_FEED_CAPACITY: usize = 1024;

/// Selects which changes a [`Subscription`] yields.
#[derive(Clone, Debug, PartialEq)]
pub struct FeedFilter {
    tables: Vec<Table>,
    kinds: Vec<ChangeKind>,
    meeting_id: Option<Id>,
}

impl FeedFilter {
    /// Every change to `table` within one meeting.
    pub fn table(table: Table, meeting_id: Id) -> Self {
        Self {
            tables: vec![table],
            kinds: vec![ChangeKind::Insert, ChangeKind::Update, ChangeKind::Delete],
            meeting_id: Some(meeting_id),
        }
    }

    /// Every change to every table within one meeting.
    pub fn meeting(meeting_id: Id) -> Self {
        Self {
            tables: Vec::new(),
            kinds: vec![ChangeKind::Insert, ChangeKind::Update, ChangeKind::Delete],
            meeting_id: Some(meeting_id),
        }
    }

    /// Restricts the filter to the given change kinds.
    pub fn kinds(mut self, kinds: impl IntoIterator<Item = ChangeKind>) -> Self {
        self.kinds = kinds.into_iter().collect();
        self
    }

    pub fn matches(&self, change: &RowChange) -> bool {
        (self.tables.is_empty() || self.tables.contains(&change.table))
            && self.kinds.contains(&change.kind)
            && self.meeting_id.map_or(true, |id| id == change.meeting_id)
    }
}

#[derive(Clone, Debug)]
pub struct ChangeFeed {
    sender: broadcast::Sender<RowChange>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self, filter: FeedFilter) -> Subscription {
        debug!("Opening change feed subscription: {filter:?}");
        Subscription {
            receiver: self.sender.subscribe(),
            filter,
        }
    }

    pub fn publish(&self, change: RowChange) {
        trace!(
            "Feeding {} {} for meeting {}",
            change.table,
            change.kind,
            change.meeting_id
        );
        // No receivers is not an error, nobody is looking at this meeting.
        let _ = self.sender.send(change);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_CAPACITY)
    }
}

#[async_trait]
impl EventHandler for ChangeFeed {
    async fn handle(&self, event: &DomainEvent) {
        match event {
            DomainEvent::RowChanged(change) => self.publish(change.clone()),
        }
    }
}

/// A filtered view of the feed. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    receiver: broadcast::Receiver<RowChange>,
    filter: FeedFilter,
}

impl Subscription {
    /// Waits for the next matching change. Returns `None` once the feed is gone.
    pub async fn next(&mut self) -> Option<RowChange> {
        loop {
            match self.receiver.recv().await {
                Ok(change) if self.filter.matches(&change) => return Some(change),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Change feed subscriber lagged, {skipped} changes were dropped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Returns the next matching change that is already queued, if any.
    pub fn try_next(&mut self) -> Option<RowChange> {
        loop {
            match self.receiver.try_recv() {
                Ok(change) if self.filter.matches(&change) => return Some(change),
                Ok(_) => continue,
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!("Change feed subscriber lagged, {skipped} changes were dropped");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    pub fn filter(&self) -> &FeedFilter {
        &self.filter
    }
}
