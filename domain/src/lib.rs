//! This module re-exports various items from the `entity_api` crate.
//!
//! The purpose of this re-export is to ensure that consumers of the `domain` crate do not need to
//! directly depend on the `entity_api` crate. By re-exporting these items, we provide a clear and
//! consistent interface for working with update maps within the domain layer, while encapsulating
//! the underlying implementation details remain in the `entity_api` crate.
pub use entity_api::mutate::{IntoUpdateMap, UpdateMap};

// Re-exports from `entity` crate via `entity_api`
pub use entity_api::{
    action_items, meetings, mind_maps, participants, recordings, transcripts, users, Id,
};

pub use entity::{
    action_item_priority::Priority, action_item_status::ActionItemStatus,
    meeting_status::MeetingStatus, mind_map_document, presence_status::PresenceStatus,
};

pub mod action_item;
pub mod clock;
pub mod code;
pub mod dashboard;
pub mod error;
pub mod export;
pub mod meeting;
pub mod mind_map;
pub mod notice;
pub mod recording;
pub mod remote;
pub mod session;
pub mod transcript;
pub mod user;

pub use session::Session;

use events::{RowChange, Subscription};
use log::warn;
use serde::de::DeserializeOwned;

/// Decodes the row carried by a change event.
pub(crate) fn decode_record<M: DeserializeOwned>(change: &RowChange) -> Option<M> {
    match serde_json::from_value(change.record.clone()) {
        Ok(model) => Some(model),
        Err(e) => {
            warn!(
                "Ignoring undecodable {} {} for record {}: {e}",
                change.table, change.kind, change.record_id
            );
            None
        }
    }
}

/// Takes every change the subscription has already received.
pub(crate) fn drain_pending(subscription: Option<&mut Subscription>) -> Vec<RowChange> {
    let mut changes = Vec::new();
    if let Some(subscription) = subscription {
        while let Some(change) = subscription.try_next() {
            changes.push(change);
        }
    }
    changes
}
