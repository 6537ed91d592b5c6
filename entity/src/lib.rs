use uuid::Uuid;

pub mod prelude;

// Core entities
pub mod action_items;
pub mod meetings;
pub mod mind_maps;
pub mod participants;
pub mod recordings;
pub mod transcripts;
pub mod users;

// Column value types
pub mod action_item_priority;
pub mod action_item_status;
pub mod meeting_status;
pub mod mind_map_document;
pub mod presence_status;

/// A type alias that represents any Entity's internal id field data type.
/// Aliased so that it's easy to change the underlying type if necessary.
pub type Id = Uuid;
