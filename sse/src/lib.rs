//! Server-Sent Events (SSE) fan-out of meeting row changes.
//!
//! Browsers on the call page open one SSE connection per meeting. Every
//! committed write to a meeting table reaches the [`SseDomainEventHandler`]
//! as a [`events::DomainEvent`], which turns it into a `change` event and
//! routes it to all connections registered for that meeting.
//!
//! Events are ephemeral: a viewer that is not connected misses them and sees
//! fresh data on the next full load.
//!
//! # Modules
//!
//! - `connection`: ConnectionRegistry with per-user and per-meeting indices
//! - `manager`: High-level message routing (delegates to ConnectionRegistry)
//! - `message`: Event and scope definitions
//! - `domain_event_handler`: Bridges the event publisher to the manager

pub mod connection;
pub mod domain_event_handler;
pub mod manager;
pub mod message;

pub use domain_event_handler::SseDomainEventHandler;
pub use manager::Manager;
