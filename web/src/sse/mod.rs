//! SSE HTTP handler for the web layer.
//!
//! The connection registry and the translation of row changes into SSE
//! messages live in the `sse` crate; this module only serves the stream.

pub mod handler;
