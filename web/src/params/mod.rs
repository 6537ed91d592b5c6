//! Typed inputs for the endpoints: request bodies, query strings and path segments.
//!
//! Inputs are checked for shape here; the domain stores validate content
//! (blank titles, unknown parents and so on).

pub(crate) mod meeting;
pub(crate) mod mind_map;
pub(crate) mod recording;
pub(crate) mod transcript;
pub(crate) mod user;
