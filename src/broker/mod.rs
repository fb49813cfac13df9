//! The `broker` module routes published messages to subscribers.
//!
//! - `topic`: wildcard matching, pattern/topic validation and the
//!   per-pattern subscription entry.
//! - `message`: the immutable `Envelope` built for every publish.
//! - `engine`: the `Broker` itself.

pub mod engine;
pub mod message;
pub mod topic;

pub use engine::Broker;
pub use message::{Envelope, Payload};
pub use topic::{ClientId, find_matching_patterns, matches};
