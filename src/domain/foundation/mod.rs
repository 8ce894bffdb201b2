//! Foundation module - Shared domain primitives.
//!
//! Contains the value objects and identifiers that form the vocabulary of
//! the relay: connection handles, room ids, usernames, and timestamps.

mod ids;
mod timestamp;

pub use ids::{ClientId, RoomId, Username};
pub use timestamp::Timestamp;
