//! Roomcast - a room-based WebSocket chat relay.
//!
//! A relay server that brokers real-time text messages and presence events
//! between browser clients organized into named rooms, plus a small HTTP
//! API for room listing and health. State is in-memory and process-local:
//! nothing survives a restart, and delivery is best effort, in order per
//! connection.

pub mod adapters;
pub mod config;
pub mod domain;
