//! WebSocket adapter - the transport behind the relay.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                     handler                             │
//! │   upgrade → socket loop → parse frames → relay mutex    │
//! └─────────────────────────────────────────────────────────┘
//!                             │ effects
//!                             ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                    ConnectionHub                        │
//! │   Group: general      Group: tech      Group: music     │
//! │   ├── client-a        ├── client-d     └── client-f     │
//! │   ├── client-b        └── client-e                      │
//! │   └── client-c                                          │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`hub`] - Per-client channels and room groups (group addressing)
//! - [`handler`] - Axum WebSocket upgrade handler and socket loop

pub mod handler;
pub mod hub;

pub use handler::{websocket_router, ws_handler, RelayState};
pub use hub::ConnectionHub;
