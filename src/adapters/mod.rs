//! Adapters - transport and API surfaces around the relay core.
//!
//! - `websocket` - connection hub and socket lifecycle handling
//! - `http` - room listing and health endpoints

pub mod http;
pub mod websocket;

pub use http::api_router;
pub use websocket::{websocket_router, ConnectionHub, RelayState};
