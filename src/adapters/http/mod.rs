//! HTTP adapter - REST endpoints for UI polling.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::{HealthResponse, RoomDetail};
pub use routes::api_router;
