//! HTTP routes for the relay's API endpoints.

use axum::routing::get;
use axum::Router;

use crate::adapters::websocket::RelayState;

use super::handlers::{health, list_rooms};

/// Creates the API router.
pub fn api_router() -> Router<RelayState> {
    Router::new()
        .route("/api/rooms", get(list_rooms))
        .route("/api/health", get(health))
}
