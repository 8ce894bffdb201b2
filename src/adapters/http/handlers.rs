//! HTTP handlers for the room listing and health endpoints.
//!
//! Both read through the relay's mutex; neither mutates state, so they
//! only contend with event handling for the duration of a snapshot.

use axum::extract::State;
use axum::Json;

use crate::adapters::websocket::RelayState;

use super::dto::{HealthResponse, RoomDetail};

/// `GET /api/rooms` - full registry snapshot with creation times.
pub async fn list_rooms(State(state): State<RelayState>) -> Json<Vec<RoomDetail>> {
    let relay = state.relay.lock().await;
    let mut rooms: Vec<RoomDetail> = relay.registry().iter().map(RoomDetail::from_room).collect();
    rooms.sort_by(|a, b| a.id.cmp(&b.id));
    Json(rooms)
}

/// `GET /api/health` - liveness plus user/room counts.
pub async fn health(State(state): State<RelayState>) -> Json<HealthResponse> {
    let relay = state.relay.lock().await;
    Json(HealthResponse {
        status: "OK",
        users: relay.connected_users(),
        rooms: relay.registry().len(),
    })
}
