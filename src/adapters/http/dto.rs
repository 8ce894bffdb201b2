//! HTTP DTOs for the room and health endpoints.
//!
//! The API is read-only, so we only have response DTOs.

use serde::Serialize;

use crate::domain::foundation::{RoomId, Timestamp};
use crate::domain::registry::Room;

/// Listing entry for `GET /api/rooms`.
#[derive(Debug, Clone, Serialize)]
pub struct RoomDetail {
    pub id: RoomId,
    pub name: String,
    #[serde(rename = "userCount")]
    pub user_count: usize,
    pub created: Timestamp,
}

impl RoomDetail {
    pub fn from_room(room: &Room) -> Self {
        Self {
            id: room.id().clone(),
            name: room.name().to_string(),
            user_count: room.member_count(),
            created: room.created(),
        }
    }
}

/// Response for `GET /api/health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Joined connection count.
    pub users: usize,
    /// Registered room count.
    pub rooms: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_response_serializes_wire_shape() {
        let json = serde_json::to_string(&HealthResponse {
            status: "OK",
            users: 3,
            rooms: 5,
        })
        .unwrap();

        assert!(json.contains(r#""status":"OK""#));
        assert!(json.contains(r#""users":3"#));
        assert!(json.contains(r#""rooms":5"#));
    }

    #[test]
    fn room_detail_serializes_user_count_field() {
        let mut registry = crate::domain::registry::RoomRegistry::with_default_rooms();
        registry.add_member(
            &RoomId::new("general"),
            crate::domain::foundation::Username::parse("alice").unwrap(),
        );

        let general = registry.get(&RoomId::new("general")).unwrap();
        let json = serde_json::to_string(&RoomDetail::from_room(general)).unwrap();

        assert!(json.contains(r#""id":"general""#));
        assert!(json.contains(r#""name":"General""#));
        assert!(json.contains(r#""userCount":1"#));
        assert!(json.contains(r#""created":"#));
    }
}
