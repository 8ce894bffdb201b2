//! Wire protocol for the relay.
//!
//! Defines the closed set of events exchanged with clients:
//! - Client → Server: join, message send, room create/change, typing
//! - Server → Client: room snapshots, message fan-out, presence notices
//!
//! Frames are JSON, adjacently tagged as `{"event": <name>, "data": {...}}`.
//! Event names and payload field spellings are a compatibility contract with
//! the browser presentation layer and must not drift.

use serde::{Deserialize, Serialize};

use super::foundation::{RoomId, Timestamp, Username};
use super::registry::RoomSummary;

// ════════════════════════════════════════════════════════════════════════════════
// Client → Server Events
// ════════════════════════════════════════════════════════════════════════════════

/// All event types that can be received from a client.
///
/// Inbound input is untrusted. Frames that do not deserialize into one of
/// these variants are dropped by the transport layer without a fault;
/// semantic validation (empty names, duplicate usernames) happens in the
/// relay core.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Initial join with a username and target room.
    UserJoin { username: String, room: String },

    /// Chat message to the sender's current room.
    SendMessage { message: String },

    /// Create a new room from a display name.
    CreateRoom {
        #[serde(rename = "roomName")]
        room_name: String,
    },

    /// Move to a different room.
    ChangeRoom {
        #[serde(rename = "newRoom")]
        new_room: String,
    },

    /// Sender started typing.
    TypingStart,

    /// Sender stopped typing.
    TypingStop,
}

// ════════════════════════════════════════════════════════════════════════════════
// Server → Client Events
// ════════════════════════════════════════════════════════════════════════════════

/// All event types that can be sent to a client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Join rejected because the requested username is already present.
    UsernameTaken(Rejection),

    /// Room snapshot sent to a client after a join or room change.
    RoomInfo(RoomInfo),

    /// Chat message fan-out, delivered to every member of the room
    /// including the sender.
    ReceiveMessage(ChatMessage),

    /// A new room was registered; broadcast to every connection.
    RoomCreated(RoomSummary),

    /// A user entered the room.
    UserJoined(PresenceNotice),

    /// A user left the room.
    UserLeft(PresenceNotice),

    /// Typing indicator relayed to the room, excluding the typist.
    UserTyping(TypingNotice),
}

/// Validation rejection surfaced to the originating connection only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rejection {
    pub message: String,
}

/// Snapshot of a room and the full room list, for UI population.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomInfo {
    pub room: RoomId,
    #[serde(rename = "roomName")]
    pub room_name: String,
    pub users: Vec<Username>,
    pub rooms: Vec<RoomSummary>,
}

/// A relayed chat message. Never stored server-side beyond the instant
/// of fan-out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    /// Time-derived id, strictly increasing per process.
    pub id: String,
    pub username: Username,
    pub message: String,
    pub room: RoomId,
    pub timestamp: Timestamp,
    #[serde(rename = "type")]
    pub kind: MessageKind,
}

/// Distinguishes user chat traffic from server-generated notices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Message,
    System,
}

/// Membership change notice, sent to a room when a user joins or leaves.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PresenceNotice {
    pub username: Username,
    pub message: String,
    pub timestamp: Timestamp,
    #[serde(rename = "roomUsers")]
    pub room_users: Vec<Username>,
}

/// Typing indicator with an explicit on/off flag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypingNotice {
    pub username: Username,
    #[serde(rename = "isTyping")]
    pub is_typing: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_event_deserializes_user_join() {
        let json = r#"{"event": "user_join", "data": {"username": "alice", "room": "general"}}"#;
        let event: ClientEvent = serde_json::from_str(json).unwrap();
        match event {
            ClientEvent::UserJoin { username, room } => {
                assert_eq!(username, "alice");
                assert_eq!(room, "general");
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn client_event_deserializes_camel_case_fields() {
        let json = r#"{"event": "create_room", "data": {"roomName": "Board Games"}}"#;
        let event: ClientEvent = serde_json::from_str(json).unwrap();
        assert!(matches!(event, ClientEvent::CreateRoom { room_name } if room_name == "Board Games"));

        let json = r#"{"event": "change_room", "data": {"newRoom": "tech"}}"#;
        let event: ClientEvent = serde_json::from_str(json).unwrap();
        assert!(matches!(event, ClientEvent::ChangeRoom { new_room } if new_room == "tech"));
    }

    #[test]
    fn client_event_deserializes_bare_typing_events() {
        let start: ClientEvent = serde_json::from_str(r#"{"event": "typing_start"}"#).unwrap();
        assert!(matches!(start, ClientEvent::TypingStart));

        let stop: ClientEvent = serde_json::from_str(r#"{"event": "typing_stop"}"#).unwrap();
        assert!(matches!(stop, ClientEvent::TypingStop));
    }

    #[test]
    fn client_event_rejects_unknown_event_names() {
        let result = serde_json::from_str::<ClientEvent>(r#"{"event": "shutdown"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn client_event_rejects_missing_fields() {
        let result = serde_json::from_str::<ClientEvent>(r#"{"event": "user_join", "data": {}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn server_event_serializes_with_event_tag() {
        let event = ServerEvent::UsernameTaken(Rejection {
            message: "Username is already taken".to_string(),
        });

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""event":"username_taken""#));
        assert!(json.contains(r#""message":"Username is already taken""#));
    }

    #[test]
    fn chat_message_serializes_wire_field_names() {
        let event = ServerEvent::ReceiveMessage(ChatMessage {
            id: "1730000000000".to_string(),
            username: Username::parse("alice").unwrap(),
            message: "hi **bob**".to_string(),
            room: RoomId::new("general"),
            timestamp: Timestamp::now(),
            kind: MessageKind::Message,
        });

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""event":"receive_message""#));
        assert!(json.contains(r#""type":"message""#));
        assert!(json.contains(r#""message":"hi **bob**""#));
    }

    #[test]
    fn presence_notice_serializes_room_users_field() {
        let event = ServerEvent::UserJoined(PresenceNotice {
            username: Username::parse("bob").unwrap(),
            message: "bob joined the room".to_string(),
            timestamp: Timestamp::now(),
            room_users: vec![
                Username::parse("alice").unwrap(),
                Username::parse("bob").unwrap(),
            ],
        });

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""event":"user_joined""#));
        assert!(json.contains(r#""roomUsers":["alice","bob"]"#));
    }

    #[test]
    fn typing_notice_serializes_is_typing_flag() {
        let event = ServerEvent::UserTyping(TypingNotice {
            username: Username::parse("alice").unwrap(),
            is_typing: true,
        });

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""event":"user_typing""#));
        assert!(json.contains(r#""isTyping":true"#));
    }
}
