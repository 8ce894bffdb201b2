//! Relay core - the per-event state machine driving rooms and presence.
//!
//! Each connection moves through two states:
//!
//! ```text
//! Unjoined ──user_join (name free)──▶ Joined ──disconnect──▶ gone
//!     │                                 │
//!     └──user_join (name taken)──┐      ├── send_message / change_room /
//!        stays Unjoined ◀────────┘      │   typing_start / typing_stop
//!                                       ▼
//!                                  (room membership mutates)
//! ```
//!
//! The relay owns the [`RoomRegistry`] and [`PresenceTable`] and performs no
//! I/O: handling an inbound event mutates the two maps and returns a list of
//! [`Effect`]s for the transport to apply - group subscriptions and outbound
//! events addressed to a [`Scope`]. Events that fail a precondition (a frame
//! from a connection that never joined, a blank name, a stale reference) are
//! dropped by returning no effects; nothing in this module is a fatal error.
//!
//! Callers must serialize access: one event runs to completion before the
//! next. The server wraps the relay in a single async mutex for this.

use super::events::{
    ChatMessage, ClientEvent, MessageKind, PresenceNotice, Rejection, RoomInfo, ServerEvent,
    TypingNotice,
};
use super::foundation::{ClientId, RoomId, Timestamp, Username};
use super::presence::PresenceTable;
use super::registry::{RoomRegistry, RoomSummary};

/// Delivery scope for an outbound event.
#[derive(Debug, Clone, PartialEq)]
pub enum Scope {
    /// One connection.
    Client(ClientId),
    /// Every connection subscribed to a room.
    Room(RoomId),
    /// Every connection subscribed to a room except one.
    RoomExcept(RoomId, ClientId),
    /// Every live connection, joined or not.
    All,
}

/// A transport directive produced by event handling.
///
/// Effects are applied in order: subscription changes first affect which
/// connections later `Send` effects in the same batch reach.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Tag the connection with a room's group label.
    Subscribe { client: ClientId, room: RoomId },
    /// Remove the connection's group label for a room.
    Unsubscribe { client: ClientId, room: RoomId },
    /// Emit an event to a scope.
    Send { scope: Scope, event: ServerEvent },
}

impl Effect {
    fn send(scope: Scope, event: ServerEvent) -> Self {
        Self::Send { scope, event }
    }
}

/// The relay: registry + presence + message id sequencing.
#[derive(Debug)]
pub struct Relay {
    registry: RoomRegistry,
    presence: PresenceTable,
    last_message_id: u64,
}

impl Relay {
    /// Creates a relay with the starter rooms registered.
    pub fn new() -> Self {
        Self {
            registry: RoomRegistry::with_default_rooms(),
            presence: PresenceTable::new(),
            last_message_id: 0,
        }
    }

    /// Read access to the room registry, for the HTTP surface.
    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    /// Read access to the presence table.
    pub fn presence(&self) -> &PresenceTable {
        &self.presence
    }

    /// Number of live joined connections.
    pub fn connected_users(&self) -> usize {
        self.presence.len()
    }

    /// Handles one inbound event from a connection, mutating state and
    /// returning the transport effects to apply.
    pub fn handle_event(&mut self, client: ClientId, event: ClientEvent) -> Vec<Effect> {
        match event {
            ClientEvent::UserJoin { username, room } => self.user_join(client, &username, &room),
            ClientEvent::SendMessage { message } => self.send_message(client, message),
            ClientEvent::CreateRoom { room_name } => self.create_room(&room_name),
            ClientEvent::ChangeRoom { new_room } => self.change_room(client, &new_room),
            ClientEvent::TypingStart => self.typing(client, true),
            ClientEvent::TypingStop => self.typing(client, false),
        }
    }

    /// Handles a connection closing. Emits a leave notice to the former
    /// room for joined connections; silent for unjoined ones.
    pub fn handle_disconnect(&mut self, client: ClientId) -> Vec<Effect> {
        let Some(presence) = self.presence.unregister(&client) else {
            return Vec::new();
        };
        let username = presence.username().clone();
        let room = presence.room().clone();

        self.registry.remove_member(&room, &username);

        vec![Effect::send(
            Scope::Room(room.clone()),
            ServerEvent::UserLeft(self.presence_notice(&username, &room, "left")),
        )]
    }

    fn user_join(&mut self, client: ClientId, username: &str, room: &str) -> Vec<Effect> {
        // A join from an already-joined connection is out of protocol.
        if self.presence.lookup(&client).is_some() {
            return Vec::new();
        }
        let Some(username) = Username::parse(username) else {
            return Vec::new();
        };
        let room = room.trim();
        if room.is_empty() {
            return Vec::new();
        }
        let room = RoomId::new(room);

        if self.presence.find_by_username(&username).is_some() {
            return vec![Effect::send(
                Scope::Client(client),
                ServerEvent::UsernameTaken(Rejection {
                    message: "Username is already taken".to_string(),
                }),
            )];
        }

        let mut effects = Vec::new();
        self.ensure_room(&room, &mut effects);
        self.registry.add_member(&room, username.clone());
        self.presence.register(client, username.clone(), room.clone());

        effects.push(Effect::Subscribe {
            client,
            room: room.clone(),
        });
        effects.push(Effect::send(
            Scope::RoomExcept(room.clone(), client),
            ServerEvent::UserJoined(self.presence_notice(&username, &room, "joined")),
        ));
        effects.push(Effect::send(
            Scope::Client(client),
            ServerEvent::RoomInfo(self.room_info(&room)),
        ));
        effects
    }

    fn send_message(&mut self, client: ClientId, message: String) -> Vec<Effect> {
        let Some(presence) = self.presence.lookup(&client) else {
            return Vec::new();
        };
        if message.trim().is_empty() {
            return Vec::new();
        }
        let username = presence.username().clone();
        let room = presence.room().clone();
        let id = self.next_message_id();

        // The body is relayed literally; formatting is a presentation
        // concern.
        vec![Effect::send(
            Scope::Room(room.clone()),
            ServerEvent::ReceiveMessage(ChatMessage {
                id: id.to_string(),
                username,
                message,
                room,
                timestamp: Timestamp::now(),
                kind: MessageKind::Message,
            }),
        )]
    }

    fn create_room(&mut self, room_name: &str) -> Vec<Effect> {
        match self.registry.create(room_name) {
            Some((id, true)) => self.room_created_broadcast(&id),
            // Existing room or blank name: nothing to announce.
            _ => Vec::new(),
        }
    }

    fn change_room(&mut self, client: ClientId, new_room: &str) -> Vec<Effect> {
        let Some(presence) = self.presence.lookup(&client) else {
            return Vec::new();
        };
        let username = presence.username().clone();
        let old_room = presence.room().clone();

        let new_room = new_room.trim();
        if new_room.is_empty() {
            return Vec::new();
        }
        let new_room = RoomId::new(new_room);

        let mut effects = Vec::new();

        self.registry.remove_member(&old_room, &username);
        effects.push(Effect::Unsubscribe {
            client,
            room: old_room.clone(),
        });
        effects.push(Effect::send(
            Scope::RoomExcept(old_room.clone(), client),
            ServerEvent::UserLeft(self.presence_notice(&username, &old_room, "left")),
        ));

        self.ensure_room(&new_room, &mut effects);
        self.registry.add_member(&new_room, username.clone());
        self.presence.update_room(&client, new_room.clone());

        effects.push(Effect::Subscribe {
            client,
            room: new_room.clone(),
        });
        effects.push(Effect::send(
            Scope::RoomExcept(new_room.clone(), client),
            ServerEvent::UserJoined(self.presence_notice(&username, &new_room, "joined")),
        ));
        effects.push(Effect::send(
            Scope::Client(client),
            ServerEvent::RoomInfo(self.room_info(&new_room)),
        ));
        effects
    }

    fn typing(&self, client: ClientId, is_typing: bool) -> Vec<Effect> {
        let Some(presence) = self.presence.lookup(&client) else {
            return Vec::new();
        };

        vec![Effect::send(
            Scope::RoomExcept(presence.room().clone(), client),
            ServerEvent::UserTyping(TypingNotice {
                username: presence.username().clone(),
                is_typing,
            }),
        )]
    }

    /// Registers a room targeted by id that the registry has never seen,
    /// announcing it like an explicit `create_room` would. Keeps member
    /// sets and the room list from diverging.
    fn ensure_room(&mut self, room: &RoomId, effects: &mut Vec<Effect>) {
        if self.registry.ensure(room) {
            effects.extend(self.room_created_broadcast(room));
        }
    }

    fn room_created_broadcast(&self, room: &RoomId) -> Vec<Effect> {
        let Some(room) = self.registry.get(room) else {
            return Vec::new();
        };
        vec![Effect::send(
            Scope::All,
            ServerEvent::RoomCreated(RoomSummary {
                id: room.id().clone(),
                name: room.name().to_string(),
                user_count: room.member_count(),
            }),
        )]
    }

    fn presence_notice(&self, username: &Username, room: &RoomId, verb: &str) -> PresenceNotice {
        PresenceNotice {
            username: username.clone(),
            message: format!("{} {} the room", username, verb),
            timestamp: Timestamp::now(),
            room_users: self.registry.member_names(room),
        }
    }

    fn room_info(&self, room: &RoomId) -> RoomInfo {
        RoomInfo {
            room: room.clone(),
            room_name: self
                .registry
                .get(room)
                .map(|r| r.name().to_string())
                .unwrap_or_else(|| room.as_str().to_string()),
            users: self.registry.member_names(room),
            rooms: self.registry.summaries(),
        }
    }

    fn next_message_id(&mut self) -> u64 {
        let millis = Timestamp::now().unix_millis();
        let id = millis.max(self.last_message_id + 1);
        self.last_message_id = id;
        id
    }
}

impl Default for Relay {
    fn default() -> Self {
        Self::new()
    }
}
