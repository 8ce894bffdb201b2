//! Presence table - the live connection → (username, room) association.
//!
//! A connection appears here only after a successful join; an event from a
//! connection with no presence record is ignored by the relay rather than
//! treated as an error. Records are removed on disconnect.

use std::collections::HashMap;

use super::foundation::{ClientId, RoomId, Username};

/// The (username, room) pair a connection currently holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presence {
    username: Username,
    room: RoomId,
}

impl Presence {
    /// The username the connection joined under.
    pub fn username(&self) -> &Username {
        &self.username
    }

    /// The room the connection is currently in.
    pub fn room(&self) -> &RoomId {
        &self.room
    }
}

/// Maps each live connection to its presence record.
#[derive(Debug, Default)]
pub struct PresenceTable {
    entries: HashMap<ClientId, Presence>,
}

impl PresenceTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites the connection's presence record.
    pub fn register(&mut self, client: ClientId, username: Username, room: RoomId) {
        self.entries.insert(client, Presence { username, room });
    }

    /// The connection's presence, if it has joined.
    pub fn lookup(&self, client: &ClientId) -> Option<&Presence> {
        self.entries.get(client)
    }

    /// Moves the connection to a new room in place. No-op for connections
    /// without a presence record.
    pub fn update_room(&mut self, client: &ClientId, room: RoomId) {
        if let Some(presence) = self.entries.get_mut(client) {
            presence.room = room;
        }
    }

    /// Removes and returns the connection's record, for disconnect cleanup.
    pub fn unregister(&mut self, client: &ClientId) -> Option<Presence> {
        self.entries.remove(client)
    }

    /// Finds the presence record holding a username, if any.
    ///
    /// Linear scan; only used for the join-time uniqueness check, which is
    /// not a hot path at this scale.
    pub fn find_by_username(&self, username: &Username) -> Option<&Presence> {
        self.entries.values().find(|p| &p.username == username)
    }

    /// Number of live presence records.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no connections are present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over all records.
    pub fn iter(&self) -> impl Iterator<Item = (&ClientId, &Presence)> {
        self.entries.iter()
    }
}
