//! Room registry - the process-wide set of chat rooms.
//!
//! Rooms are created on demand and never deleted; the registry lives for
//! the process lifetime and is lost on restart. Membership mutation is
//! tolerant of stale room ids: operations against an unknown room are
//! no-ops, never faults, since an id may be stale after a race with a
//! concurrent disconnect.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use super::foundation::{RoomId, Timestamp, Username};

/// The starter rooms registered at process startup.
pub const DEFAULT_ROOMS: &[(&str, &str)] = &[
    ("general", "General"),
    ("random", "Random"),
    ("tech", "Tech Talk"),
    ("gaming", "Gaming"),
    ("music", "Music Lovers"),
];

/// A named room and its present members.
#[derive(Debug, Clone)]
pub struct Room {
    id: RoomId,
    name: String,
    members: HashSet<Username>,
    created: Timestamp,
}

impl Room {
    fn new(id: RoomId, name: String) -> Self {
        Self {
            id,
            name,
            members: HashSet::new(),
            created: Timestamp::now(),
        }
    }

    /// The room's slug id.
    pub fn id(&self) -> &RoomId {
        &self.id
    }

    /// The room's human-readable display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of present members.
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Creation time of the room.
    pub fn created(&self) -> Timestamp {
        self.created
    }
}

/// Listing entry for UI population: `{id, name, userCount}` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomSummary {
    pub id: RoomId,
    pub name: String,
    #[serde(rename = "userCount")]
    pub user_count: usize,
}

/// Registry of all rooms and their member sets.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: HashMap<RoomId, Room>,
}

impl RoomRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry pre-populated with the starter rooms.
    pub fn with_default_rooms() -> Self {
        let mut registry = Self::new();
        registry.ensure_default_rooms();
        registry
    }

    /// Registers the fixed starter set. Idempotent.
    pub fn ensure_default_rooms(&mut self) {
        for (id, name) in DEFAULT_ROOMS {
            let id = RoomId::new(*id);
            self.rooms
                .entry(id.clone())
                .or_insert_with(|| Room::new(id, (*name).to_string()));
        }
    }

    /// Creates a room from a display name, deriving its id.
    ///
    /// Idempotent: if a room with the derived id already exists, nothing
    /// changes and the existing id is returned with `created = false`.
    /// Returns `None` when no id can be derived (blank name).
    pub fn create(&mut self, display_name: &str) -> Option<(RoomId, bool)> {
        let id = RoomId::from_display_name(display_name)?;
        let created = !self.rooms.contains_key(&id);
        if created {
            self.rooms.insert(
                id.clone(),
                Room::new(id.clone(), display_name.trim().to_string()),
            );
        }
        Some((id, created))
    }

    /// Registers a room under a verbatim id, using the id as its display
    /// name. Returns `true` if the room was actually inserted.
    ///
    /// Used when a client targets a room id the registry has never seen,
    /// so that member sets can never belong to an unlisted room.
    pub fn ensure(&mut self, id: &RoomId) -> bool {
        if self.rooms.contains_key(id) {
            return false;
        }
        self.rooms
            .insert(id.clone(), Room::new(id.clone(), id.as_str().to_string()));
        true
    }

    /// Adds a username to a room's member set. No-op if the room is unknown.
    pub fn add_member(&mut self, room: &RoomId, username: Username) {
        if let Some(room) = self.rooms.get_mut(room) {
            room.members.insert(username);
        }
    }

    /// Removes a username from a room's member set. No-op if the room is
    /// unknown or the username is not a member.
    pub fn remove_member(&mut self, room: &RoomId, username: &Username) {
        if let Some(room) = self.rooms.get_mut(room) {
            room.members.remove(username);
        }
    }

    /// Member usernames of a room, sorted for stable output; empty if the
    /// room is unknown.
    pub fn member_names(&self, room: &RoomId) -> Vec<Username> {
        let mut names: Vec<Username> = self
            .rooms
            .get(room)
            .map(|r| r.members.iter().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    /// Looks up a room by id.
    pub fn get(&self, room: &RoomId) -> Option<&Room> {
        self.rooms.get(room)
    }

    /// Snapshot of every room as a listing entry. Always the full registry;
    /// there is no pagination at this scale.
    pub fn summaries(&self) -> Vec<RoomSummary> {
        let mut summaries: Vec<RoomSummary> = self
            .rooms
            .values()
            .map(|room| RoomSummary {
                id: room.id.clone(),
                name: room.name.clone(),
                user_count: room.members.len(),
            })
            .collect();
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        summaries
    }

    /// Iterates over all rooms.
    pub fn iter(&self) -> impl Iterator<Item = &Room> {
        self.rooms.values()
    }

    /// Number of registered rooms.
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// Whether the registry holds no rooms.
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
