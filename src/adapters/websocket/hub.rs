//! Connection hub - the group-addressing transport primitive.
//!
//! Tracks one outbound channel per connected client plus room-label groups,
//! and resolves relay effects into channel sends:
//!
//! ```text
//! Group: general        Group: tech
//! ├── client-a          ├── client-d
//! ├── client-b          └── client-e
//! └── client-c
//! ```
//!
//! Outbound channels are unbounded: delivery is best effort and unthrottled,
//! and a send to a gone client is silently dropped.
//!
//! # Thread Safety
//!
//! Uses `RwLock` for both maps since sends (reads) vastly outnumber
//! connects, disconnects, and room moves (writes).

use std::collections::{HashMap, HashSet};

use tokio::sync::{mpsc, RwLock};

use crate::domain::events::ServerEvent;
use crate::domain::foundation::{ClientId, RoomId};
use crate::domain::relay::{Effect, Scope};

/// Manages per-client outbound channels and room groups.
#[derive(Debug, Default)]
pub struct ConnectionHub {
    /// Map of client_id → outbound event channel.
    clients: RwLock<HashMap<ClientId, mpsc::UnboundedSender<ServerEvent>>>,

    /// Map of room_id → clients tagged with that group label.
    groups: RwLock<HashMap<RoomId, HashSet<ClientId>>>,
}

impl ConnectionHub {
    /// Creates an empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection and returns the receiving end of its
    /// outbound channel.
    pub async fn register(&self, client: ClientId) -> mpsc::UnboundedReceiver<ServerEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.clients.write().await.insert(client, tx);
        rx
    }

    /// Removes a connection and strips it from every group.
    pub async fn remove(&self, client: &ClientId) {
        self.clients.write().await.remove(client);

        let mut groups = self.groups.write().await;
        groups.retain(|_, members| {
            members.remove(client);
            !members.is_empty()
        });
    }

    /// Tags a connection with a room's group label.
    pub async fn subscribe(&self, client: ClientId, room: RoomId) {
        self.groups.write().await.entry(room).or_default().insert(client);
    }

    /// Removes a connection's group label for a room. Empty groups are
    /// cleaned up.
    pub async fn unsubscribe(&self, client: &ClientId, room: &RoomId) {
        let mut groups = self.groups.write().await;
        if let Some(members) = groups.get_mut(room) {
            members.remove(client);
            if members.is_empty() {
                groups.remove(room);
            }
        }
    }

    /// Applies a batch of relay effects in order.
    pub async fn apply(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Subscribe { client, room } => self.subscribe(client, room).await,
                Effect::Unsubscribe { client, room } => self.unsubscribe(&client, &room).await,
                Effect::Send { scope, event } => self.send(scope, event).await,
            }
        }
    }

    /// Emits an event to a delivery scope.
    pub async fn send(&self, scope: Scope, event: ServerEvent) {
        match scope {
            Scope::Client(client) => self.send_to(&client, event).await,
            Scope::Room(room) => self.send_to_group(&room, None, event).await,
            Scope::RoomExcept(room, except) => {
                self.send_to_group(&room, Some(except), event).await;
            }
            Scope::All => self.broadcast(event).await,
        }
    }

    /// Sends an event to a single connection. No-op if the connection is
    /// gone.
    pub async fn send_to(&self, client: &ClientId, event: ServerEvent) {
        if let Some(tx) = self.clients.read().await.get(client) {
            // A closed channel means the client is mid-disconnect.
            let _ = tx.send(event);
        }
    }

    /// Sends an event to every member of a group, optionally excluding one
    /// connection. No-op for unknown groups.
    pub async fn send_to_group(
        &self,
        room: &RoomId,
        except: Option<ClientId>,
        event: ServerEvent,
    ) {
        let groups = self.groups.read().await;
        let Some(members) = groups.get(room) else {
            return;
        };
        let clients = self.clients.read().await;
        for member in members {
            if Some(*member) == except {
                continue;
            }
            if let Some(tx) = clients.get(member) {
                let _ = tx.send(event.clone());
            }
        }
    }

    /// Sends an event to every live connection, joined or not.
    pub async fn broadcast(&self, event: ServerEvent) {
        let clients = self.clients.read().await;
        for tx in clients.values() {
            let _ = tx.send(event.clone());
        }
    }

    /// Number of live connections (including ones that never joined).
    pub async fn connection_count(&self) -> usize {
        self.clients.read().await.len()
    }

    /// Number of connections tagged with a group label.
    pub async fn group_size(&self, room: &RoomId) -> usize {
        self.groups
            .read()
            .await
            .get(room)
            .map(HashSet::len)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::{Rejection, TypingNotice};
    use crate::domain::foundation::Username;

    fn test_event(text: &str) -> ServerEvent {
        ServerEvent::UsernameTaken(Rejection {
            message: text.to_string(),
        })
    }

    #[tokio::test]
    async fn send_to_delivers_to_one_client() {
        let hub = ConnectionHub::new();
        let a = ClientId::new();
        let b = ClientId::new();
        let mut rx_a = hub.register(a).await;
        let mut rx_b = hub.register(b).await;

        hub.send_to(&a, test_event("only a")).await;

        assert!(rx_a.recv().await.is_some());
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn group_send_reaches_all_members() {
        let hub = ConnectionHub::new();
        let room = RoomId::new("general");
        let a = ClientId::new();
        let b = ClientId::new();
        let mut rx_a = hub.register(a).await;
        let mut rx_b = hub.register(b).await;
        hub.subscribe(a, room.clone()).await;
        hub.subscribe(b, room.clone()).await;

        hub.send_to_group(&room, None, test_event("hello room")).await;

        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_ok());
    }

    #[tokio::test]
    async fn group_send_can_exclude_a_member() {
        let hub = ConnectionHub::new();
        let room = RoomId::new("general");
        let a = ClientId::new();
        let b = ClientId::new();
        let mut rx_a = hub.register(a).await;
        let mut rx_b = hub.register(b).await;
        hub.subscribe(a, room.clone()).await;
        hub.subscribe(b, room.clone()).await;

        let typing = ServerEvent::UserTyping(TypingNotice {
            username: Username::parse("alice").unwrap(),
            is_typing: true,
        });
        hub.send_to_group(&room, Some(a), typing).await;

        assert!(rx_a.try_recv().is_err());
        assert!(rx_b.try_recv().is_ok());
    }

    #[tokio::test]
    async fn broadcast_reaches_unjoined_connections() {
        let hub = ConnectionHub::new();
        let joined = ClientId::new();
        let lurker = ClientId::new();
        let mut rx_joined = hub.register(joined).await;
        let mut rx_lurker = hub.register(lurker).await;
        hub.subscribe(joined, RoomId::new("general")).await;

        hub.broadcast(test_event("new room!")).await;

        assert!(rx_joined.try_recv().is_ok());
        assert!(rx_lurker.try_recv().is_ok());
    }

    #[tokio::test]
    async fn send_to_unknown_group_is_noop() {
        let hub = ConnectionHub::new();
        let a = ClientId::new();
        let mut rx = hub.register(a).await;

        hub.send_to_group(&RoomId::new("ghost"), None, test_event("anyone?"))
            .await;

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn unsubscribe_stops_group_delivery() {
        let hub = ConnectionHub::new();
        let room = RoomId::new("general");
        let a = ClientId::new();
        let mut rx = hub.register(a).await;
        hub.subscribe(a, room.clone()).await;
        hub.unsubscribe(&a, &room).await;

        hub.send_to_group(&room, None, test_event("gone")).await;

        assert!(rx.try_recv().is_err());
        assert_eq!(hub.group_size(&room).await, 0);
    }

    #[tokio::test]
    async fn remove_strips_client_from_every_group() {
        let hub = ConnectionHub::new();
        let a = ClientId::new();
        let _rx = hub.register(a).await;
        hub.subscribe(a, RoomId::new("general")).await;
        hub.subscribe(a, RoomId::new("tech")).await;

        hub.remove(&a).await;

        assert_eq!(hub.connection_count().await, 0);
        assert_eq!(hub.group_size(&RoomId::new("general")).await, 0);
        assert_eq!(hub.group_size(&RoomId::new("tech")).await, 0);
    }

    #[tokio::test]
    async fn apply_resolves_effect_batches_in_order() {
        let hub = ConnectionHub::new();
        let room = RoomId::new("general");
        let a = ClientId::new();
        let mut rx = hub.register(a).await;

        hub.apply(vec![
            Effect::Subscribe {
                client: a,
                room: room.clone(),
            },
            Effect::Send {
                scope: Scope::Room(room.clone()),
                event: test_event("after subscribe"),
            },
        ])
        .await;

        assert!(rx.try_recv().is_ok());
    }
}
