//! WebSocket upgrade handler for relay connections.
//!
//! Manages the connection lifecycle:
//! 1. Upgrade to WebSocket and register an outbound channel in the hub
//! 2. Forward hub deliveries to the client
//! 3. Parse inbound frames into protocol events and run them through the
//!    relay under its mutex, applying the returned effects
//! 4. On disconnect, run the relay's teardown and drop the channel
//!
//! Malformed frames are dropped, never answered; a close frame, a receive
//! error, or the stream ending are all the same normal disconnect path.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
    Router,
};
use futures::{stream::SplitSink, SinkExt, StreamExt};
use tokio::sync::Mutex;

use crate::domain::events::{ClientEvent, ServerEvent};
use crate::domain::foundation::ClientId;
use crate::domain::relay::Relay;

use super::hub::ConnectionHub;

/// Shared state for WebSocket handling: the relay behind its single mutex,
/// and the connection hub.
///
/// Every inbound event locks the relay, runs to completion, and releases
/// before the effects are applied, which serializes all registry and
/// presence mutation.
#[derive(Clone)]
pub struct RelayState {
    pub relay: Arc<Mutex<Relay>>,
    pub hub: Arc<ConnectionHub>,
}

impl RelayState {
    /// Creates fresh relay state with the starter rooms registered.
    pub fn new() -> Self {
        Self {
            relay: Arc::new(Mutex::new(Relay::new())),
            hub: Arc::new(ConnectionHub::new()),
        }
    }
}

impl Default for RelayState {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle WebSocket upgrade requests.
///
/// Route: `GET /ws`
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<RelayState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Runs for the lifetime of one connection.
async fn handle_socket(socket: WebSocket, state: RelayState) {
    let (mut sender, mut receiver) = socket.split();

    let client_id = ClientId::new();
    let mut outbound = state.hub.register(client_id).await;

    tracing::info!(client_id = %client_id, "client connected");

    // Forward hub deliveries to the client until its channel closes or the
    // socket rejects a send.
    let mut send_task = tokio::spawn(async move {
        while let Some(event) = outbound.recv().await {
            if send_event(&mut sender, &event).await.is_err() {
                break;
            }
        }
    });

    let recv_state = state.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Text(text)) => {
                    let Ok(event) = serde_json::from_str::<ClientEvent>(&text) else {
                        tracing::debug!(client_id = %client_id, "dropping malformed frame");
                        continue;
                    };
                    tracing::debug!(client_id = %client_id, ?event, "handling client event");

                    let effects = {
                        let mut relay = recv_state.relay.lock().await;
                        relay.handle_event(client_id, event)
                    };
                    recv_state.hub.apply(effects).await;
                }
                Ok(Message::Binary(_)) => {
                    tracing::warn!(client_id = %client_id, "dropping unsupported binary frame");
                }
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                    // Protocol-level keepalive, handled by axum.
                }
                Ok(Message::Close(_)) => {
                    tracing::debug!(client_id = %client_id, "client sent close frame");
                    break;
                }
                Err(e) => {
                    tracing::debug!(client_id = %client_id, "receive error: {}", e);
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    // Teardown: drop the channel and group labels first so the leave
    // notice only reaches the remaining members.
    state.hub.remove(&client_id).await;
    let effects = {
        let mut relay = state.relay.lock().await;
        relay.handle_disconnect(client_id)
    };
    state.hub.apply(effects).await;

    tracing::info!(client_id = %client_id, "client disconnected");
}

/// Serializes and sends one event over the socket.
async fn send_event(
    sender: &mut SplitSink<WebSocket, Message>,
    event: &ServerEvent,
) -> Result<(), axum::Error> {
    let json = serde_json::to_string(event).expect("ServerEvent serialization should not fail");
    sender.send(Message::Text(json)).await
}

/// Creates the axum router for the WebSocket endpoint.
pub fn websocket_router() -> Router<RelayState> {
    Router::new().route("/ws", get(ws_handler))
}
