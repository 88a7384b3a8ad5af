//! Common test utilities and helpers
//!
//! Provides an in-process harness for driving the gateway the way a
//! WebSocket client would: each `TestClient` is a real gateway
//! `Connection` whose outbound queue is read directly instead of being
//! written to a socket.

use std::time::Duration;

use tokio::sync::mpsc;

use corkboard::backend::gateway::Connection;
use corkboard::backend::server::state::AppState;
use corkboard::shared::config::CollabConfig;
use corkboard::shared::protocol::{ClientMessage, ConnectionId, ServerEvent};

/// Fresh application state with default configuration
pub fn test_state() -> AppState {
    AppState::new(CollabConfig::default())
}

/// One simulated client connection
pub struct TestClient {
    connection: Connection,
    rx: mpsc::UnboundedReceiver<ServerEvent>,
}

impl TestClient {
    /// Connect a new client to the given state
    pub fn connect(state: &AppState) -> Self {
        let (connection, rx) = Connection::open(state.clone());
        Self { connection, rx }
    }

    /// Connect and immediately join a board
    pub async fn connect_and_join(state: &AppState, board_id: &str) -> Self {
        let mut client = Self::connect(state);
        client.send(ClientMessage::JoinBoard {
            board_id: board_id.to_string(),
        });
        // Give the room forwarder task time to register
        tokio::time::sleep(Duration::from_millis(10)).await;
        client
    }

    /// Gateway id of this connection
    pub fn id(&self) -> ConnectionId {
        self.connection.id()
    }

    /// Dispatch a message as if it had arrived on the wire
    pub fn send(&mut self, message: ClientMessage) {
        self.connection
            .handle_message(message)
            .expect("message was dropped by the dispatcher");
    }

    /// Wait for the next event delivered to this client
    pub async fn recv(&mut self) -> ServerEvent {
        tokio::time::timeout(Duration::from_secs(1), self.rx.recv())
            .await
            .expect("timed out waiting for an event")
            .expect("outbound queue closed")
    }

    /// Collect everything currently queued for this client
    pub async fn drain(&mut self) -> Vec<ServerEvent> {
        // Let in-flight forwarder deliveries land first
        tokio::time::sleep(Duration::from_millis(20)).await;
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }

    /// Assert that nothing is queued for this client
    pub async fn assert_silent(&mut self) {
        let events = self.drain().await;
        assert!(events.is_empty(), "expected no events, got {:?}", events);
    }

    /// Simulate the transport noticing this client is gone
    pub fn disconnect(self) {
        self.connection.close();
    }
}
