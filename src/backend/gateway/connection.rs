/**
 * WebSocket Connection Lifecycle
 *
 * This module implements the gateway's per-connection handling: upgrade,
 * the reader loop that dispatches inbound protocol messages, the writer
 * task that drains outbound events and drives the heartbeat, room
 * subscription forwarders, and disconnect cleanup.
 *
 * # Lifecycle
 *
 * 1. Upgrade assigns a fresh `ConnectionId`; identity is supplied later
 *    by the session layer inside lock requests and trusted as given.
 * 2. The reader loop parses each text frame as a `ClientMessage` and
 *    dispatches it. A malformed payload is dropped and logged; it must
 *    never take down the handler shared by all other rooms.
 * 3. `join-board` spawns a forwarder task that copies the board's room
 *    events into this connection's outbound queue, skipping events that
 *    originated here (sender exclusion).
 * 4. When the reader loop ends, for any reason, disconnect cleanup runs
 *    before teardown: every lock this connection held is released and an
 *    unlock event is broadcast to the owning board's room.
 *
 * # Disconnect Detection
 *
 * The writer task pings on the configured heartbeat interval and gives
 * up once nothing has been heard from the peer for three intervals.
 * There are no lock timeouts, so this bounded detection latency is what
 * keeps a crashed client from starving its peers indefinitely.
 */
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::body::Bytes;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;

use crate::backend::server::state::AppState;
use crate::shared::board::BoardId;
use crate::shared::protocol::{ClientMessage, ConnectionId, ServerEvent};

/// Handle a WebSocket upgrade request (GET /ws)
pub async fn handle_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| run_connection(socket, state))
}

/// State of one live gateway connection
pub struct Connection {
    /// Gateway-assigned connection id
    pub(crate) id: ConnectionId,
    /// Shared application state
    pub(crate) state: AppState,
    /// Outbound queue drained by the writer task
    pub(crate) outbound: mpsc::UnboundedSender<ServerEvent>,
    /// Boards this connection has joined
    joined: HashSet<BoardId>,
}

/// Drive one connection from upgrade to teardown
async fn run_connection(socket: WebSocket, state: AppState) {
    let (mut connection, outbound_rx) = Connection::open(state);
    let id = connection.id;
    tracing::info!("[Gateway] Connection {} established", id);

    let (sink, stream) = socket.split();
    let last_seen = Arc::new(Mutex::new(Instant::now()));

    let heartbeat = connection.state.config.heartbeat_interval();
    let writer = tokio::spawn(write_loop(sink, outbound_rx, heartbeat, last_seen.clone()));

    connection.read_loop(stream, last_seen).await;

    // Cleanup must run before the connection is fully torn down; it is
    // the single integration point the lock table relies on.
    connection.close();
    writer.abort();
    tracing::info!("[Gateway] Connection {} closed", id);
}

/// Drain outbound events to the socket and drive the heartbeat
async fn write_loop(
    mut sink: SplitSink<WebSocket, Message>,
    mut outbound: mpsc::UnboundedReceiver<ServerEvent>,
    heartbeat: Duration,
    last_seen: Arc<Mutex<Instant>>,
) {
    let mut ping = tokio::time::interval(heartbeat);
    ping.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    ping.tick().await; // first tick fires immediately

    loop {
        tokio::select! {
            maybe_event = outbound.recv() => {
                let Some(event) = maybe_event else { break };
                let text = match serde_json::to_string(&event) {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::error!("[Gateway] Failed to serialize event: {:?}", e);
                        continue;
                    }
                };
                if sink.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            _ = ping.tick() => {
                let idle = last_seen.lock().unwrap().elapsed();
                if idle > heartbeat * 3 {
                    tracing::warn!(
                        "[Gateway] Heartbeat timed out after {:?} of silence",
                        idle
                    );
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
                if sink.send(Message::Ping(Bytes::new())).await.is_err() {
                    break;
                }
            }
        }
    }
}

impl Connection {
    /// Open a logical connection that is not bound to a socket
    ///
    /// Returns the connection and the receiving end of its outbound
    /// queue. The WebSocket path drains that queue into the wire; an
    /// alternate transport (or a test harness) drains it directly.
    pub fn open(state: AppState) -> (Self, mpsc::UnboundedReceiver<ServerEvent>) {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel::<ServerEvent>();
        let connection = Self {
            id: Uuid::new_v4(),
            state,
            outbound: outbound_tx,
            joined: HashSet::new(),
        };
        (connection, outbound_rx)
    }

    /// Gateway-assigned id of this connection
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Tear the connection down, running disconnect cleanup
    ///
    /// Equivalent to the transport noticing the peer is gone: every lock
    /// this connection held is released and announced to the owning
    /// board's room.
    pub fn close(self) {
        self.disconnect();
    }

    /// Read and dispatch inbound frames until the socket ends
    async fn read_loop(
        &mut self,
        mut stream: SplitStream<WebSocket>,
        last_seen: Arc<Mutex<Instant>>,
    ) {
        while let Some(result) = stream.next().await {
            let message = match result {
                Ok(message) => message,
                Err(e) => {
                    tracing::debug!("[Gateway] Receive error on {}: {:?}", self.id, e);
                    break;
                }
            };
            *last_seen.lock().unwrap() = Instant::now();

            match message {
                Message::Text(text) => match serde_json::from_str::<ClientMessage>(text.as_str()) {
                    Ok(parsed) => {
                        if let Err(e) = self.handle_message(parsed) {
                            // Out-of-contract message: drop it, keep the
                            // connection and the shared tables intact
                            tracing::warn!("[Gateway] Dropped message from {}: {}", self.id, e);
                        }
                    }
                    Err(e) => {
                        tracing::warn!("[Gateway] Malformed payload from {}: {}", self.id, e);
                    }
                },
                Message::Close(_) => break,
                // Pings are answered by the transport; pongs only refresh last_seen
                Message::Ping(_) | Message::Pong(_) | Message::Binary(_) => {}
            }
        }
    }

    /// Join a board's room, spawning the event forwarder for it
    ///
    /// A connection may join multiple boards sequentially; re-joining a
    /// board it is already in is a no-op.
    pub(crate) fn join(&mut self, board_id: &str) {
        if !self.joined.insert(board_id.to_string()) {
            tracing::debug!("[Gateway] {} already in board {}", self.id, board_id);
            return;
        }

        let mut room_rx = self.state.rooms.subscribe(board_id);
        let outbound = self.outbound.clone();
        let me = self.id;
        let board = board_id.to_string();
        tokio::spawn(async move {
            loop {
                match room_rx.recv().await {
                    Ok(msg) => {
                        // Sender exclusion: never echo a mutation back to
                        // its originator
                        if msg.origin == Some(me) {
                            continue;
                        }
                        if outbound.send(msg.event).is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(
                            "[Gateway] {} lagged in {}, skipped {} event(s)",
                            me,
                            board,
                            skipped
                        );
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        tracing::info!("[Gateway] {} joined board {}", self.id, board_id);
    }

    /// Release every lock this connection holds and announce each release
    ///
    /// Board-scoped lock keys let each unlock broadcast go to exactly the
    /// owning board's room.
    fn disconnect(&self) {
        let released = self.state.locks.release_all(self.id);
        for key in released {
            self.state.rooms.broadcast(
                &key.board_id,
                None,
                ServerEvent::unlocked(key.kind, key.id.clone()),
            );
        }
        self.state.rooms.cleanup_idle_rooms();
    }
}
