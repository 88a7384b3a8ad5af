/**
 * Room Registry and Event Fan-out
 *
 * This module manages per-board broadcast channels. A "room" is the
 * broadcast group of all connections currently viewing one board; every
 * relay in the mutation protocol is scoped to a room.
 *
 * # Broadcasting
 *
 * Events are fanned out with `tokio::sync::broadcast`: one channel per
 * board, created on first use and reaped once its last subscriber is
 * gone. Every subscriber receives a copy of each message and filters
 * locally.
 *
 * # Sender Exclusion
 *
 * Each message carries the originating connection id. Mutation relays
 * set `origin` so the originator's own forwarder drops the copy (the
 * originator already has local optimistic state). Lock announcements are
 * sent with no origin and reach the whole room, requester included.
 */
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;

use crate::shared::board::BoardId;
use crate::shared::protocol::{ConnectionId, ServerEvent};

/// One event traveling through a room channel
#[derive(Debug, Clone)]
pub struct RoomMessage {
    /// Connection the event originated from; `None` delivers to everyone
    pub origin: Option<ConnectionId>,
    /// The event to deliver
    pub event: ServerEvent,
}

/// Registry of per-board broadcast channels
///
/// Cheaply cloneable; all clones share the same underlying map.
#[derive(Debug, Clone)]
pub struct RoomRegistry {
    channels: Arc<Mutex<HashMap<BoardId, broadcast::Sender<RoomMessage>>>>,
    capacity: usize,
}

impl RoomRegistry {
    /// Create an empty registry with the given per-room channel capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: Arc::new(Mutex::new(HashMap::new())),
            capacity,
        }
    }

    /// Get or create the broadcast sender for a board's room
    pub fn sender(&self, board_id: &str) -> broadcast::Sender<RoomMessage> {
        let mut channels = self.channels.lock().unwrap();
        channels
            .entry(board_id.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }

    /// Subscribe to a board's room, creating it if needed
    pub fn subscribe(&self, board_id: &str) -> broadcast::Receiver<RoomMessage> {
        self.sender(board_id).subscribe()
    }

    /// Broadcast an event to a board's room
    ///
    /// Returns the number of subscribers that received the message
    /// (0 if the room is empty, which is not an error).
    pub fn broadcast(
        &self,
        board_id: &str,
        origin: Option<ConnectionId>,
        event: ServerEvent,
    ) -> usize {
        let sender = self.sender(board_id);
        let name = event.name();
        match sender.send(RoomMessage { origin, event }) {
            Ok(subscriber_count) => {
                tracing::debug!(
                    "[Rooms] {} broadcast to {} subscriber(s) in {}",
                    name,
                    subscriber_count,
                    board_id
                );
                subscriber_count
            }
            Err(_) => {
                // No subscribers in the room, that's okay
                tracing::debug!("[Rooms] No subscribers in {} for {}", board_id, name);
                0
            }
        }
    }

    /// Drop channels whose rooms have no subscribers left
    pub fn cleanup_idle_rooms(&self) {
        self.channels
            .lock()
            .unwrap()
            .retain(|_, sender| sender.receiver_count() > 0);
    }

    /// Number of live room channels
    pub fn room_count(&self) -> usize {
        self.channels.lock().unwrap().len()
    }

    /// Subscriber count for one room (for diagnostics)
    pub fn subscriber_count(&self, board_id: &str) -> usize {
        self.channels
            .lock()
            .unwrap()
            .get(board_id)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }
}
