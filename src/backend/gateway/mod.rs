//! Connection Gateway Module
//!
//! The sole transport through which clients reach the synchronization
//! core: WebSocket connection lifecycle, per-board broadcast rooms, and
//! the dispatch of every inbound protocol message.
//!
//! # Architecture
//!
//! ```text
//! gateway/
//! ├── mod.rs        - Module exports and documentation
//! ├── rooms.rs      - Per-board broadcast channels with sender exclusion
//! ├── connection.rs - WebSocket lifecycle, heartbeat, disconnect cleanup
//! └── dispatch.rs   - Single match over the inbound message union
//! ```
//!
//! # Ordering
//!
//! Each inbound message is dispatched to completion before the next one
//! from the same connection is read, and all shared-state mutation inside
//! a dispatch is synchronous. Delivery order between two concurrent
//! mutations from different connections is whatever arrival order the
//! transport provides; the protocol makes no global ordering guarantee.

/// Per-board broadcast rooms
pub mod rooms;

/// WebSocket connection lifecycle
pub mod connection;

/// Inbound message dispatch
pub mod dispatch;

pub use connection::{handle_upgrade, Connection};
pub use rooms::{RoomMessage, RoomRegistry};
