/**
 * Application State Management
 *
 * This module defines the application state structure and implements the
 * necessary `FromRef` traits for Axum state extraction.
 *
 * # Architecture
 *
 * The `AppState` struct serves as the central state container for the
 * gateway, holding:
 * - The room registry (per-board broadcast channels)
 * - The lock arbitration table
 * - The in-process board store
 * - The synchronization configuration
 *
 * # Shared-resource Policy
 *
 * The lock table and the room registry are the only shared mutable
 * state; both are owned exclusively by the gateway components and never
 * touched directly by client code. All access is mediated by the message
 * protocol.
 *
 * # Thread Safety
 *
 * Both tables guard their maps with a mutex and complete every operation
 * without yielding, so a single logical operation can never interleave
 * with another on the same key.
 */
use std::sync::Arc;

use axum::extract::FromRef;

use crate::backend::gateway::rooms::RoomRegistry;
use crate::backend::locks::{InMemoryLockTable, LockService};
use crate::backend::store::{BoardStore, MemoryStore};
use crate::shared::config::CollabConfig;

/// Application state shared by every connection handler
#[derive(Clone)]
pub struct AppState {
    /// Per-board broadcast rooms
    pub rooms: RoomRegistry,

    /// Lock arbitration table
    ///
    /// Held behind the `LockService` seam so the in-process map can be
    /// swapped for a networked store without touching the protocol layer.
    pub locks: Arc<dyn LockService>,

    /// In-process board contents, consulted by capture and sync
    pub store: Arc<dyn BoardStore>,

    /// Synchronization configuration
    pub config: Arc<CollabConfig>,
}

impl AppState {
    /// Create fresh state with in-memory tables
    pub fn new(config: CollabConfig) -> Self {
        Self {
            rooms: RoomRegistry::new(config.room_channel_capacity),
            locks: Arc::new(InMemoryLockTable::new()),
            store: Arc::new(MemoryStore::new()),
            config: Arc::new(config),
        }
    }
}

impl FromRef<AppState> for RoomRegistry {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.rooms.clone()
    }
}

impl FromRef<AppState> for Arc<dyn LockService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.locks.clone()
    }
}

impl FromRef<AppState> for Arc<dyn BoardStore> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.store.clone()
    }
}
