//! Backend Module
//!
//! This module contains all server-side code for the Corkboard gateway.
//!
//! # Overview
//!
//! The backend module includes:
//! - Axum WebSocket server setup and configuration
//! - The connection gateway with per-board broadcast rooms
//! - The lock arbitration table
//! - The spatial capture engine
//! - The in-process board store
//!
//! # Architecture
//!
//! The backend is organized into focused submodules:
//!
//! - **`server`** - Server initialization, application state, configuration
//! - **`routes`** - HTTP route configuration and router assembly
//! - **`gateway`** - Connection lifecycle, rooms, protocol dispatch
//! - **`locks`** - Lock arbitration table
//! - **`capture`** - Spatial auto-capture engine
//! - **`store`** - Board store boundary and in-memory implementation
//! - **`error`** - Backend-specific error types
//!
//! # State Management
//!
//! Shared state (`AppState`) holds the room registry, the lock table,
//! the board store, and configuration. The tables guard their maps with
//! mutexes and complete every operation without yielding; room fan-out
//! uses `tokio::sync::broadcast`.

/// Server setup and configuration
pub mod server;

/// Route configuration
pub mod routes;

/// Connection gateway and rooms
pub mod gateway;

/// Lock arbitration
pub mod locks;

/// Spatial capture engine
pub mod capture;

/// Board store
pub mod store;

/// Backend error types
pub mod error;

/// Re-export commonly used types
pub use capture::{capture_orphans, CaptureOutcome};
pub use error::BackendError;
pub use gateway::{RoomMessage, RoomRegistry};
pub use locks::{InMemoryLockTable, LockKey, LockService};
pub use server::{create_app, AppState};
pub use store::{BoardStore, MemoryStore};
