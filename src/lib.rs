//! Corkboard - Main Library
//!
//! Corkboard is the real-time synchronization and locking subsystem for a
//! shared visual board: freeform notes grouped into spatial sections,
//! edited simultaneously by several users who see each other's changes
//! live while being prevented from editing the same element at once.
//!
//! # Overview
//!
//! This library provides the core functionality for Corkboard, including:
//! - A WebSocket connection gateway with per-board broadcast rooms
//! - An in-memory lock arbitration table with per-resource mutual exclusion
//! - A mutation-broadcast protocol with sender-excluded fan-out
//! - The geometric auto-capture engine that assigns freshly created notes
//!   to newly created sections
//! - A client-side reconciliation agent with optimistic updates and
//!   debounced persistence
//!
//! # Module Structure
//!
//! The library is organized into three main modules:
//!
//! - **`shared`** - Types shared between server and client
//!   - Board, note, and section models
//!   - The wire protocol (tagged client messages and server events)
//!   - Configuration and error types
//!
//! - **`backend`** - Server-side code
//!   - Axum WebSocket gateway and room registry
//!   - Lock arbitration table
//!   - Spatial capture engine and in-memory board store
//!
//! - **`client`** - Client-side reconciliation agent
//!   - Optimistic board replica merged from broadcast events
//!   - Debounced persistence writer
//!   - Viewport and minimap coordinate mapping
//!
//! # Consistency Model
//!
//! The server is a single logical process. Lock grant/release and
//! broadcast fan-out run to completion while holding the relevant table
//! mutex, so per-resource lock transitions are totally ordered by arrival.
//! Cross-resource and cross-client event ordering is not guaranteed; the
//! `sync-board` message exists to force full reconciliation when
//! per-mutation events have drifted. Locks and room membership are
//! ephemeral: a server restart silently clears them, and clients
//! re-acquire after reconnecting.
//!
//! # Thread Safety
//!
//! All shared server state is behind `Arc` with `Mutex`/`RwLock`
//! ownership, and room fan-out uses `tokio::sync::broadcast`. The lock
//! table and room registry are owned exclusively by the gateway; all
//! access is mediated by the message protocol.

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
pub mod backend;

/// Client-side reconciliation agent
pub mod client;
