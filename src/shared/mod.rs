//! Shared Module
//!
//! This module contains types and data structures that are shared between
//! the server and the client-side reconciliation agent. These types are
//! used for serialization and communication over the WebSocket protocol.
//!
//! # Overview
//!
//! The shared module provides platform-agnostic types that can be used
//! in both server and client code. All types are designed for
//! serialization and transmission as JSON.

/// Board, note, and section data structures
pub mod board;

/// Wire protocol: client messages and server events
pub mod protocol;

/// Shared error types
pub mod error;

/// Application configuration
pub mod config;

/// Re-export commonly used types for convenience
pub use board::{Board, Note, ResourceKind, Section, DEFAULT_NOTE_HEIGHT, DEFAULT_NOTE_WIDTH};
pub use config::{CaptureGeometry, CollabConfig, CollabConfigBuilder, ConfigError};
pub use error::SharedError;
pub use protocol::{ClientMessage, ConnectionId, ServerEvent};
