//! Lock Arbitration Module
//!
//! In-memory advisory locking for board resources. A lock marks one
//! connection as the active editor of one note or section; peers render
//! it as "being edited by user X" and refrain from concurrent edits.
//!
//! # Guarantees
//!
//! - At most one holder per `(board, kind, id)` key at any instant
//! - Idempotent re-grant to the current holder
//! - Non-holder releases are silent no-ops
//! - Disconnect releases everything the connection held
//!
//! Locks are process-memory only and vanish on restart; clients
//! re-acquire after reconnecting.

/// Lock table and service trait
pub mod table;

pub use table::{
    AcquireOutcome, InMemoryLockTable, LockHolder, LockKey, LockService, ReleaseOutcome,
};
