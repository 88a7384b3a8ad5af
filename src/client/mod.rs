//! Client Reconciliation Module
//!
//! The per-client state store and its supporting machinery: optimistic
//! local mutations, merge of inbound broadcast events, debounced
//! persistence to the external document store, and the viewport/minimap
//! coordinate mapping used by the canvas presentation.
//!
//! # Module Structure
//!
//! ```text
//! client/
//! ├── mod.rs      - Module exports and documentation
//! ├── replica.rs  - Optimistic board replica and merge rules
//! ├── persist.rs  - Debounced persistence writer
//! └── viewport.rs - Pan/zoom and minimap projections
//! ```

/// Optimistic board replica
pub mod replica;

/// Debounced persistence
pub mod persist;

/// Viewport and minimap geometry
pub mod viewport;

pub use persist::{BoardPersister, DebouncedWriter, PersistError, ResourceRef, DEBOUNCE_WINDOW};
pub use replica::{BoardReplica, MergeOutcome};
pub use viewport::{MinimapProjection, Rect, Viewport};
