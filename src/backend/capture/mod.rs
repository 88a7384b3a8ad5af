//! Spatial Capture Module
//!
//! The geometric auto-capture algorithm that assigns freshly created
//! orphan notes to newly created sections. One-shot, approximate by
//! configuration, and never a crash condition.

/// Capture selection and outcome types
pub mod engine;

pub use engine::{capture_orphans, CaptureOutcome};
