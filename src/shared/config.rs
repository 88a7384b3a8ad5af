//! Application configuration module
//!
//! Provides configuration types for the synchronization subsystem:
//! the debounce window for client-side persistence, the heartbeat
//! interval backing disconnect detection, room channel capacity, and the
//! containment-test geometry used by the capture engine.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Geometry used by the capture engine's containment test
///
/// The source system always tested against the 200x140 default note size,
/// even for resized notes; that approximation is kept as the default and
/// the exact test is available as a configuration choice.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum CaptureGeometry {
    /// Test against the default 200x140 note size (source behavior)
    #[default]
    DefaultSize,
    /// Test against each note's actual stored size
    ActualSize,
}

/// Synchronization subsystem configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CollabConfig {
    /// Debounce window for coalescing rapid client-side writes, in ms
    pub debounce_ms: u64,
    /// WebSocket heartbeat ping interval, in seconds
    pub heartbeat_secs: u64,
    /// Per-room broadcast channel capacity
    pub room_channel_capacity: usize,
    /// Containment-test geometry for the capture engine
    pub capture_geometry: CaptureGeometry,
}

impl Default for CollabConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 500,
            heartbeat_secs: 15,
            room_channel_capacity: 256,
            capture_geometry: CaptureGeometry::DefaultSize,
        }
    }
}

impl CollabConfig {
    /// Create a new CollabConfigBuilder
    pub fn builder() -> CollabConfigBuilder {
        CollabConfigBuilder::default()
    }

    /// Parse configuration from a TOML document
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(input).map_err(|e| ConfigError::InvalidToml(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.debounce_ms == 0 {
            return Err(ConfigError::InvalidValue("debounce_ms must be positive"));
        }
        if self.heartbeat_secs == 0 {
            return Err(ConfigError::InvalidValue("heartbeat_secs must be positive"));
        }
        if self.room_channel_capacity == 0 {
            return Err(ConfigError::InvalidValue(
                "room_channel_capacity must be positive",
            ));
        }
        Ok(())
    }

    /// Debounce window as a `Duration`
    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Heartbeat interval as a `Duration`
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs)
    }
}

/// Builder for CollabConfig
#[derive(Debug, Default)]
pub struct CollabConfigBuilder {
    debounce_ms: Option<u64>,
    heartbeat_secs: Option<u64>,
    room_channel_capacity: Option<usize>,
    capture_geometry: Option<CaptureGeometry>,
}

impl CollabConfigBuilder {
    /// Set the debounce window in milliseconds
    pub fn debounce_ms(mut self, ms: u64) -> Self {
        self.debounce_ms = Some(ms);
        self
    }

    /// Set the heartbeat interval in seconds
    pub fn heartbeat_secs(mut self, secs: u64) -> Self {
        self.heartbeat_secs = Some(secs);
        self
    }

    /// Set the per-room broadcast channel capacity
    pub fn room_channel_capacity(mut self, capacity: usize) -> Self {
        self.room_channel_capacity = Some(capacity);
        self
    }

    /// Set the capture containment geometry
    pub fn capture_geometry(mut self, geometry: CaptureGeometry) -> Self {
        self.capture_geometry = Some(geometry);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<CollabConfig, ConfigError> {
        let defaults = CollabConfig::default();
        let config = CollabConfig {
            debounce_ms: self.debounce_ms.unwrap_or(defaults.debounce_ms),
            heartbeat_secs: self.heartbeat_secs.unwrap_or(defaults.heartbeat_secs),
            room_channel_capacity: self
                .room_channel_capacity
                .unwrap_or(defaults.room_channel_capacity),
            capture_geometry: self.capture_geometry.unwrap_or(defaults.capture_geometry),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid TOML: {0}")]
    InvalidToml(String),
    #[error("invalid value: {0}")]
    InvalidValue(&'static str),
}
