/**
 * Server Configuration
 *
 * This module handles loading of server configuration from the
 * environment and an optional TOML file.
 *
 * # Configuration Sources
 *
 * 1. `CORKBOARD_CONFIG` - optional path to a TOML file with the
 *    synchronization settings (debounce window, heartbeat, capture
 *    geometry, channel capacity)
 * 2. Environment variables - `SERVER_PORT`, `HEARTBEAT_SECS`,
 *    `CAPTURE_GEOMETRY` (`default-size` or `actual-size`)
 *
 * # Error Handling
 *
 * Configuration errors are logged but do not prevent server startup;
 * invalid or missing values fall back to defaults.
 */
use crate::shared::config::{CaptureGeometry, CollabConfig};

/// Full server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// TCP port to listen on
    pub port: u16,
    /// Synchronization subsystem settings
    pub collab: CollabConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            collab: CollabConfig::default(),
        }
    }
}

/// Load server configuration from the environment
pub fn load_config() -> ServerConfig {
    let mut collab = load_collab_file().unwrap_or_default();

    if let Ok(secs) = std::env::var("HEARTBEAT_SECS") {
        match secs.parse::<u64>() {
            Ok(parsed) if parsed > 0 => collab.heartbeat_secs = parsed,
            _ => tracing::warn!("Ignoring invalid HEARTBEAT_SECS={}", secs),
        }
    }

    if let Ok(mode) = std::env::var("CAPTURE_GEOMETRY") {
        match mode.as_str() {
            "default-size" => collab.capture_geometry = CaptureGeometry::DefaultSize,
            "actual-size" => collab.capture_geometry = CaptureGeometry::ActualSize,
            other => tracing::warn!("Ignoring invalid CAPTURE_GEOMETRY={}", other),
        }
    }

    let port = std::env::var("SERVER_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(3000);

    ServerConfig { port, collab }
}

/// Read the optional TOML config file named by `CORKBOARD_CONFIG`
fn load_collab_file() -> Option<CollabConfig> {
    let path = std::env::var("CORKBOARD_CONFIG").ok()?;
    let contents = match std::fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) => {
            tracing::warn!("Failed to read config file {}: {}", path, e);
            return None;
        }
    };
    match CollabConfig::from_toml_str(&contents) {
        Ok(config) => {
            tracing::info!("Loaded configuration from {}", path);
            Some(config)
        }
        Err(e) => {
            tracing::warn!("Invalid config file {}: {}; using defaults", path, e);
            None
        }
    }
}
