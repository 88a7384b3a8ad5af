/**
 * Server Initialization
 *
 * This module handles the initialization and setup of the Axum HTTP
 * server: state creation, configuration loading, and route assembly.
 *
 * # Initialization Process
 *
 * 1. Load configuration from the environment
 * 2. Create the room registry, lock table, and board store
 * 3. Create and configure the router
 * 4. Start the periodic idle-room cleanup task
 *
 * Nothing is restored from disk: locks and room membership are ephemeral
 * by design, and a restart starts empty.
 */
use axum::Router;

use crate::backend::routes::router::create_router;
use crate::backend::server::config::{load_config, ServerConfig};
use crate::backend::server::state::AppState;

/// Create and configure the Axum application
///
/// Returns the configured router together with the loaded server
/// configuration (the caller needs the port).
pub async fn create_app() -> (Router, ServerConfig) {
    tracing::info!("Initializing Corkboard gateway");

    let server_config = load_config();
    let app_state = AppState::new(server_config.collab.clone());

    tracing::info!(
        "Gateway state initialized (heartbeat {}s, capture geometry {:?})",
        server_config.collab.heartbeat_secs,
        server_config.collab.capture_geometry
    );

    let app = create_router(app_state.clone());

    // Reap room channels whose last subscriber is gone
    let cleanup_rooms = app_state.rooms.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(300));
        loop {
            interval.tick().await;
            cleanup_rooms.cleanup_idle_rooms();
            tracing::debug!("Cleaned up idle room channels");
        }
    });

    (app, server_config)
}
