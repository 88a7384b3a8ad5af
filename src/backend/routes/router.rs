/**
 * Route Configuration
 *
 * This module assembles the Axum router. The gateway exposes exactly two
 * endpoints: the WebSocket upgrade that carries the entire
 * synchronization protocol, and a health probe.
 */
use axum::routing::get;
use axum::Router;

use crate::backend::gateway::connection::handle_upgrade;
use crate::backend::server::state::AppState;

/// Create the application router with all routes
pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/ws", get(handle_upgrade))
        .route("/health", get(health))
        .with_state(app_state)
}

/// Liveness probe (GET /health)
async fn health() -> &'static str {
    "ok"
}
