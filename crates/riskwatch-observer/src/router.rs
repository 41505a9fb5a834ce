//! Axum router construction for the dashboard API.
//!
//! Assembles all routes (REST + `WebSocket`) into a single [`Router`]
//! with CORS middleware enabled for cross-origin dashboard access.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /` -- minimal HTML status page
/// - `GET /health` -- liveness probe
/// - `GET /events` -- provider feed query
/// - `GET /ws/cycles` -- `WebSocket` cycle summary stream
/// - `GET /api/status` -- poller status
/// - `GET /api/events` -- filtered event list
/// - `GET /api/map` -- map scene
/// - `POST /api/map/{mode,toggle,reset,visible}` -- map controls
///
/// CORS allows any origin; the provider endpoint is read-only.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Status page
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        // Provider
        .route("/events", get(handlers::provider_events))
        // WebSocket
        .route("/ws/cycles", get(ws::ws_cycles))
        // Dashboard API
        .route("/api/status", get(handlers::get_status))
        .route("/api/events", get(handlers::list_events))
        .route("/api/map", get(handlers::get_map))
        .route("/api/map/mode", post(handlers::set_mode))
        .route("/api/map/toggle", post(handlers::toggle_mode))
        .route("/api/map/reset", post(handlers::reset_view))
        .route("/api/map/visible", post(handlers::mark_visible))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
