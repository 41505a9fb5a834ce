//! Dashboard API server for Riskwatch.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **`WebSocket` endpoint** (`/ws/cycles`) streaming a summary every
//!   time the poller's snapshot changes
//! - **Dashboard endpoints** for the filtered event list, the map scene,
//!   and the map controls (mode, toggle, reset, visibility)
//! - **Provider endpoint** (`/events`) answering feed queries straight
//!   from the upstream agencies
//! - **Minimal HTML status page** (`GET /`)
//!
//! # Architecture
//!
//! Handlers read the published collection from a `watch` receiver on the
//! poller, so no request ever blocks or triggers a poll cycle. Filtering
//! goes through a shared memo keyed on the collection generation.

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use startup::{StartupError, spawn_observer};
pub use state::{AppState, CycleSummary};
