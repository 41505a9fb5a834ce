//! Server startup helper for the service binary.
//!
//! Provides [`spawn_observer`] which launches the HTTP + `WebSocket`
//! server on a background Tokio task so it runs alongside the poller.

use std::future::Future;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::server::{ServerConfig, ServerError};
use crate::state::AppState;

/// Errors that can occur when spawning the server.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The server failed to bind or start.
    #[error("server start error: {0}")]
    Server(#[from] ServerError),
}

/// Spawn the HTTP server on a background Tokio task.
///
/// The address is validated eagerly so obvious misconfigurations fail
/// before the task is spawned. The server stops when `shutdown`
/// resolves; the caller should await the returned handle afterwards.
///
/// # Errors
///
/// Returns [`StartupError::Server`] if the configured address does not
/// parse.
pub fn spawn_observer(
    config: ServerConfig,
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<JoinHandle<()>, StartupError> {
    let addr = config.addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = crate::server::start_server(&config, state, shutdown).await {
            tracing::error!(error = %e, "Dashboard server exited with error");
        }
    });

    tracing::info!(%addr, "Dashboard server spawned on background task");

    Ok(handle)
}
