//! Service binary for Riskwatch.
//!
//! Wires the upstream provider, the feed backend, the poller, and the
//! dashboard API together and runs until `Ctrl-C`.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `riskwatch-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Build the upstream provider
//! 4. Select the feed backend (remote provider API or in-process)
//! 5. Start the poller
//! 6. Start the dashboard API server
//! 7. Wait for `Ctrl-C`, then stop the poller and drain the server

mod error;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use riskwatch_core::render::MapDefaults;
use riskwatch_core::{Poller, ServiceConfig};
use riskwatch_feeds::{EventProvider, create_source};
use riskwatch_observer::{AppState, ServerConfig, spawn_observer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::ServiceError;

const CONFIG_PATH: &str = "riskwatch-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, client construction, or server
/// startup fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration.
    let (config, from_file) = load_config()?;

    // 2. Initialize structured logging. RUST_LOG wins over the config.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!("riskwatch-server starting");
    if !from_file {
        info!("Config file not found, using defaults");
    }
    info!(
        interval_secs = config.poller.interval_secs,
        earthquake_feed = %config.poller.earthquake.feed,
        feed_api = config.feed_api.url.as_deref().unwrap_or("in-process"),
        port = config.server.port,
        "Configuration loaded"
    );

    // 3. Build the upstream provider.
    let provider = Arc::new(EventProvider::new(&config.upstream).map_err(ServiceError::from)?);

    // 4. Select the feed backend.
    let source = create_source(
        config.feed_api.url.as_deref(),
        &config.upstream,
        &provider,
    )
    .map_err(ServiceError::from)?;
    info!(backend = source.name(), "Feed backend selected");

    // 5. Start the poller.
    let mut poller = Poller::from_config(source, &config.poller);
    poller.start();

    // 6. Start the dashboard API server.
    let state = Arc::new(
        AppState::new(poller.subscribe(), MapDefaults::from_config(&config.map))
            .with_provider(provider),
    );
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };
    let server = spawn_observer(server_config, state, async move {
        let _ = shutdown_rx.await;
    })
    .map_err(ServiceError::from)?;

    // 7. Run until interrupted.
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    info!("Shutdown requested");

    poller.stop();
    if shutdown_tx.send(()).is_err() {
        warn!("Dashboard server already exited");
    }
    if let Err(e) = server.await {
        warn!(error = %e, "Dashboard server task failed");
    }

    info!("riskwatch-server stopped");
    Ok(())
}

/// Load configuration from `riskwatch-config.yaml`, falling back to
/// defaults when the file is absent. Environment overrides apply either
/// way. The flag reports whether the file was read.
fn load_config() -> Result<(ServiceConfig, bool), ServiceError> {
    let config_path = Path::new(CONFIG_PATH);
    if config_path.exists() {
        Ok((ServiceConfig::from_file(config_path)?, true))
    } else {
        let mut config = ServiceConfig::default();
        config.apply_env_overrides();
        Ok((config, false))
    }
}
