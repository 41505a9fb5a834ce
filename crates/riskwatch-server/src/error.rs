//! Error types for the service binary.
//!
//! [`ServiceError`] wraps every failure mode during startup so `main`
//! can propagate with `?`.

/// Top-level error for the service binary.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: riskwatch_core::ConfigError,
    },

    /// The feed client could not be built.
    #[error("feed error: {source}")]
    Feed {
        /// The underlying feed error.
        #[from]
        source: riskwatch_feeds::FeedError,
    },

    /// The dashboard server failed to start.
    #[error("observer error: {source}")]
    Observer {
        /// The underlying startup error.
        #[from]
        source: riskwatch_observer::StartupError,
    },
}
