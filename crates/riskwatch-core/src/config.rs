//! Configuration loading and typed config structures for Riskwatch.
//!
//! The canonical configuration lives in `riskwatch-config.yaml` at the
//! project root. Every section and field is optional; omitted values take
//! the defaults below.

use std::path::Path;
use std::time::Duration;

use riskwatch_feeds::UpstreamConfig;
use riskwatch_types::query::{DEFAULT_FEED, MAX_LIMIT};
use riskwatch_types::{Coordinates, FeedQuery, HazardType};
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level service configuration, mirroring `riskwatch-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ServiceConfig {
    /// Poll cadence and per-hazard queries.
    #[serde(default)]
    pub poller: PollerConfig,

    /// Upstream agency endpoints.
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Optional remote provider API.
    #[serde(default)]
    pub feed_api: FeedApiConfig,

    /// Map surface defaults.
    #[serde(default)]
    pub map: MapConfig,

    /// HTTP listener.
    #[serde(default)]
    pub server: ServerSection,

    /// Logging.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ServiceConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `RISKWATCH_FEED_API_URL` overrides `feed_api.url`
    /// - `RISKWATCH_HOST` overrides `server.host`
    /// - `RISKWATCH_PORT` overrides `server.port`
    /// - `RISKWATCH_POLL_INTERVAL_SECS` overrides `poller.interval_secs`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yml::from_str(&contents)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string. No environment overrides
    /// are applied.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply overrides from `lookup`. Values that fail to parse are
    /// ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("RISKWATCH_FEED_API_URL") {
            self.feed_api.url = Some(url).filter(|u| !u.trim().is_empty());
        }
        if let Some(host) = lookup("RISKWATCH_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("RISKWATCH_PORT").and_then(|v| v.parse().ok()) {
            self.server.port = port;
        }
        if let Some(secs) = lookup("RISKWATCH_POLL_INTERVAL_SECS").and_then(|v| v.parse().ok()) {
            self.poller.interval_secs = secs;
        }
    }
}

// ---------------------------------------------------------------------------
// Poller
// ---------------------------------------------------------------------------

/// Poll cadence and the two per-cycle queries.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PollerConfig {
    /// Seconds between cycle starts.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Earthquake query issued each cycle.
    #[serde(default)]
    pub earthquake: EarthquakeQueryConfig,

    /// Flood query issued each cycle.
    #[serde(default)]
    pub flood: FloodQueryConfig,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            earthquake: EarthquakeQueryConfig::default(),
            flood: FloodQueryConfig::default(),
        }
    }
}

impl PollerConfig {
    /// Interval between cycle starts.
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

const fn default_interval_secs() -> u64 {
    60
}

/// Earthquake query parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EarthquakeQueryConfig {
    /// Named USGS feed.
    #[serde(default = "default_feed")]
    pub feed: String,
    /// Result cap.
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Lookback window in hours.
    #[serde(default = "default_earthquake_since_hours")]
    pub since_hours: u32,
    /// Lower magnitude bound applied upstream.
    #[serde(default)]
    pub min_magnitude: Option<f64>,
}

impl Default for EarthquakeQueryConfig {
    fn default() -> Self {
        Self {
            feed: default_feed(),
            limit: default_limit(),
            since_hours: default_earthquake_since_hours(),
            min_magnitude: None,
        }
    }
}

impl EarthquakeQueryConfig {
    /// The feed query this section describes.
    pub fn to_query(&self) -> FeedQuery {
        let mut query = FeedQuery::for_hazard(HazardType::Earthquake)
            .with_feed(&self.feed)
            .with_limit(self.limit)
            .with_since_hours(self.since_hours);
        query.min_magnitude = self.min_magnitude;
        query
    }
}

/// Flood query parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FloodQueryConfig {
    /// Result cap.
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Lookback window in hours.
    #[serde(default = "default_flood_since_hours")]
    pub since_hours: u32,
}

impl Default for FloodQueryConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            since_hours: default_flood_since_hours(),
        }
    }
}

impl FloodQueryConfig {
    /// The feed query this section describes.
    pub fn to_query(&self) -> FeedQuery {
        FeedQuery::for_hazard(HazardType::Flood)
            .with_limit(self.limit)
            .with_since_hours(self.since_hours)
    }
}

fn default_feed() -> String {
    DEFAULT_FEED.to_owned()
}

const fn default_limit() -> u32 {
    MAX_LIMIT
}

const fn default_earthquake_since_hours() -> u32 {
    24
}

const fn default_flood_since_hours() -> u32 {
    72
}

// ---------------------------------------------------------------------------
// Feed API
// ---------------------------------------------------------------------------

/// Remote provider API settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FeedApiConfig {
    /// Base URL of a remote provider. When unset the service fetches the
    /// upstream agencies itself.
    #[serde(default)]
    pub url: Option<String>,
}

// ---------------------------------------------------------------------------
// Map
// ---------------------------------------------------------------------------

/// Map surface defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MapConfig {
    /// Default view center latitude.
    #[serde(default = "default_center_lat")]
    pub default_center_lat: f64,
    /// Default view center longitude.
    #[serde(default = "default_center_lon")]
    pub default_center_lon: f64,
    /// Default zoom level (whole world).
    #[serde(default = "default_zoom")]
    pub default_zoom: u8,
    /// Delay before the surface re-measures itself after becoming visible.
    #[serde(default = "default_remeasure_delay_ms")]
    pub remeasure_delay_ms: u64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            default_center_lat: default_center_lat(),
            default_center_lon: default_center_lon(),
            default_zoom: default_zoom(),
            remeasure_delay_ms: default_remeasure_delay_ms(),
        }
    }
}

impl MapConfig {
    /// Default view center. Falls back to the built-in center when the
    /// configured one is not finite.
    pub fn default_center(&self) -> Coordinates {
        Coordinates::from_parts(Some(self.default_center_lat), Some(self.default_center_lon))
            .unwrap_or(Coordinates {
                lat: default_center_lat(),
                lon: default_center_lon(),
            })
    }
}

const fn default_center_lat() -> f64 {
    20.0
}

const fn default_center_lon() -> f64 {
    0.0
}

const fn default_zoom() -> u8 {
    2
}

const fn default_remeasure_delay_ms() -> u64 {
    200
}

// ---------------------------------------------------------------------------
// Server and logging
// ---------------------------------------------------------------------------

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerSection {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,
    /// TCP port.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    String::from("0.0.0.0")
}

const fn default_port() -> u16 {
    8000
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    String::from("info")
}
