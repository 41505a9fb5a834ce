//! Upstream endpoint configuration.
//!
//! Mirrors the `upstream` section of `riskwatch-config.yaml`. Every field
//! has a default pointing at the public production feeds.

use std::time::Duration;

use serde::Deserialize;

/// USGS GeoJSON summary feed base URL.
pub const USGS_BASE_URL: &str = "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary";
/// NWS active alerts endpoint.
pub const NWS_ACTIVE_ALERTS_URL: &str = "https://api.weather.gov/alerts/active";
/// UK Environment Agency flood warnings endpoint.
pub const UK_EA_FLOODS_URL: &str = "https://environment.data.gov.uk/flood-monitoring/id/floods";

/// Where and how to reach the upstream hazard feeds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// USGS summary feed base URL; `/{feed}.geojson` is appended.
    pub usgs_base_url: String,
    /// NWS active alerts URL.
    pub nws_alerts_url: String,
    /// UK EA flood warnings URL.
    pub uk_ea_floods_url: String,
    /// `User-Agent` sent with every request. NWS rejects anonymous clients.
    pub user_agent: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Maximum affected-zone lookups per NWS fetch.
    pub zone_fetch_budget: u32,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            usgs_base_url: USGS_BASE_URL.to_owned(),
            nws_alerts_url: NWS_ACTIVE_ALERTS_URL.to_owned(),
            uk_ea_floods_url: UK_EA_FLOODS_URL.to_owned(),
            user_agent: String::from("Riskwatch/0.1 (hazard dashboard)"),
            timeout_secs: 20,
            zone_fetch_budget: 40,
        }
    }
}

impl UpstreamConfig {
    /// Per-request timeout.
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
