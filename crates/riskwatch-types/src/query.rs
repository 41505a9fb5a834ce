//! Feed query parameters shared by the provider endpoint and its clients.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{HazardType, SeverityLevel};

/// Default USGS summary feed.
pub const DEFAULT_FEED: &str = "all_day";
/// Default maximum result count.
pub const DEFAULT_LIMIT: u32 = 50;
/// Largest accepted result count.
pub const MAX_LIMIT: u32 = 200;
/// Default lookback window in hours.
pub const DEFAULT_SINCE_HOURS: u32 = 24;
/// Longest accepted lookback window in hours (one week).
pub const MAX_SINCE_HOURS: u32 = 168;

/// One feed query. Every field except `hazard` has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct FeedQuery {
    /// Which hazard stream to return.
    #[serde(default = "default_hazard")]
    pub hazard: HazardType,
    /// Named earthquake feed (`all_hour`, `all_day`, `4.5_week`, ...).
    /// Ignored for other hazards.
    #[serde(default = "default_feed")]
    pub feed: String,
    /// Maximum number of events.
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Earthquake-only lower magnitude bound.
    #[serde(default)]
    pub min_magnitude: Option<f64>,
    /// Lookback window. `None` disables the window.
    #[serde(default = "default_since_hours")]
    pub since_hours: Option<u32>,
    /// Drop events below this severity tier.
    #[serde(default)]
    pub min_severity_level: Option<SeverityLevel>,
}

const fn default_hazard() -> HazardType {
    HazardType::Earthquake
}

fn default_feed() -> String {
    DEFAULT_FEED.to_owned()
}

const fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

#[allow(clippy::unnecessary_wraps)]
const fn default_since_hours() -> Option<u32> {
    Some(DEFAULT_SINCE_HOURS)
}

impl Default for FeedQuery {
    fn default() -> Self {
        Self::for_hazard(HazardType::Earthquake)
    }
}

impl FeedQuery {
    /// A query for `hazard` with every other parameter defaulted.
    pub fn for_hazard(hazard: HazardType) -> Self {
        Self {
            hazard,
            feed: default_feed(),
            limit: DEFAULT_LIMIT,
            min_magnitude: None,
            since_hours: default_since_hours(),
            min_severity_level: None,
        }
    }

    /// Set the result cap.
    #[must_use]
    pub const fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Set the lookback window.
    #[must_use]
    pub const fn with_since_hours(mut self, hours: u32) -> Self {
        self.since_hours = Some(hours);
        self
    }

    /// Set the named earthquake feed.
    #[must_use]
    pub fn with_feed(mut self, feed: &str) -> Self {
        feed.clone_into(&mut self.feed);
        self
    }

    /// Query-string pairs for an HTTP request.
    ///
    /// Earthquake-only parameters are omitted for other hazards.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("hazard", self.hazard.as_str().to_owned()),
            ("limit", self.limit.to_string()),
        ];
        if self.hazard == HazardType::Earthquake {
            pairs.push(("feed", self.feed.clone()));
            if let Some(min) = self.min_magnitude {
                pairs.push(("min_magnitude", min.to_string()));
            }
        }
        if let Some(hours) = self.since_hours {
            pairs.push(("since_hours", hours.to_string()));
        }
        if let Some(level) = self.min_severity_level {
            pairs.push(("min_severity_level", level.as_str().to_owned()));
        }
        pairs
    }
}
