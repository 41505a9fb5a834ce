//! USGS earthquake summary feed.
//!
//! Fetches `{base}/{feed}.geojson` and normalizes each feature into an
//! [`Event`]. Feature coordinates are `[lon, lat, depth_km]` and times are
//! epoch milliseconds.

use chrono::{DateTime, SecondsFormat};
use riskwatch_types::{Coordinates, Event, HazardDetails};
use serde::Deserialize;
use tracing::debug;

use crate::error::FeedError;
use crate::http::get_json;
use crate::severity::score_earthquake;

/// Source identifier stamped on USGS events.
pub const SOURCE: &str = "usgs";

/// A GeoJSON feature collection as served by the summary feeds.
#[derive(Debug, Clone, Deserialize)]
pub struct UsgsCollection {
    /// Earthquake features, newest first.
    #[serde(default)]
    pub features: Vec<UsgsFeature>,
}

/// One earthquake feature.
#[derive(Debug, Clone, Deserialize)]
pub struct UsgsFeature {
    /// Event id, e.g. `us7000abcd`.
    #[serde(default)]
    pub id: Option<String>,
    /// Descriptive properties.
    #[serde(default)]
    pub properties: UsgsProperties,
    /// Point geometry.
    #[serde(default)]
    pub geometry: Option<UsgsGeometry>,
}

/// Feature properties used by the normalizer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UsgsProperties {
    /// Magnitude.
    #[serde(default)]
    pub mag: Option<f64>,
    /// Location description.
    #[serde(default)]
    pub place: Option<String>,
    /// Origin time, epoch milliseconds.
    #[serde(default)]
    pub time: Option<i64>,
    /// Event page.
    #[serde(default)]
    pub url: Option<String>,
}

/// Point geometry `[lon, lat, depth_km]`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UsgsGeometry {
    /// Raw coordinate triple. Entries may be null.
    #[serde(default)]
    pub coordinates: Vec<Option<f64>>,
}

/// Normalize one USGS feature.
pub fn normalize_feature(feature: UsgsFeature) -> Event {
    let coords = feature.geometry.map(|g| g.coordinates).unwrap_or_default();
    let component = |i: usize| coords.get(i).copied().flatten();
    let (lon, lat, depth_km) = (component(0), component(1), component(2));

    let magnitude = feature.properties.mag;
    let (score, level) = score_earthquake(magnitude, depth_km);

    let time_utc = feature
        .properties
        .time
        .and_then(DateTime::from_timestamp_millis)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, false));

    Event {
        source: SOURCE.to_owned(),
        source_event_id: feature.id.unwrap_or_default(),
        time_utc,
        place: feature.properties.place,
        coordinates: Coordinates::from_parts(lat, lon),
        details: HazardDetails::Earthquake {
            magnitude,
            depth_km,
        },
        severity_score: Some(f64::from(score)),
        severity_level: level,
        url: feature.properties.url,
    }
}

/// Normalize a whole collection, dropping features below `min_magnitude`.
///
/// Features with no magnitude are kept: their magnitude cannot be compared.
pub fn normalize_collection(collection: UsgsCollection, min_magnitude: Option<f64>) -> Vec<Event> {
    collection
        .features
        .into_iter()
        .filter(|f| match (min_magnitude, f.properties.mag) {
            (Some(min), Some(mag)) => mag >= min,
            _ => true,
        })
        .map(normalize_feature)
        .collect()
}

/// Client for the USGS summary feeds.
#[derive(Debug, Clone)]
pub struct UsgsClient {
    client: reqwest::Client,
    base_url: String,
}

impl UsgsClient {
    /// Create a client against `base_url`.
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    /// Fetch and normalize the named feed (`all_hour`, `all_day`, ...).
    pub async fn fetch_recent(
        &self,
        feed: &str,
        min_magnitude: Option<f64>,
    ) -> Result<Vec<Event>, FeedError> {
        let url = format!("{}/{feed}.geojson", self.base_url);
        let collection: UsgsCollection = get_json(self.client.get(&url), SOURCE).await?;
        let events = normalize_collection(collection, min_magnitude);
        debug!(feed, count = events.len(), "USGS feed fetched");
        Ok(events)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use riskwatch_types::{HazardType, SeverityLevel};
    use serde_json::json;

    use super::*;

    fn sample() -> UsgsCollection {
        serde_json::from_value(json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "id": "ci40000001",
                    "properties": {
                        "mag": 6.2,
                        "place": "12 km SW of Ridgecrest, CA",
                        "time": 1_700_000_000_000_i64,
                        "url": "https://earthquake.usgs.gov/earthquakes/eventpage/ci40000001"
                    },
                    "geometry": {"type": "Point", "coordinates": [-117.6, 35.7, 8.0]}
                },
                {
                    "id": "ak0001",
                    "properties": {"mag": 1.1, "place": "Alaska", "time": null},
                    "geometry": {"type": "Point", "coordinates": [-150.0, 61.0, 90.0]}
                },
                {
                    "id": "nc0002",
                    "properties": {"mag": null},
                    "geometry": null
                }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn feature_normalizes_with_score_and_coordinates() {
        let events = normalize_collection(sample(), None);
        assert_eq!(events.len(), 3);

        let first = &events[0];
        assert_eq!(first.hazard_type(), HazardType::Earthquake);
        assert_eq!(first.source, "usgs");
        assert_eq!(first.magnitude(), Some(6.2));
        // 70 for M6.x, +10 for a shallow 8 km depth.
        assert_eq!(first.severity_score, Some(80.0));
        assert_eq!(first.severity_level, SeverityLevel::Critical);
        let c = first.coordinates.unwrap();
        assert_eq!(c.lat, 35.7);
        assert_eq!(c.lon, -117.6);
        assert_eq!(first.time_utc.as_deref(), Some("2023-11-14T22:13:20.000+00:00"));
    }

    #[test]
    fn missing_time_and_geometry_still_normalize() {
        let events = normalize_collection(sample(), None);
        assert!(events[1].time_utc.is_none());
        assert!(!events[2].is_plottable());
        assert_eq!(events[2].severity_level, SeverityLevel::Low);
    }

    #[test]
    fn min_magnitude_keeps_unknown_magnitudes() {
        let events = normalize_collection(sample(), Some(2.5));
        let ids: Vec<&str> = events.iter().map(|e| e.source_event_id.as_str()).collect();
        assert_eq!(ids, ["ci40000001", "nc0002"]);
    }
}
