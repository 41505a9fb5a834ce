//! US National Weather Service flood alerts.
//!
//! Active alerts are queried once per flood event name, de-duplicated by
//! alert id, and positioned from their geometry. Alerts without geometry
//! fall back to the first affected forecast zone, within a per-fetch
//! budget so the NWS API is not hammered.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use riskwatch_types::{Coordinates, Event, HazardDetails};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::FeedError;
use crate::geometry::point_from_geometry;
use crate::http::get_json;
use crate::severity::{FloodAgency, level_from_nws, score_flood};

/// Source identifier stamped on NWS events.
pub const SOURCE: &str = "nws";

/// Alert event names treated as floods.
pub const FLOOD_EVENTS: [&str; 8] = [
    "Flood Warning",
    "Flood Watch",
    "Flash Flood Warning",
    "Flash Flood Watch",
    "Coastal Flood Warning",
    "Coastal Flood Watch",
    "Coastal Flood Advisory",
    "Flood Advisory",
];

/// An alerts page. Only the features are used.
#[derive(Debug, Clone, Default, Deserialize)]
struct AlertPage {
    #[serde(default)]
    features: Vec<Value>,
}

fn property<'a>(feature: &'a Value, key: &str) -> Option<&'a str> {
    feature
        .get("properties")
        .and_then(|p| p.get(key))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Alert identifier: `properties.id`, else the feature `id`.
pub fn alert_id(feature: &Value) -> Option<&str> {
    property(feature, "id").or_else(|| feature.get("id").and_then(Value::as_str))
}

/// URL of the first affected zone, if the alert lists any.
pub fn first_zone(feature: &Value) -> Option<&str> {
    feature
        .get("properties")?
        .get("affectedZones")?
        .get(0)?
        .as_str()
}

/// Normalize one alert feature.
///
/// `position` overrides the alert geometry (used for the zone fallback).
/// Returns `None` when the alert has no identifier.
pub fn normalize_alert(
    feature: &Value,
    position: Option<Coordinates>,
    now: DateTime<Utc>,
) -> Option<Event> {
    let id = alert_id(feature)?;
    let event_name = property(feature, "event");
    let level = level_from_nws(property(feature, "severity"));
    let score = score_flood(FloodAgency::Nws, level, event_name);

    let time_utc = property(feature, "sent")
        .or_else(|| property(feature, "effective"))
        .map_or_else(|| now.to_rfc3339(), ToOwned::to_owned);

    let place = property(feature, "areaDesc")
        .or_else(|| property(feature, "headline"))
        .or(event_name)
        .unwrap_or("NWS Flood Alert");

    let url = property(feature, "web").or_else(|| property(feature, "@id"));

    Some(Event {
        source: SOURCE.to_owned(),
        source_event_id: id.to_owned(),
        time_utc: Some(time_utc),
        place: Some(place.to_owned()),
        coordinates: position.or_else(|| point_from_geometry(feature.get("geometry"))),
        details: HazardDetails::Flood {
            subtype: event_name.map(ToOwned::to_owned),
        },
        severity_score: Some(f64::from(score)),
        severity_level: level,
        url: url.map(ToOwned::to_owned),
    })
}

/// Client for the NWS active alerts API.
#[derive(Debug, Clone)]
pub struct NwsClient {
    client: reqwest::Client,
    alerts_url: String,
    zone_fetch_budget: u32,
}

impl NwsClient {
    /// Create a client against `alerts_url`.
    pub fn new(client: reqwest::Client, alerts_url: &str, zone_fetch_budget: u32) -> Self {
        Self {
            client,
            alerts_url: alerts_url.to_owned(),
            zone_fetch_budget,
        }
    }

    async fn fetch_page(&self, event_name: &str) -> Result<Vec<Value>, FeedError> {
        let request = self
            .client
            .get(&self.alerts_url)
            .query(&[("event", event_name)])
            .header("Accept", "application/geo+json");
        let page: AlertPage = get_json(request, SOURCE).await?;
        Ok(page.features)
    }

    /// Representative point of a forecast zone. Failures are absorbed.
    async fn fetch_zone_point(&self, zone_url: &str) -> Option<Coordinates> {
        let request = self
            .client
            .get(zone_url)
            .header("Accept", "application/geo+json");
        match get_json::<Value>(request, SOURCE).await {
            Ok(zone) => point_from_geometry(zone.get("geometry")),
            Err(e) => {
                debug!(zone_url, error = %e, "NWS zone lookup failed");
                None
            }
        }
    }

    /// Fetch up to `limit` flood alerts across every flood event name.
    ///
    /// Any failed alerts page fails the whole fetch.
    pub async fn fetch_flood_alerts(&self, limit: usize) -> Result<Vec<Event>, FeedError> {
        let pages = try_join_all(FLOOD_EVENTS.iter().map(|name| self.fetch_page(name))).await?;

        let now = Utc::now();
        let mut seen: HashSet<String> = HashSet::new();
        let mut events = Vec::new();
        let mut zone_budget = self.zone_fetch_budget;

        for feature in pages.iter().flatten() {
            if events.len() >= limit {
                break;
            }
            let Some(id) = alert_id(feature) else {
                continue;
            };
            if !seen.insert(id.to_owned()) {
                continue;
            }

            let mut position = point_from_geometry(feature.get("geometry"));
            if position.is_none()
                && zone_budget > 0
                && let Some(zone_url) = first_zone(feature)
            {
                position = self.fetch_zone_point(zone_url).await;
                zone_budget = zone_budget.saturating_sub(1);
            }

            if let Some(event) = normalize_alert(feature, position, now) {
                events.push(event);
            }
        }

        debug!(count = events.len(), "NWS flood alerts fetched");
        Ok(events)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use riskwatch_types::{HazardType, SeverityLevel};
    use serde_json::json;

    use super::*;

    fn alert() -> Value {
        json!({
            "id": "https://api.weather.gov/alerts/urn:oid:2.49.0.1.840.0.abc",
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[-90.0, 30.0], [-88.0, 30.0], [-88.0, 32.0], [-90.0, 32.0]]]
            },
            "properties": {
                "id": "urn:oid:2.49.0.1.840.0.abc",
                "event": "Flash Flood Warning",
                "severity": "Severe",
                "sent": "2024-06-01T12:00:00-05:00",
                "areaDesc": "Orleans, LA",
                "affectedZones": ["https://api.weather.gov/zones/county/LAC071"]
            }
        })
    }

    #[test]
    fn alert_normalizes_to_flood_event() {
        let now = Utc::now();
        let event = normalize_alert(&alert(), None, now).unwrap();
        assert_eq!(event.hazard_type(), HazardType::Flood);
        assert_eq!(event.source_event_id, "urn:oid:2.49.0.1.840.0.abc");
        assert_eq!(event.severity_level, SeverityLevel::High);
        assert_eq!(event.severity_score, Some(80.0));
        assert_eq!(event.place.as_deref(), Some("Orleans, LA"));
        let c = event.coordinates.unwrap();
        assert_eq!(c.lat, 31.0);
        assert_eq!(c.lon, -89.0);
        assert_eq!(
            event.details,
            HazardDetails::Flood {
                subtype: Some(String::from("Flash Flood Warning"))
            }
        );
    }

    #[test]
    fn alert_without_geometry_uses_supplied_position() {
        let mut feature = alert();
        feature["geometry"] = Value::Null;
        let fallback = Coordinates::from_parts(Some(29.9), Some(-90.1));
        let event = normalize_alert(&feature, fallback, Utc::now()).unwrap();
        assert_eq!(event.coordinates, fallback);
        assert_eq!(
            first_zone(&feature),
            Some("https://api.weather.gov/zones/county/LAC071")
        );
    }

    #[test]
    fn alert_without_time_is_stamped_now() {
        let mut feature = alert();
        feature["properties"]["sent"] = Value::Null;
        let now = Utc::now();
        let event = normalize_alert(&feature, None, now).unwrap();
        assert_eq!(event.time_utc, Some(now.to_rfc3339()));
    }

    #[test]
    fn place_falls_back_to_event_name_then_default() {
        let mut feature = alert();
        feature["properties"]["areaDesc"] = Value::Null;
        let event = normalize_alert(&feature, None, Utc::now()).unwrap();
        assert_eq!(event.place.as_deref(), Some("Flash Flood Warning"));

        feature["properties"]["event"] = Value::Null;
        let event = normalize_alert(&feature, None, Utc::now()).unwrap();
        assert_eq!(event.place.as_deref(), Some("NWS Flood Alert"));
    }

    #[test]
    fn alert_without_any_id_is_skipped() {
        let feature = json!({"properties": {"event": "Flood Watch"}});
        assert!(normalize_alert(&feature, None, Utc::now()).is_none());
    }
}
