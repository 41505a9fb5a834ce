//! UK Environment Agency flood warnings.

use chrono::{DateTime, Utc};
use riskwatch_types::{Coordinates, Event, HazardDetails};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::FeedError;
use crate::http::get_json;
use crate::severity::{FloodAgency, level_from_uk, score_flood};

/// Source identifier stamped on UK EA events.
pub const SOURCE: &str = "uk_ea";

#[derive(Debug, Clone, Default, Deserialize)]
struct FloodPage {
    #[serde(default)]
    items: Vec<Value>,
}

fn text<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// Numeric field that may be published as a number or a numeric string.
fn number(value: &Value, key: &str) -> Option<f64> {
    let field = value.get(key)?;
    field
        .as_f64()
        .or_else(|| field.as_str().and_then(|s| s.trim().parse().ok()))
}

/// Normalize one flood warning item.
pub fn normalize_item(item: &Value, now: DateTime<Utc>) -> Event {
    let severity_level = item.get("severityLevel").and_then(Value::as_i64);
    let level = level_from_uk(severity_level);
    let score = score_flood(FloodAgency::UkEa(severity_level), level, None);

    let area = item.get("floodArea").unwrap_or(&Value::Null);
    let place = text(area, "label")
        .or_else(|| text(area, "areaName"))
        .or_else(|| text(item, "description"))
        .unwrap_or("UK Flood Alert");

    let id = text(item, "@id")
        .or_else(|| text(item, "floodAreaID"))
        .unwrap_or(place);

    let time_utc = text(item, "timeRaised").map_or_else(|| now.to_rfc3339(), ToOwned::to_owned);

    Event {
        source: SOURCE.to_owned(),
        source_event_id: id.to_owned(),
        time_utc: Some(time_utc),
        place: Some(place.to_owned()),
        coordinates: Coordinates::from_parts(number(area, "lat"), number(area, "long")),
        details: HazardDetails::Flood {
            subtype: text(item, "severity").map(ToOwned::to_owned),
        },
        severity_score: Some(f64::from(score)),
        severity_level: level,
        url: text(item, "@id").map(ToOwned::to_owned),
    }
}

/// Client for the UK EA flood monitoring API.
#[derive(Debug, Clone)]
pub struct UkEaClient {
    client: reqwest::Client,
    floods_url: String,
}

impl UkEaClient {
    /// Create a client against `floods_url`.
    pub fn new(client: reqwest::Client, floods_url: &str) -> Self {
        Self {
            client,
            floods_url: floods_url.to_owned(),
        }
    }

    /// Fetch up to `limit` current flood warnings.
    pub async fn fetch_flood_alerts(&self, limit: usize) -> Result<Vec<Event>, FeedError> {
        let page: FloodPage = get_json(self.client.get(&self.floods_url), SOURCE).await?;
        let now = Utc::now();
        let events: Vec<Event> = page
            .items
            .iter()
            .take(limit)
            .map(|item| normalize_item(item, now))
            .collect();
        debug!(count = events.len(), "UK EA flood warnings fetched");
        Ok(events)
    }
}
