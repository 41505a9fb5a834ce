//! Heat-layer input: one weighted point per geocoded event.

use riskwatch_types::Event;
use serde::Serialize;
use ts_rs::TS;

/// Weight given to events without a usable severity score.
pub const DEFAULT_WEIGHT: f64 = 1.0;

/// A weighted sample for the density surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct HeatPoint {
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lon: f64,
    /// Intensity contribution.
    pub weight: f64,
}

/// The severity score if present and finite, else [`DEFAULT_WEIGHT`].
pub fn heat_weight(event: &Event) -> f64 {
    event
        .severity_score
        .filter(|s| s.is_finite())
        .unwrap_or(DEFAULT_WEIGHT)
}

/// Weighted points for every event with valid coordinates.
pub fn estimate<'a>(events: impl IntoIterator<Item = &'a Event>) -> Vec<HeatPoint> {
    events
        .into_iter()
        .filter_map(|event| {
            event.coordinates.map(|c| HeatPoint {
                lat: c.lat,
                lon: c.lon,
                weight: heat_weight(event),
            })
        })
        .collect()
}

/// Largest weight in `points`, for intensity normalization. `None` when
/// there are no points.
pub fn max_weight(points: &[HeatPoint]) -> Option<f64> {
    points.iter().map(|p| p.weight).reduce(f64::max)
}
