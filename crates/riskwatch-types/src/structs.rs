//! Core entity structs for the Riskwatch hazard pipeline.
//!
//! [`Event`] is the canonical unit every upstream record is normalized
//! into. On the wire it travels as the flat [`EventRecord`]; converting a
//! record into an event is where unplottable coordinates are absorbed.
//! Numeric fields decode leniently: a number or a numeric string is
//! accepted and anything else reads as absent.

use chrono::{DateTime, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use ts_rs::TS;

use crate::enums::{HazardType, SeverityLevel};
use crate::ids::EventKey;
use crate::time::parse_utc;

// ---------------------------------------------------------------------------
// Coordinates
// ---------------------------------------------------------------------------

/// A plottable `(lat, lon)` pair. Both components are always finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Coordinates {
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lon: f64,
}

impl Coordinates {
    /// Build coordinates from optional components.
    ///
    /// Returns `None` when either component is absent or not finite; such
    /// an event is geospatially unplottable.
    pub fn from_parts(lat: Option<f64>, lon: Option<f64>) -> Option<Self> {
        match (lat, lon) {
            (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => Some(Self { lat, lon }),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Hazard-specific attributes
// ---------------------------------------------------------------------------

/// Per-hazard attributes. The variant is the event's hazard discriminant.
#[derive(Debug, Clone, PartialEq)]
pub enum HazardDetails {
    /// Seismic attributes.
    Earthquake {
        /// Reported magnitude.
        magnitude: Option<f64>,
        /// Hypocentre depth in kilometres.
        depth_km: Option<f64>,
    },
    /// Flood attributes.
    Flood {
        /// Alert kind, e.g. `Flash Flood Warning`.
        subtype: Option<String>,
    },
}

impl HazardDetails {
    /// The hazard type this variant represents.
    pub const fn hazard_type(&self) -> HazardType {
        match self {
            Self::Earthquake { .. } => HazardType::Earthquake,
            Self::Flood { .. } => HazardType::Flood,
        }
    }
}

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// One normalized hazard event.
///
/// Serializes as an [`EventRecord`] so the provider API and the dashboard
/// share one wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "EventRecord", into = "EventRecord")]
pub struct Event {
    /// Origin feed identifier (`usgs`, `nws`, `uk_ea`, ...).
    pub source: String,
    /// Origin-assigned identifier, unique within `source`.
    pub source_event_id: String,
    /// Raw timestamp as reported. `None` means unknown time.
    pub time_utc: Option<String>,
    /// Human-readable location label.
    pub place: Option<String>,
    /// Plottable position, if the upstream record had one.
    pub coordinates: Option<Coordinates>,
    /// Hazard discriminant plus its specific attributes.
    pub details: HazardDetails,
    /// Fine-grained rank. Higher is more severe.
    pub severity_score: Option<f64>,
    /// Coarse classification driving color and visual weight.
    pub severity_level: SeverityLevel,
    /// Deep link to the source detail page.
    pub url: Option<String>,
}

impl Event {
    /// Hazard type of this event.
    pub const fn hazard_type(&self) -> HazardType {
        self.details.hazard_type()
    }

    /// Identity key used for de-duplication and rendering.
    pub fn key(&self) -> EventKey {
        EventKey::new(&self.source, &self.source_event_id)
    }

    /// Earthquake magnitude. Always `None` for other hazards.
    pub const fn magnitude(&self) -> Option<f64> {
        match self.details {
            HazardDetails::Earthquake { magnitude, .. } => magnitude,
            HazardDetails::Flood { .. } => None,
        }
    }

    /// Parsed timestamp. `None` when absent or unparseable.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.time_utc.as_deref().and_then(parse_utc)
    }

    /// Score used for ranking: the severity score, or 0 when absent or
    /// not a finite number.
    pub fn rank_score(&self) -> f64 {
        self.severity_score.filter(|s| s.is_finite()).unwrap_or(0.0)
    }

    /// Whether the event can be placed on a map.
    pub const fn is_plottable(&self) -> bool {
        self.coordinates.is_some()
    }
}

/// Flat wire form of an [`Event`], as emitted by the provider API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EventRecord {
    /// Origin feed identifier.
    pub source: String,
    /// Hazard discriminant.
    pub event_type: HazardType,
    /// Origin-assigned identifier.
    #[serde(default)]
    pub source_event_id: Option<String>,
    /// Timestamp string (ISO 8601).
    pub time_utc: Option<String>,
    /// Location label.
    pub place: Option<String>,
    /// Earthquake magnitude.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub magnitude: Option<f64>,
    /// Earthquake depth in kilometres.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub depth_km: Option<f64>,
    /// Longitude.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub lon: Option<f64>,
    /// Latitude.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub lat: Option<f64>,
    /// Numeric severity.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub severity_score: Option<f64>,
    /// Severity tier.
    pub severity_level: SeverityLevel,
    /// Source detail link.
    pub url: Option<String>,
    /// Flood alert kind.
    #[serde(default)]
    pub hazard_subtype: Option<String>,
}

/// Accept a JSON number or a numeric string; anything else is `None`.
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    #[allow(dead_code)]
    enum Loose {
        Number(f64),
        Text(String),
        Other(IgnoredAny),
    }

    Ok(match Option::<Loose>::deserialize(deserializer)? {
        Some(Loose::Number(n)) => Some(n),
        Some(Loose::Text(s)) => s.trim().parse().ok(),
        Some(Loose::Other(_)) | None => None,
    })
}

/// A wire record carried no usable `source_event_id`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{feed} record has no source_event_id")]
pub struct MissingEventId {
    /// Feed the record came from.
    pub feed: String,
}

impl TryFrom<EventRecord> for Event {
    type Error = MissingEventId;

    fn try_from(record: EventRecord) -> Result<Self, Self::Error> {
        let Some(source_event_id) = record
            .source_event_id
            .filter(|id| !id.trim().is_empty())
        else {
            return Err(MissingEventId {
                feed: record.source,
            });
        };

        let details = match record.event_type {
            HazardType::Earthquake => HazardDetails::Earthquake {
                magnitude: record.magnitude.filter(|m| m.is_finite()),
                depth_km: record.depth_km.filter(|d| d.is_finite()),
            },
            HazardType::Flood => HazardDetails::Flood {
                subtype: record.hazard_subtype,
            },
        };

        Ok(Self {
            source: record.source,
            source_event_id,
            time_utc: record.time_utc,
            place: record.place,
            coordinates: Coordinates::from_parts(record.lat, record.lon),
            details,
            severity_score: record.severity_score,
            severity_level: record.severity_level,
            url: record.url,
        })
    }
}

impl From<Event> for EventRecord {
    fn from(event: Event) -> Self {
        let event_type = event.hazard_type();
        let (magnitude, depth_km, hazard_subtype) = match event.details {
            HazardDetails::Earthquake {
                magnitude,
                depth_km,
            } => (magnitude, depth_km, None),
            HazardDetails::Flood { subtype } => (None, None, subtype),
        };

        Self {
            source: event.source,
            event_type,
            source_event_id: Some(event.source_event_id),
            time_utc: event.time_utc,
            place: event.place,
            magnitude,
            depth_km,
            lon: event.coordinates.map(|c| c.lon),
            lat: event.coordinates.map(|c| c.lat),
            severity_score: event.severity_score,
            severity_level: event.severity_level,
            url: event.url,
            hazard_subtype,
        }
    }
}

// ---------------------------------------------------------------------------
// Feed response
// ---------------------------------------------------------------------------

/// Response body of one feed query.
///
/// Decoding skips records without an id and recomputes `count` from what
/// was kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(from = "WireResponse")]
#[ts(export, export_to = "bindings/")]
pub struct EventsResponse {
    /// Hazard the query asked for.
    #[serde(default)]
    pub hazard: Option<HazardType>,
    /// Number of events returned.
    pub count: usize,
    /// Returned events. May be empty, never absent.
    #[ts(as = "Vec<EventRecord>")]
    pub events: Vec<Event>,
}

impl EventsResponse {
    /// Wrap a list of events, deriving `count`.
    pub const fn new(hazard: Option<HazardType>, events: Vec<Event>) -> Self {
        Self {
            hazard,
            count: events.len(),
            events,
        }
    }
}

#[derive(Deserialize)]
struct WireResponse {
    #[serde(default)]
    hazard: Option<HazardType>,
    events: Vec<EventRecord>,
}

impl From<WireResponse> for EventsResponse {
    fn from(wire: WireResponse) -> Self {
        let events = wire
            .events
            .into_iter()
            .filter_map(|record| Event::try_from(record).ok())
            .collect();
        Self::new(wire.hazard, events)
    }
}
