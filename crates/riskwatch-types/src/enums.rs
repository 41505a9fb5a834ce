//! Enumeration types for the Riskwatch hazard pipeline.
//!
//! Hazard categories, the four-tier severity scale, the dashboard's hazard
//! selector, and the two mutually exclusive map projection modes.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Error returned when a string does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    /// Which enumeration was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

// ---------------------------------------------------------------------------
// Hazard types
// ---------------------------------------------------------------------------

/// Category of disaster event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum HazardType {
    /// Seismic event reported by a seismological feed.
    Earthquake,
    /// Flood alert, watch, or warning.
    Flood,
}

impl HazardType {
    /// Every supported hazard, in feed order.
    pub const ALL: [Self; 2] = [Self::Earthquake, Self::Flood];

    /// Lowercase wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Earthquake => "earthquake",
            Self::Flood => "flood",
        }
    }
}

impl fmt::Display for HazardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HazardType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "earthquake" => Ok(Self::Earthquake),
            "flood" => Ok(Self::Flood),
            other => Err(UnknownVariant {
                kind: "hazard type",
                value: other.to_owned(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// Coarse four-tier severity classification.
///
/// Variant order is significant: `Low < Medium < High < Critical`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum SeverityLevel {
    /// Minor event.
    #[default]
    Low,
    /// Moderate event.
    Medium,
    /// Severe event.
    High,
    /// Extreme event.
    Critical,
}

impl SeverityLevel {
    /// Numeric rank, 1 (low) through 4 (critical).
    pub const fn rank(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
            Self::Critical => 4,
        }
    }

    /// Lowercase wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// Uppercased label shown in event detail popups.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeverityLevel {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            other => Err(UnknownVariant {
                kind: "severity level",
                value: other.to_owned(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Dashboard selectors
// ---------------------------------------------------------------------------

/// Hazard selector driving the filter engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum HazardSelector {
    /// Every hazard (identity filter).
    #[default]
    All,
    /// Earthquakes only.
    Earthquake,
    /// Floods only.
    Flood,
}

impl HazardSelector {
    /// Whether events of `hazard` pass this selector.
    pub const fn admits(self, hazard: HazardType) -> bool {
        match self {
            Self::All => true,
            Self::Earthquake => matches!(hazard, HazardType::Earthquake),
            Self::Flood => matches!(hazard, HazardType::Flood),
        }
    }
}

/// Map projection mode. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum RenderMode {
    /// One discrete glyph per geocoded event.
    #[default]
    Events,
    /// Continuous severity-weighted density surface.
    Heatmap,
}

impl RenderMode {
    /// The other mode.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Events => Self::Heatmap,
            Self::Heatmap => Self::Events,
        }
    }
}

/// Marker glyph shape, chosen by hazard type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum GlyphShape {
    /// Circular marker (earthquakes).
    Circle,
    /// Triangular marker (floods).
    Triangle,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn severity_levels_are_ordered() {
        assert!(SeverityLevel::Low < SeverityLevel::Medium);
        assert!(SeverityLevel::High < SeverityLevel::Critical);
        assert_eq!(SeverityLevel::Critical.rank(), 4);
    }

    #[test]
    fn hazard_round_trips_through_wire_name() {
        for hazard in HazardType::ALL {
            assert_eq!(hazard.as_str().parse::<HazardType>().unwrap(), hazard);
        }
        assert!("tornado".parse::<HazardType>().is_err());
    }

    #[test]
    fn selector_all_admits_everything() {
        assert!(HazardSelector::All.admits(HazardType::Flood));
        assert!(!HazardSelector::Earthquake.admits(HazardType::Flood));
        assert!(HazardSelector::Flood.admits(HazardType::Flood));
    }

    #[test]
    fn severity_serializes_lowercase() {
        let json = serde_json::to_string(&SeverityLevel::Critical).unwrap();
        assert_eq!(json, "\"critical\"");
        let parsed: SeverityLevel = serde_json::from_str("\"medium\"").unwrap();
        assert_eq!(parsed, SeverityLevel::Medium);
    }

    #[test]
    fn mode_toggles() {
        assert_eq!(RenderMode::default(), RenderMode::Events);
        assert_eq!(RenderMode::Events.toggled(), RenderMode::Heatmap);
    }
}
