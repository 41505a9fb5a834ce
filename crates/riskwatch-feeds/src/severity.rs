//! Explainable severity scoring (0--100) for upstream records.
//!
//! Earthquakes are scored from magnitude and depth. Flood alerts are scored
//! from the issuing agency's severity tier, nudged by the alert kind.

use riskwatch_types::SeverityLevel;

/// Upper bound of every score.
pub const MAX_SCORE: i32 = 100;

/// Score an earthquake and classify it.
///
/// Magnitude sets the base (a missing magnitude counts as 0). Shallow
/// events (< 20 km) gain 10, deep events (> 70 km) lose 10.
pub fn score_earthquake(magnitude: Option<f64>, depth_km: Option<f64>) -> (i32, SeverityLevel) {
    let mag = magnitude.unwrap_or(0.0);
    let base: i32 = if mag < 4.0 {
        10
    } else if mag < 5.0 {
        25
    } else if mag < 6.0 {
        45
    } else if mag < 7.0 {
        70
    } else {
        90
    };

    let adjustment = match depth_km {
        Some(depth) if depth < 20.0 => 10,
        Some(depth) if depth > 70.0 => -10,
        _ => 0,
    };

    let score = base.saturating_add(adjustment).clamp(0, MAX_SCORE);
    (score, level_for_score(score))
}

/// Map a 0--100 score onto the four severity tiers.
pub const fn level_for_score(score: i32) -> SeverityLevel {
    if score <= 24 {
        SeverityLevel::Low
    } else if score <= 49 {
        SeverityLevel::Medium
    } else if score <= 74 {
        SeverityLevel::High
    } else {
        SeverityLevel::Critical
    }
}

/// Severity tier from an NWS alert's `severity` property.
pub fn level_from_nws(severity: Option<&str>) -> SeverityLevel {
    match severity.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
        Some("extreme") => SeverityLevel::Critical,
        Some("severe") => SeverityLevel::High,
        Some("moderate") => SeverityLevel::Medium,
        _ => SeverityLevel::Low,
    }
}

/// Severity tier from a UK Environment Agency `severityLevel` (1 is most
/// severe).
pub const fn level_from_uk(severity_level: Option<i64>) -> SeverityLevel {
    match severity_level {
        Some(1) => SeverityLevel::Critical,
        Some(2) => SeverityLevel::High,
        Some(3) => SeverityLevel::Medium,
        _ => SeverityLevel::Low,
    }
}

/// Which agency issued a flood alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloodAgency {
    /// US National Weather Service.
    Nws,
    /// UK Environment Agency, with its numeric severity level.
    UkEa(Option<i64>),
}

/// Score a flood alert.
pub fn score_flood(agency: FloodAgency, level: SeverityLevel, event_name: Option<&str>) -> i32 {
    let mut score: i32 = match level {
        SeverityLevel::Low => 20,
        SeverityLevel::Medium => 45,
        SeverityLevel::High => 70,
        SeverityLevel::Critical => 90,
    };

    if let Some(name) = event_name {
        let name = name.to_lowercase();
        if name.contains("flash") {
            score = score.saturating_add(10);
        }
        if name.contains("coastal") {
            score = score.saturating_add(5);
        }
    }

    if let FloodAgency::UkEa(Some(uk_level)) = agency {
        score = match uk_level {
            1 => 90,
            2 => 70,
            3 => 45,
            4 => 25,
            _ => score,
        };
    }

    score.clamp(0, MAX_SCORE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn earthquake_bands() {
        assert_eq!(score_earthquake(Some(3.9), Some(30.0)), (10, SeverityLevel::Low));
        assert_eq!(score_earthquake(Some(4.5), Some(30.0)), (25, SeverityLevel::Medium));
        assert_eq!(score_earthquake(Some(6.5), Some(30.0)), (70, SeverityLevel::High));
        assert_eq!(score_earthquake(Some(7.2), Some(30.0)), (90, SeverityLevel::Critical));
    }

    #[test]
    fn depth_adjusts_score() {
        assert_eq!(score_earthquake(Some(5.5), Some(5.0)).0, 55);
        assert_eq!(score_earthquake(Some(5.5), Some(300.0)).0, 35);
        assert_eq!(score_earthquake(Some(7.5), Some(1.0)).0, 100);
    }

    #[test]
    fn missing_magnitude_scores_as_minor() {
        assert_eq!(score_earthquake(None, None), (10, SeverityLevel::Low));
    }

    #[test]
    fn nws_levels() {
        assert_eq!(level_from_nws(Some("Extreme")), SeverityLevel::Critical);
        assert_eq!(level_from_nws(Some(" severe ")), SeverityLevel::High);
        assert_eq!(level_from_nws(Some("Minor")), SeverityLevel::Low);
        assert_eq!(level_from_nws(None), SeverityLevel::Low);
    }

    #[test]
    fn flash_and_coastal_bonuses() {
        let level = SeverityLevel::High;
        assert_eq!(score_flood(FloodAgency::Nws, level, Some("Flash Flood Warning")), 80);
        assert_eq!(score_flood(FloodAgency::Nws, level, Some("Coastal Flood Watch")), 75);
        assert_eq!(score_flood(FloodAgency::Nws, level, Some("Flood Watch")), 70);
    }

    #[test]
    fn uk_level_overrides_base() {
        let level = level_from_uk(Some(4));
        assert_eq!(level, SeverityLevel::Low);
        assert_eq!(score_flood(FloodAgency::UkEa(Some(4)), level, None), 25);
        assert_eq!(score_flood(FloodAgency::UkEa(Some(1)), SeverityLevel::Critical, None), 90);
    }
}
