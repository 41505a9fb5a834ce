//! Timestamp parsing shared by ranking and windowing.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Parse an ISO 8601 timestamp into UTC.
///
/// Offsets are honoured. Timestamps without an offset are taken to be UTC.
/// Anything unparseable yields `None`, which ranking treats as the earliest
/// possible time.
pub fn parse_utc(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Datelike, Timelike};

    use super::*;

    #[test]
    fn parses_offset_timestamps_into_utc() {
        let dt = parse_utc("2024-03-01T10:00:00-05:00").unwrap();
        assert_eq!(dt.hour(), 15);
    }

    #[test]
    fn naive_timestamps_are_utc() {
        let dt = parse_utc("2024-03-01T10:00:00").unwrap();
        assert_eq!(dt.hour(), 10);
        assert_eq!(dt.day(), 1);
    }

    #[test]
    fn garbage_is_none() {
        assert!(parse_utc("yesterday-ish").is_none());
        assert!(parse_utc("").is_none());
    }
}
