//! Identifiers: the event render key and the poll cycle id.

use core::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Identity of an event within one aggregation cycle.
///
/// `(source, source_event_id)` is the only admissible de-duplication and
/// render key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EventKey {
    /// Origin feed identifier.
    pub source: String,
    /// Origin-assigned identifier.
    pub source_event_id: String,
}

impl EventKey {
    /// Build a key from its parts.
    pub fn new(source: &str, source_event_id: &str) -> Self {
        Self {
            source: source.to_owned(),
            source_event_id: source_event_id.to_owned(),
        }
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.source_event_id)
    }
}

/// Unique identifier for one poll cycle, used to correlate log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CycleId(pub Uuid);

impl CycleId {
    /// Create a new identifier using UUID v7 (time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Return the inner [`Uuid`] value.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for CycleId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CycleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_display_joins_source_and_id() {
        let key = EventKey::new("usgs", "ci123");
        assert_eq!(key.to_string(), "usgs:ci123");
    }

    #[test]
    fn cycle_ids_are_distinct() {
        assert_ne!(CycleId::new(), CycleId::new());
    }
}
