//! The published, immutable result of one successful poll cycle.

use chrono::{DateTime, Utc};
use riskwatch_types::{Event, rank_events};

/// An ordered, immutable sequence of events.
///
/// A new collection replaces the previous one wholesale; consumers hold an
/// `Arc` to a complete collection and never see a partially built one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregatedCollection {
    generation: u64,
    fetched_at: Option<DateTime<Utc>>,
    events: Vec<Event>,
}

impl AggregatedCollection {
    /// The empty collection published before the first successful cycle.
    pub const fn empty() -> Self {
        Self {
            generation: 0,
            fetched_at: None,
            events: Vec::new(),
        }
    }

    /// Merge per-hazard results into a ranked collection.
    ///
    /// Earthquakes are placed before floods so equal-rank events keep that
    /// relative order.
    pub fn merge(
        generation: u64,
        fetched_at: DateTime<Utc>,
        earthquakes: Vec<Event>,
        floods: Vec<Event>,
    ) -> Self {
        let mut events = earthquakes;
        events.extend(floods);
        Self {
            generation,
            fetched_at: Some(fetched_at),
            events: rank_events(events),
        }
    }

    /// Monotonic generation. `0` is the initial empty collection.
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// When the cycle that produced this collection completed.
    pub const fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }

    /// Events in rank order.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the collection holds no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::{flood, quake};
    use super::*;

    #[test]
    fn empty_collection_is_generation_zero() {
        let collection = AggregatedCollection::empty();
        assert_eq!(collection.generation(), 0);
        assert!(collection.is_empty());
        assert!(collection.fetched_at().is_none());
    }

    #[test]
    fn merge_ranks_across_hazards() {
        let earthquakes = vec![quake("a", Some(25.0), Some(4.2), None)];
        let floods = vec![flood("b", Some(70.0), None)];
        let merged = AggregatedCollection::merge(3, Utc::now(), earthquakes, floods);
        let ids: Vec<&str> = merged
            .events()
            .iter()
            .map(|e| e.source_event_id.as_str())
            .collect();
        assert_eq!(ids, ["b", "a"]);
        assert_eq!(merged.generation(), 3);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn equal_rank_keeps_earthquakes_first() {
        let earthquakes = vec![quake("q", Some(45.0), Some(5.0), None)];
        let floods = vec![flood("f", Some(45.0), None)];
        let merged = AggregatedCollection::merge(1, Utc::now(), earthquakes, floods);
        assert_eq!(merged.events().first().map(|e| e.source.as_str()), Some("usgs"));
    }
}
