//! Deterministic total order over events.
//!
//! Primary key: severity score, descending, with an absent score ranking
//! as 0. Secondary key: timestamp, descending, with an absent or
//! unparseable timestamp ranking as the earliest possible time. Ties keep
//! their input order because the sort is stable.

use core::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::structs::Event;

/// Compare two events in ranking order (most severe, most recent first).
pub fn compare_rank(a: &Event, b: &Event) -> Ordering {
    compare_keys(
        (a.rank_score(), a.timestamp()),
        (b.rank_score(), b.timestamp()),
    )
}

fn compare_keys(
    (score_a, time_a): (f64, Option<DateTime<Utc>>),
    (score_b, time_b): (f64, Option<DateTime<Utc>>),
) -> Ordering {
    // `None < Some(_)` for Option, so descending puts unknown times last.
    score_b.total_cmp(&score_a).then_with(|| time_b.cmp(&time_a))
}

/// Sort events into ranking order. Stable.
#[must_use]
pub fn rank_events(events: Vec<Event>) -> Vec<Event> {
    // Parse each timestamp once rather than on every comparison.
    let mut keyed: Vec<(f64, Option<DateTime<Utc>>, Event)> = events
        .into_iter()
        .map(|event| (event.rank_score(), event.timestamp(), event))
        .collect();
    keyed.sort_by(|a, b| compare_keys((a.0, a.1), (b.0, b.1)));
    keyed.into_iter().map(|(_, _, event)| event).collect()
}
