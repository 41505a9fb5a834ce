//! View-specific filtering of the published collection.
//!
//! [`filter`] is pure: it returns an order-preserving subsequence and never
//! touches the collection. [`FilterMemo`] caches the selected indices and
//! recomputes only when the collection generation or the parameters change.

use std::sync::Arc;

use riskwatch_types::{Event, HazardSelector, HazardType};
use serde::Serialize;

use crate::collection::AggregatedCollection;

/// Lower end of the magnitude slider, used when only a maximum is given.
pub const MAGNITUDE_FLOOR: f64 = 0.0;
/// Upper end of the magnitude slider, used when only a minimum is given.
pub const MAGNITUDE_CEILING: f64 = 10.0;

/// Invalid filter parameters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FilterError {
    /// A bound was NaN or infinite.
    #[error("magnitude bounds must be finite numbers")]
    NonFinite,
    /// The minimum exceeded the maximum.
    #[error("minimum magnitude {min} exceeds maximum {max}")]
    Inverted {
        /// Requested minimum.
        min: f64,
        /// Requested maximum.
        max: f64,
    },
}

/// Inclusive magnitude range `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MagnitudeRange {
    min: f64,
    max: f64,
}

impl MagnitudeRange {
    /// Build a range. Rejects non-finite bounds and `min > max`.
    pub fn new(min: f64, max: f64) -> Result<Self, FilterError> {
        if !min.is_finite() || !max.is_finite() {
            return Err(FilterError::NonFinite);
        }
        if min > max {
            return Err(FilterError::Inverted { min, max });
        }
        Ok(Self { min, max })
    }

    /// Build a range from optional bounds, filling a missing bound from
    /// the slider limits. `None` when neither bound is given.
    pub fn from_bounds(min: Option<f64>, max: Option<f64>) -> Result<Option<Self>, FilterError> {
        if min.is_none() && max.is_none() {
            return Ok(None);
        }
        Self::new(
            min.unwrap_or(MAGNITUDE_FLOOR),
            max.unwrap_or(MAGNITUDE_CEILING),
        )
        .map(Some)
    }

    /// Lower bound.
    pub const fn min(&self) -> f64 {
        self.min
    }

    /// Upper bound.
    pub const fn max(&self) -> f64 {
        self.max
    }

    /// Whether `magnitude` lies within the range, bounds included.
    pub fn contains(&self, magnitude: f64) -> bool {
        (self.min..=self.max).contains(&magnitude)
    }
}

/// The dashboard's filter controls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FilterParams {
    /// Hazard selector. `All` is the identity filter.
    pub hazard: HazardSelector,
    /// Optional magnitude range restricting earthquakes only.
    pub magnitude: Option<MagnitudeRange>,
}

impl FilterParams {
    /// Whether `event` passes these parameters.
    ///
    /// While a range is active, earthquakes without a magnitude are
    /// excluded. Floods are never excluded by the range.
    pub fn admits(&self, event: &Event) -> bool {
        if !self.hazard.admits(event.hazard_type()) {
            return false;
        }
        match (self.magnitude, event.hazard_type()) {
            (Some(range), HazardType::Earthquake) => {
                event.magnitude().is_some_and(|m| range.contains(m))
            }
            _ => true,
        }
    }
}

/// Select the events passing `params`, preserving order.
pub fn filter<'a>(events: &'a [Event], params: &FilterParams) -> Vec<&'a Event> {
    events.iter().filter(|e| params.admits(e)).collect()
}

fn select_indices(events: &[Event], params: &FilterParams) -> Vec<usize> {
    events
        .iter()
        .enumerate()
        .filter(|(_, e)| params.admits(e))
        .map(|(i, _)| i)
        .collect()
}

// ---------------------------------------------------------------------------
// Memoized view
// ---------------------------------------------------------------------------

/// A filtered view over one collection.
#[derive(Debug, Clone)]
pub struct FilteredView {
    collection: Arc<AggregatedCollection>,
    indices: Arc<[usize]>,
    params: FilterParams,
}

impl FilteredView {
    /// The underlying collection.
    pub const fn collection(&self) -> &Arc<AggregatedCollection> {
        &self.collection
    }

    /// Parameters this view was built with.
    pub const fn params(&self) -> &FilterParams {
        &self.params
    }

    /// Selected events, in collection order.
    pub fn events(&self) -> impl Iterator<Item = &Event> {
        let events = self.collection.events();
        self.indices.iter().filter_map(|&i| events.get(i))
    }

    /// Number of selected events.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Whether nothing passed the filter.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Caches the last filter result keyed on `(generation, params)`.
#[derive(Debug, Default)]
pub struct FilterMemo {
    cached: Option<FilteredView>,
    recomputations: u64,
}

impl FilterMemo {
    /// Create an empty memo.
    pub fn new() -> Self {
        Self::default()
    }

    /// The filtered view of `collection` under `params`, recomputed only
    /// when either changed since the last call.
    pub fn view(
        &mut self,
        collection: &Arc<AggregatedCollection>,
        params: &FilterParams,
    ) -> FilteredView {
        if let Some(cached) = &self.cached
            && cached.collection.generation() == collection.generation()
            && cached.params == *params
        {
            return cached.clone();
        }

        let view = FilteredView {
            collection: Arc::clone(collection),
            indices: select_indices(collection.events(), params).into(),
            params: *params,
        };
        self.recomputations = self.recomputations.saturating_add(1);
        self.cached = Some(view.clone());
        view
    }

    /// How many times the filter has actually run.
    pub const fn recomputations(&self) -> u64 {
        self.recomputations
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::collection::fixtures::{flood, quake};

    fn sample() -> Vec<Event> {
        vec![
            quake("m61", Some(70.0), Some(6.1), None),
            quake("m55", Some(45.0), Some(5.5), None),
            flood("f1", Some(45.0), None),
            quake("m50", Some(45.0), Some(5.0), None),
            quake("nomag", Some(10.0), None, None),
            quake("m60", Some(45.0), Some(6.0), None),
        ]
    }

    fn ids<'a>(events: impl IntoIterator<Item = &'a Event>) -> Vec<&'a str> {
        events
            .into_iter()
            .map(|e| e.source_event_id.as_str())
            .collect()
    }

    #[test]
    fn all_selector_is_identity() {
        let events = sample();
        let out = filter(&events, &FilterParams::default());
        assert_eq!(out.len(), events.len());
        assert_eq!(ids(out), ids(&events));
    }

    #[test]
    fn hazard_selector_preserves_order() {
        let events = sample();
        let params = FilterParams {
            hazard: HazardSelector::Earthquake,
            magnitude: None,
        };
        assert_eq!(
            ids(filter(&events, &params)),
            ["m61", "m55", "m50", "nomag", "m60"]
        );
        let params = FilterParams {
            hazard: HazardSelector::Flood,
            magnitude: None,
        };
        assert_eq!(ids(filter(&events, &params)), ["f1"]);
    }

    #[test]
    fn magnitude_range_is_inclusive_and_drops_unknown() {
        let events = sample();
        let params = FilterParams {
            hazard: HazardSelector::Earthquake,
            magnitude: Some(MagnitudeRange::new(5.0, 6.0).unwrap()),
        };
        let out = filter(&events, &params);
        assert_eq!(ids(out.iter().copied()), ["m55", "m50", "m60"]);
        for event in out {
            let m = event.magnitude().unwrap();
            assert!((5.0..=6.0).contains(&m));
        }
    }

    #[test]
    fn floods_survive_magnitude_range() {
        let events = sample();
        let params = FilterParams {
            hazard: HazardSelector::All,
            magnitude: Some(MagnitudeRange::new(9.0, 10.0).unwrap()),
        };
        assert_eq!(ids(filter(&events, &params)), ["f1"]);
    }

    #[test]
    fn filtering_twice_is_idempotent() {
        let events = sample();
        let params = FilterParams {
            hazard: HazardSelector::All,
            magnitude: Some(MagnitudeRange::new(5.0, 6.0).unwrap()),
        };
        let once: Vec<Event> = filter(&events, &params).into_iter().cloned().collect();
        let twice = filter(&once, &params);
        assert_eq!(ids(twice), ids(&once));
    }

    #[test]
    fn range_construction_validates() {
        assert_eq!(
            MagnitudeRange::new(f64::NAN, 5.0).unwrap_err(),
            FilterError::NonFinite
        );
        assert!(matches!(
            MagnitudeRange::new(6.0, 5.0),
            Err(FilterError::Inverted { .. })
        ));
        assert!(MagnitudeRange::new(5.0, 5.0).is_ok());
    }

    #[test]
    fn missing_bound_uses_slider_limit() {
        assert_eq!(MagnitudeRange::from_bounds(None, None).unwrap(), None);
        let range = MagnitudeRange::from_bounds(Some(4.5), None).unwrap().unwrap();
        assert!(range.contains(MAGNITUDE_CEILING));
        assert!(!range.contains(4.4));
        let range = MagnitudeRange::from_bounds(None, Some(3.0)).unwrap().unwrap();
        assert!(range.contains(MAGNITUDE_FLOOR));
        assert!(MagnitudeRange::from_bounds(Some(11.0), None).is_err());
    }

    #[test]
    fn memo_recomputes_only_on_change() {
        let first = Arc::new(AggregatedCollection::merge(1, Utc::now(), sample(), vec![]));
        let mut memo = FilterMemo::new();
        let params = FilterParams {
            hazard: HazardSelector::Flood,
            magnitude: None,
        };

        let view = memo.view(&first, &params);
        assert_eq!(view.len(), 1);
        memo.view(&first, &params);
        assert_eq!(memo.recomputations(), 1);

        let quakes = FilterParams {
            hazard: HazardSelector::Earthquake,
            magnitude: None,
        };
        assert_eq!(memo.view(&first, &quakes).len(), 5);
        assert_eq!(memo.recomputations(), 2);

        let second = Arc::new(AggregatedCollection::merge(2, Utc::now(), vec![], vec![]));
        let view = memo.view(&second, &quakes);
        assert!(view.is_empty());
        assert_eq!(memo.recomputations(), 3);
        assert_eq!(first.len(), 6);
    }
}
