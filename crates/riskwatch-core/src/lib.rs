//! Aggregation, filtering, and map projection for Riskwatch.
//!
//! This crate owns the pipeline between the feed query interface and the
//! dashboard:
//!
//! - [`config`] -- Configuration loading from `riskwatch-config.yaml`.
//! - [`collection`] -- The immutable [`AggregatedCollection`] published
//!   once per successful cycle.
//! - [`aggregator`] -- The [`Poller`]: timed concurrent fetches, merge,
//!   ranking, and publication over a `watch` channel.
//! - [`filter`] -- Hazard and magnitude filtering with a keyed memo.
//! - [`density`] -- Severity-weighted heat points.
//! - [`render`] -- Marker and heat layer projection into a [`MapScene`].
//!
//! [`AggregatedCollection`]: collection::AggregatedCollection
//! [`Poller`]: aggregator::Poller
//! [`MapScene`]: render::MapScene

pub mod aggregator;
pub mod collection;
pub mod config;
pub mod density;
pub mod filter;
pub mod render;

pub use aggregator::{CycleOutcome, PollError, PollSnapshot, PollState, Poller};
pub use collection::AggregatedCollection;
pub use config::{ConfigError, ServiceConfig};
pub use filter::{FilterError, FilterMemo, FilterParams, FilteredView, MagnitudeRange, filter};
pub use render::{MapDefaults, MapRenderer, MapScene};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation for the map scene.

    #[test]
    fn export_bindings() {
        use ts_rs::TS;

        let _ = crate::density::HeatPoint::export_all();
        let _ = crate::render::MapScene::export_all();
    }
}
