//! Shared type definitions for the Riskwatch hazard dashboard.
//!
//! This crate is the single source of truth for the event model used
//! across the workspace. Types defined here flow downstream to
//! `TypeScript` via `ts-rs` for the map dashboard.
//!
//! # Modules
//!
//! - [`enums`] -- Hazard types, severity tiers, selectors, render modes
//! - [`structs`] -- The canonical [`Event`] and its wire form
//! - [`ids`] -- Event render key and poll cycle identifier
//! - [`query`] -- Feed query parameters
//! - [`ranking`] -- Deterministic severity/time ordering
//! - [`time`] -- Timestamp parsing

pub mod enums;
pub mod ids;
pub mod query;
pub mod ranking;
pub mod structs;
pub mod time;

// Re-export all public types at crate root for convenience.
pub use enums::{GlyphShape, HazardSelector, HazardType, RenderMode, SeverityLevel, UnknownVariant};
pub use ids::{CycleId, EventKey};
pub use query::FeedQuery;
pub use ranking::{compare_rank, rank_events};
pub use structs::{
    Coordinates, Event, EventRecord, EventsResponse, HazardDetails, MissingEventId,
};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation for the dashboard.

    #[test]
    fn export_bindings() {
        use ts_rs::TS;

        let _ = crate::enums::HazardType::export_all();
        let _ = crate::enums::SeverityLevel::export_all();
        let _ = crate::enums::HazardSelector::export_all();
        let _ = crate::enums::RenderMode::export_all();
        let _ = crate::enums::GlyphShape::export_all();
        let _ = crate::ids::EventKey::export_all();
        let _ = crate::ids::CycleId::export_all();
        let _ = crate::structs::Coordinates::export_all();
        let _ = crate::structs::EventRecord::export_all();
        let _ = crate::structs::EventsResponse::export_all();
        let _ = crate::query::FeedQuery::export_all();
    }
}
