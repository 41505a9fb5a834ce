//! Upstream hazard feeds for Riskwatch.
//!
//! This crate owns everything between the public hazard agencies and the
//! uniform [`Event`](riskwatch_types::Event) model:
//!
//! - **Normalizers** for USGS earthquake features ([`usgs`]), NWS flood
//!   alerts ([`nws`]), and UK Environment Agency flood warnings
//!   ([`uk_ea`]). Normalization is total: a record whose position cannot
//!   be read still becomes an event, just an unplottable one.
//! - **Severity scoring** ([`severity`]) assigning each record a 0--100
//!   score and a four-tier level.
//! - **The provider pipeline** ([`provider`]) answering one feed query
//!   with a windowed, thresholded, ranked response.
//! - **The feed query interface** ([`source`]) the aggregator consumes,
//!   with local and remote implementations.

pub mod config;
pub mod error;
pub mod geometry;
mod http;
pub mod nws;
pub mod provider;
pub mod severity;
pub mod source;
pub mod uk_ea;
pub mod usgs;

pub use config::UpstreamConfig;
pub use error::FeedError;
pub use provider::EventProvider;
pub use source::{FeedBackend, FeedSource, HttpFeedSource, create_source};
