//! Geospatial projection of the filtered collection.
//!
//! [`MapRenderer`] holds the surface state that outlives a single frame:
//! the active [`RenderMode`], the viewport, and whether the surface owes a
//! re-measure. [`MapRenderer::render`] turns a filtered event sequence into
//! a serializable [`MapScene`] for the tile surface. Switching modes never
//! touches the event data; both sub-renderers read the same input.

use riskwatch_types::{
    Coordinates, Event, EventKey, GlyphShape, HazardDetails, HazardType, RenderMode, SeverityLevel,
};
use serde::Serialize;
use ts_rs::TS;

use crate::config::MapConfig;
use crate::density::{self, HeatPoint};

/// Marker color for critical events.
pub const COLOR_CRITICAL: &str = "#d32f2f";
/// Marker color for high events.
pub const COLOR_HIGH: &str = "#f57c00";
/// Marker color for medium events.
pub const COLOR_MEDIUM: &str = "#fbc02d";
/// Marker color for low events.
pub const COLOR_LOW: &str = "#388e3c";

/// Heat ramp stops, low to high intensity.
pub const HEAT_GRADIENT: [(f64, &str); 5] = [
    (0.4, "#0000ff"),
    (0.6, "#00ffff"),
    (0.7, "#00ff00"),
    (0.8, "#ffff00"),
    (1.0, "#ff0000"),
];

const UNKNOWN_PLACE: &str = "Unknown location";

/// Color for a severity tier.
pub const fn severity_color(level: SeverityLevel) -> &'static str {
    match level {
        SeverityLevel::Critical => COLOR_CRITICAL,
        SeverityLevel::High => COLOR_HIGH,
        SeverityLevel::Medium => COLOR_MEDIUM,
        SeverityLevel::Low => COLOR_LOW,
    }
}

/// Glyph shape for a hazard type.
pub const fn glyph_for(hazard: HazardType) -> GlyphShape {
    match hazard {
        HazardType::Earthquake => GlyphShape::Circle,
        HazardType::Flood => GlyphShape::Triangle,
    }
}

// ---------------------------------------------------------------------------
// Scene types
// ---------------------------------------------------------------------------

/// Map center and zoom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Viewport {
    /// View center.
    pub center: Coordinates,
    /// Zoom level.
    pub zoom: u8,
}

/// One labelled attribute in a marker popup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct DetailField {
    /// Attribute name.
    pub label: String,
    /// Formatted value.
    pub value: String,
}

/// Popup content for one marker.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MarkerDetail {
    /// Location label.
    pub place: String,
    /// Hazard type.
    pub hazard: HazardType,
    /// Severity tier, uppercased.
    pub severity_label: String,
    /// Severity score. Absent rather than zero when unknown.
    pub severity_score: Option<f64>,
    /// Hazard-specific attributes.
    pub attributes: Vec<DetailField>,
    /// Raw event time.
    pub time_utc: Option<String>,
    /// Source link.
    pub url: Option<String>,
}

/// A discrete glyph for one geocoded event.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Marker {
    /// Render key.
    pub key: EventKey,
    /// Position.
    pub position: Coordinates,
    /// Glyph shape.
    pub glyph: GlyphShape,
    /// Fill color.
    pub color: String,
    /// Popup content.
    pub detail: MarkerDetail,
}

/// One stop of the heat legend ramp.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LegendStop {
    /// Position along the ramp, 0 to 1.
    pub position: f64,
    /// Color at this position.
    pub color: String,
}

/// Legend accompanying the heat layer.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct HeatLegend {
    /// Legend title.
    pub title: String,
    /// Ramp stops, low to high.
    pub stops: Vec<LegendStop>,
    /// Count summary. Present only when nothing could be plotted.
    pub summary: Option<String>,
}

/// The density surface and its legend.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct HeatLayer {
    /// Weighted points.
    pub points: Vec<HeatPoint>,
    /// Largest weight, for intensity normalization.
    pub max_weight: Option<f64>,
    /// Legend.
    pub legend: HeatLegend,
}

/// The layer drawn over the base map.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(tag = "kind", rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum MapLayer {
    /// Discrete glyphs.
    Markers {
        /// One marker per geocoded event.
        markers: Vec<Marker>,
        /// Events left off the map for lack of coordinates.
        excluded: usize,
    },
    /// Density surface.
    Heat(HeatLayer),
}

/// Everything the tile surface needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MapScene {
    /// Active mode.
    pub mode: RenderMode,
    /// Current view.
    pub view: Viewport,
    /// Layer content.
    pub layer: MapLayer,
    /// When set, the surface should re-measure itself after this many
    /// milliseconds.
    pub remeasure_after_ms: Option<u64>,
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Surface defaults used on reset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapDefaults {
    /// Default view.
    pub view: Viewport,
    /// Re-measure delay after becoming visible.
    pub remeasure_delay_ms: u64,
}

impl Default for MapDefaults {
    fn default() -> Self {
        Self::from_config(&MapConfig::default())
    }
}

impl MapDefaults {
    /// Defaults from the `map` configuration section.
    pub fn from_config(config: &MapConfig) -> Self {
        Self {
            view: Viewport {
                center: config.default_center(),
                zoom: config.default_zoom,
            },
            remeasure_delay_ms: config.remeasure_delay_ms,
        }
    }
}

/// Projects events onto the map in the active mode.
#[derive(Debug, Clone)]
pub struct MapRenderer {
    mode: RenderMode,
    viewport: Viewport,
    defaults: MapDefaults,
    remeasure_pending: bool,
}

impl Default for MapRenderer {
    fn default() -> Self {
        Self::new(MapDefaults::default())
    }
}

impl MapRenderer {
    /// A renderer in events mode at the default view.
    pub const fn new(defaults: MapDefaults) -> Self {
        Self {
            mode: RenderMode::Events,
            viewport: defaults.view,
            defaults,
            remeasure_pending: false,
        }
    }

    /// Active mode.
    pub const fn mode(&self) -> RenderMode {
        self.mode
    }

    /// Select a mode.
    pub const fn set_mode(&mut self, mode: RenderMode) {
        self.mode = mode;
    }

    /// Flip between the two modes, returning the new one.
    pub const fn toggle_mode(&mut self) -> RenderMode {
        self.mode = self.mode.toggled();
        self.mode
    }

    /// Current view.
    pub const fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Record a view change made on the surface.
    pub const fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Restore the default center and zoom. Mode and filters are untouched.
    pub const fn reset_view(&mut self) {
        self.viewport = self.defaults.view;
    }

    /// The surface became visible; the next scene requests a re-measure.
    pub const fn mark_visible(&mut self) {
        self.remeasure_pending = true;
    }

    /// Whether a re-measure is owed.
    pub const fn remeasure_pending(&self) -> bool {
        self.remeasure_pending
    }

    /// Build the scene for `events` in the active mode.
    ///
    /// Consumes a pending re-measure request.
    pub fn render<'a>(&mut self, events: impl IntoIterator<Item = &'a Event>) -> MapScene {
        let layer = match self.mode {
            RenderMode::Events => render_markers(events),
            RenderMode::Heatmap => MapLayer::Heat(render_heat(events)),
        };
        let remeasure_after_ms = self
            .remeasure_pending
            .then_some(self.defaults.remeasure_delay_ms);
        self.remeasure_pending = false;

        MapScene {
            mode: self.mode,
            view: self.viewport,
            layer,
            remeasure_after_ms,
        }
    }
}

fn render_markers<'a>(events: impl IntoIterator<Item = &'a Event>) -> MapLayer {
    let mut markers = Vec::new();
    let mut excluded: usize = 0;
    for event in events {
        match event.coordinates {
            Some(position) => markers.push(marker_for(event, position)),
            None => excluded = excluded.saturating_add(1),
        }
    }
    MapLayer::Markers { markers, excluded }
}

fn marker_for(event: &Event, position: Coordinates) -> Marker {
    Marker {
        key: event.key(),
        position,
        glyph: glyph_for(event.hazard_type()),
        color: severity_color(event.severity_level).to_owned(),
        detail: MarkerDetail {
            place: event
                .place
                .clone()
                .unwrap_or_else(|| UNKNOWN_PLACE.to_owned()),
            hazard: event.hazard_type(),
            severity_label: event.severity_level.label().to_owned(),
            severity_score: event.severity_score.filter(|s| s.is_finite()),
            attributes: attributes_for(&event.details),
            time_utc: event.time_utc.clone(),
            url: event.url.clone(),
        },
    }
}

fn attributes_for(details: &HazardDetails) -> Vec<DetailField> {
    let field = |label: &str, value: String| DetailField {
        label: label.to_owned(),
        value,
    };
    match details {
        HazardDetails::Earthquake {
            magnitude,
            depth_km,
        } => {
            let mut fields = Vec::with_capacity(2);
            if let Some(m) = magnitude {
                fields.push(field("Magnitude", format!("{m:.1}")));
            }
            if let Some(d) = depth_km {
                fields.push(field("Depth", format!("{d:.1} km")));
            }
            fields
        }
        HazardDetails::Flood { subtype } => subtype
            .iter()
            .map(|s| field("Type", s.clone()))
            .collect(),
    }
}

fn render_heat<'a>(events: impl IntoIterator<Item = &'a Event>) -> HeatLayer {
    let mut total: usize = 0;
    let points = density::estimate(events.into_iter().inspect(|_| {
        total = total.saturating_add(1);
    }));
    let summary = points
        .is_empty()
        .then(|| format!("{total} events, none with coordinates"));

    HeatLayer {
        max_weight: density::max_weight(&points),
        points,
        legend: HeatLegend {
            title: String::from("Severity-weighted density"),
            stops: HEAT_GRADIENT
                .iter()
                .map(|&(position, color)| LegendStop {
                    position,
                    color: color.to_owned(),
                })
                .collect(),
            summary,
        },
    }
}
