//! REST API endpoint handlers for the dashboard server.
//!
//! Dashboard handlers read the published collection through the shared
//! [`AppState`]; none of them trigger a fetch. `GET /events` is the
//! provider endpoint and queries the upstream agencies directly.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/health` | Liveness probe |
//! | `GET` | `/events` | Provider feed query |
//! | `GET` | `/api/status` | Poller status |
//! | `GET` | `/api/events` | Filtered event list |
//! | `GET` | `/api/map` | Map scene for the active mode |
//! | `POST` | `/api/map/mode` | Set the render mode |
//! | `POST` | `/api/map/toggle` | Flip the render mode |
//! | `POST` | `/api/map/reset` | Restore the default view |
//! | `POST` | `/api/map/visible` | Request a re-measure |

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::response::{Html, IntoResponse};
use riskwatch_core::{FilterParams, MagnitudeRange};
use riskwatch_types::{FeedQuery, HazardSelector, HazardType, RenderMode, SeverityLevel};
use serde::Deserialize;
use tracing::{debug, info};
use validator::Validate;

use crate::error::ObserverError;
use crate::state::{AppState, CycleSummary};

// ---------------------------------------------------------------------------
// Query parameter structs
// ---------------------------------------------------------------------------

/// Query parameters for the `GET /events` provider endpoint.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ProviderQuery {
    /// Hazard stream (default `earthquake`).
    pub hazard: Option<HazardType>,
    /// Named USGS feed (earthquakes only).
    pub feed: Option<String>,
    /// Result cap, 1 to 200 (default 50).
    #[validate(range(min = 1, max = 200))]
    pub limit: Option<u32>,
    /// Lower magnitude bound (earthquakes only).
    #[validate(range(min = 0.0))]
    pub min_magnitude: Option<f64>,
    /// Lookback window, 1 to 168 hours (default 24).
    #[validate(range(min = 1, max = 168))]
    pub since_hours: Option<u32>,
    /// Minimum severity tier.
    pub min_severity_level: Option<SeverityLevel>,
}

impl ProviderQuery {
    /// Validate and convert into a [`FeedQuery`].
    pub fn into_feed_query(self) -> Result<FeedQuery, ObserverError> {
        self.validate()?;
        if self.min_magnitude.is_some_and(|m| !m.is_finite()) {
            return Err(ObserverError::InvalidQuery(String::from(
                "min_magnitude must be a finite number",
            )));
        }

        let mut query = FeedQuery::for_hazard(self.hazard.unwrap_or(HazardType::Earthquake));
        if let Some(feed) = self.feed {
            query.feed = feed;
        }
        if let Some(limit) = self.limit {
            query.limit = limit;
        }
        if let Some(hours) = self.since_hours {
            query.since_hours = Some(hours);
        }
        query.min_magnitude = self.min_magnitude;
        query.min_severity_level = self.min_severity_level;
        Ok(query)
    }
}

/// Dashboard filter controls, shared by `/api/events` and `/api/map`.
#[derive(Debug, Default, Deserialize)]
pub struct ViewQuery {
    /// Hazard selector (default `all`).
    pub hazard: Option<HazardSelector>,
    /// Lower magnitude bound.
    pub min_magnitude: Option<f64>,
    /// Upper magnitude bound.
    pub max_magnitude: Option<f64>,
}

impl ViewQuery {
    /// Build filter parameters. A range is active when either bound is
    /// given.
    pub fn to_params(&self) -> Result<FilterParams, ObserverError> {
        Ok(FilterParams {
            hazard: self.hazard.unwrap_or_default(),
            magnitude: MagnitudeRange::from_bounds(self.min_magnitude, self.max_magnitude)?,
        })
    }
}

/// Body of `POST /api/map/mode`.
#[derive(Debug, Deserialize)]
pub struct ModeRequest {
    /// Mode to activate.
    pub mode: RenderMode,
}

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page showing poller status and API links.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let summary = CycleSummary::from_snapshot(&state.snapshot());
    let mode = state.mode().await;
    let poll_state = format!("{:?}", summary.state);
    let generation = summary.generation;
    let event_count = summary.event_count;
    let fetched_at = summary
        .fetched_at
        .map_or_else(|| String::from("never"), |t| t.format("%H:%M:%S UTC").to_string());
    let error_line = summary.last_error.as_deref().map_or_else(String::new, |e| {
        format!(r#"<p class="error">Last cycle failed: {}</p>"#, escape_html(e))
    });

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Riskwatch</title>
    <style>
        body {{
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 800px;
            margin: 0 auto;
        }}
        h1 {{ color: #58a6ff; margin-bottom: 0.25rem; }}
        .subtitle {{ color: #8b949e; margin-top: 0; }}
        .metric {{
            display: inline-block;
            background: #161b22;
            border: 1px solid #30363d;
            border-radius: 6px;
            padding: 1rem 1.5rem;
            margin: 0.5rem 0.5rem 0.5rem 0;
            min-width: 120px;
        }}
        .metric .label {{ color: #8b949e; font-size: 0.85rem; }}
        .metric .value {{ color: #58a6ff; font-size: 1.5rem; font-weight: bold; }}
        .error {{ color: #f85149; }}
        a {{ color: #58a6ff; text-decoration: none; }}
        a:hover {{ text-decoration: underline; }}
        ul {{ list-style: none; padding: 0; }}
        li {{ padding: 0.3rem 0; }}
        hr {{ border: none; border-top: 1px solid #30363d; margin: 1.5rem 0; }}
    </style>
</head>
<body>
    <h1>Riskwatch</h1>
    <p class="subtitle">Earthquake and flood event monitor</p>
    {error_line}
    <div>
        <div class="metric">
            <div class="label">Poller</div>
            <div class="value">{poll_state}</div>
        </div>
        <div class="metric">
            <div class="label">Generation</div>
            <div class="value">{generation}</div>
        </div>
        <div class="metric">
            <div class="label">Events</div>
            <div class="value">{event_count}</div>
        </div>
        <div class="metric">
            <div class="label">Fetched</div>
            <div class="value">{fetched_at}</div>
        </div>
        <div class="metric">
            <div class="label">Map mode</div>
            <div class="value">{mode:?}</div>
        </div>
    </div>

    <hr>

    <h2>API Endpoints</h2>
    <ul>
        <li>GET <a href="/api/status">/api/status</a> -- Poller status</li>
        <li>GET <a href="/api/events">/api/events</a> -- Events (?hazard=all|earthquake|flood&amp;min_magnitude=&amp;max_magnitude=)</li>
        <li>GET <a href="/api/map">/api/map</a> -- Map scene for the active mode</li>
        <li>GET <a href="/events?hazard=flood">/events</a> -- Provider feed query</li>
        <li>POST /api/map/mode, /api/map/toggle, /api/map/reset, /api/map/visible</li>
    </ul>

    <h2>WebSocket</h2>
    <ul>
        <li><code>ws://host:port/ws/cycles</code> -- Live poll cycle summaries</li>
    </ul>
</body>
</html>"#
    ))
}

// ---------------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------------

/// Liveness probe.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ---------------------------------------------------------------------------
// GET /events -- provider endpoint
// ---------------------------------------------------------------------------

/// Answer one feed query from the upstream agencies.
///
/// # Query Parameters
///
/// - `hazard`: `earthquake` | `flood` (default `earthquake`)
/// - `feed`: USGS summary feed (default `all_day`)
/// - `limit`: 1..=200 (default 50)
/// - `min_magnitude`: >= 0
/// - `since_hours`: 1..=168 (default 24)
/// - `min_severity_level`: `low` | `medium` | `high` | `critical`
pub async fn provider_events(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ProviderQuery>,
) -> Result<impl IntoResponse, ObserverError> {
    let query = params.into_feed_query()?;
    let provider = state
        .provider
        .as_ref()
        .ok_or_else(|| ObserverError::Unavailable(String::from("no upstream provider configured")))?;

    debug!(hazard = %query.hazard, limit = query.limit, "Provider query");
    let response = provider.list_events(&query).await?;
    Ok(Json(response))
}

// ---------------------------------------------------------------------------
// GET /api/status
// ---------------------------------------------------------------------------

/// Poller status plus the active render mode.
pub async fn get_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let summary = CycleSummary::from_snapshot(&state.snapshot());
    let mode = state.mode().await;
    Json(serde_json::json!({
        "poller": summary,
        "mode": mode,
        "started_at": state.started_at,
    }))
}

// ---------------------------------------------------------------------------
// GET /api/events -- filtered list view
// ---------------------------------------------------------------------------

/// The filtered event list. Unplottable events are included; they are
/// only left off the map.
pub async fn list_events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ViewQuery>,
) -> Result<impl IntoResponse, ObserverError> {
    let params = query.to_params()?;
    let snapshot = state.snapshot();
    let view = state.filtered(&snapshot, &params).await;
    let events: Vec<_> = view.events().collect();

    Ok(Json(serde_json::json!({
        "generation": view.collection().generation(),
        "fetched_at": view.collection().fetched_at(),
        "filter": view.params(),
        "total": view.collection().len(),
        "count": events.len(),
        "events": events,
        "error": snapshot.last_error,
    })))
}

// ---------------------------------------------------------------------------
// Map surface
// ---------------------------------------------------------------------------

/// The map scene for the current filter and mode.
pub async fn get_map(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ViewQuery>,
) -> Result<impl IntoResponse, ObserverError> {
    let params = query.to_params()?;
    let snapshot = state.snapshot();
    let view = state.filtered(&snapshot, &params).await;
    let scene = state.renderer.lock().await.render(view.events());
    Ok(Json(scene))
}

/// Select a render mode.
pub async fn set_mode(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ModeRequest>,
) -> impl IntoResponse {
    state.renderer.lock().await.set_mode(body.mode);
    info!(mode = ?body.mode, "Map mode set");
    Json(serde_json::json!({ "mode": body.mode }))
}

/// Flip between events and heatmap.
pub async fn toggle_mode(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mode = state.renderer.lock().await.toggle_mode();
    info!(?mode, "Map mode toggled");
    Json(serde_json::json!({ "mode": mode }))
}

/// Restore the default center and zoom.
pub async fn reset_view(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut renderer = state.renderer.lock().await;
    renderer.reset_view();
    Json(serde_json::json!({ "view": renderer.viewport() }))
}

/// The surface became visible; the next scene asks it to re-measure.
pub async fn mark_visible(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.renderer.lock().await.mark_visible();
    Json(serde_json::json!({ "remeasure_pending": true }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
