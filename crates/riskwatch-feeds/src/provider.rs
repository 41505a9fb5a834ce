//! The feed provider: one hazard query in, one ranked response out.
//!
//! Earthquakes come from USGS. Floods come from NWS first, then UK EA
//! fills whatever room `limit` leaves. Results are windowed by
//! `since_hours`, thresholded by `min_severity_level`, ranked, and capped.

use chrono::{DateTime, Duration, Utc};
use riskwatch_types::{Event, EventsResponse, FeedQuery, HazardType, SeverityLevel, rank_events};
use tracing::info;

use crate::config::UpstreamConfig;
use crate::error::FeedError;
use crate::http::build_client;
use crate::nws::NwsClient;
use crate::uk_ea::UkEaClient;
use crate::usgs::UsgsClient;

/// Keep events raised at or after `now - since_hours`.
///
/// Events with an unknown or unparseable time are kept so alerts are never
/// hidden for lack of a timestamp.
pub fn apply_window(events: Vec<Event>, since_hours: Option<u32>, now: DateTime<Utc>) -> Vec<Event> {
    let Some(hours) = since_hours else {
        return events;
    };
    let cutoff = now - Duration::hours(i64::from(hours));
    events
        .into_iter()
        .filter(|e| e.timestamp().is_none_or(|t| t >= cutoff))
        .collect()
}

/// Keep events whose severity tier is at least `min_level`.
pub fn apply_min_severity(events: Vec<Event>, min_level: Option<SeverityLevel>) -> Vec<Event> {
    match min_level {
        Some(min) => events
            .into_iter()
            .filter(|e| e.severity_level >= min)
            .collect(),
        None => events,
    }
}

/// Window, threshold, rank, and cap a raw fetch result.
pub fn shape_response(events: Vec<Event>, query: &FeedQuery, now: DateTime<Utc>) -> EventsResponse {
    let events = apply_window(events, query.since_hours, now);
    let events = apply_min_severity(events, query.min_severity_level);
    let mut events = rank_events(events);
    events.truncate(usize::try_from(query.limit).unwrap_or(usize::MAX));
    EventsResponse::new(Some(query.hazard), events)
}

/// Fetches hazard events directly from the upstream agencies.
#[derive(Debug, Clone)]
pub struct EventProvider {
    usgs: UsgsClient,
    nws: NwsClient,
    uk_ea: UkEaClient,
}

impl EventProvider {
    /// Build a provider from upstream configuration.
    pub fn new(config: &UpstreamConfig) -> Result<Self, FeedError> {
        let client = build_client(&config.user_agent, config.timeout())?;
        Ok(Self {
            usgs: UsgsClient::new(client.clone(), &config.usgs_base_url),
            nws: NwsClient::new(client.clone(), &config.nws_alerts_url, config.zone_fetch_budget),
            uk_ea: UkEaClient::new(client, &config.uk_ea_floods_url),
        })
    }

    /// Run one hazard query against the upstream feeds.
    pub async fn list_events(&self, query: &FeedQuery) -> Result<EventsResponse, FeedError> {
        let limit = usize::try_from(query.limit).unwrap_or(usize::MAX);

        let events = match query.hazard {
            HazardType::Earthquake => {
                self.usgs
                    .fetch_recent(&query.feed, query.min_magnitude)
                    .await?
            }
            HazardType::Flood => {
                let mut events = self.nws.fetch_flood_alerts(limit).await?;
                let remaining = limit.saturating_sub(events.len());
                if remaining > 0 {
                    events.extend(self.uk_ea.fetch_flood_alerts(remaining).await?);
                }
                events
            }
        };

        let fetched = events.len();
        let response = shape_response(events, query, Utc::now());
        info!(
            hazard = %query.hazard,
            fetched,
            returned = response.count,
            "Provider query served"
        );
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use riskwatch_types::{Coordinates, HazardDetails};

    use super::*;

    fn event(id: &str, score: f64, level: SeverityLevel, time: Option<String>) -> Event {
        Event {
            source: String::from("test"),
            source_event_id: id.to_owned(),
            time_utc: time,
            place: None,
            coordinates: Coordinates::from_parts(Some(1.0), Some(2.0)),
            details: HazardDetails::Earthquake {
                magnitude: Some(4.0),
                depth_km: None,
            },
            severity_score: Some(score),
            severity_level: level,
            url: None,
        }
    }

    fn ids(events: &[Event]) -> Vec<&str> {
        events.iter().map(|e| e.source_event_id.as_str()).collect()
    }

    #[test]
    fn window_keeps_recent_and_untimed_events() {
        let now = Utc::now();
        let recent = (now - Duration::hours(2)).to_rfc3339();
        let stale = (now - Duration::hours(30)).to_rfc3339();
        let events = vec![
            event("recent", 10.0, SeverityLevel::Low, Some(recent)),
            event("stale", 10.0, SeverityLevel::Low, Some(stale)),
            event("untimed", 10.0, SeverityLevel::Low, None),
        ];
        let kept = apply_window(events, Some(24), now);
        assert_eq!(ids(&kept), ["recent", "untimed"]);
    }

    #[test]
    fn no_window_keeps_everything() {
        let events = vec![event("a", 1.0, SeverityLevel::Low, Some(String::from("1990-01-01T00:00:00Z")))];
        assert_eq!(apply_window(events, None, Utc::now()).len(), 1);
    }

    #[test]
    fn min_severity_is_inclusive() {
        let events = vec![
            event("low", 10.0, SeverityLevel::Low, None),
            event("high", 70.0, SeverityLevel::High, None),
            event("medium", 45.0, SeverityLevel::Medium, None),
        ];
        let kept = apply_min_severity(events, Some(SeverityLevel::Medium));
        assert_eq!(ids(&kept), ["high", "medium"]);
    }

    #[test]
    fn response_is_ranked_and_capped() {
        let now = Utc::now();
        let events = vec![
            event("a", 10.0, SeverityLevel::Low, None),
            event("b", 90.0, SeverityLevel::Critical, None),
            event("c", 45.0, SeverityLevel::Medium, None),
        ];
        let query = FeedQuery::for_hazard(HazardType::Earthquake).with_limit(2);
        let response = shape_response(events, &query, now);
        assert_eq!(response.count, 2);
        assert_eq!(response.hazard, Some(HazardType::Earthquake));
        assert_eq!(ids(&response.events), ["b", "c"]);
    }
}
