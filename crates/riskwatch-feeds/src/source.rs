//! The feed query interface consumed by the aggregator.
//!
//! [`FeedSource`] abstracts where an [`EventsResponse`] comes from. Two
//! implementations exist: [`HttpFeedSource`] queries a remote provider API
//! over HTTP, and [`EventProvider`] fetches the upstream agencies
//! in-process. [`FeedBackend`] dispatches between them, because
//! `impl Future` trait methods are not dyn-compatible.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use riskwatch_types::{EventsResponse, FeedQuery};

use crate::config::UpstreamConfig;
use crate::error::FeedError;
use crate::http::{build_client, get_json};
use crate::provider::EventProvider;

/// Feed name used in errors from the remote provider API.
pub const EVENTS_API: &str = "events api";

/// A source of hazard event responses.
pub trait FeedSource: Send + Sync {
    /// Run one feed query. No retries are attempted.
    fn fetch(
        &self,
        query: &FeedQuery,
    ) -> impl Future<Output = Result<EventsResponse, FeedError>> + Send;
}

impl<S: FeedSource> FeedSource for Arc<S> {
    fn fetch(
        &self,
        query: &FeedQuery,
    ) -> impl Future<Output = Result<EventsResponse, FeedError>> + Send {
        (**self).fetch(query)
    }
}

impl FeedSource for EventProvider {
    async fn fetch(&self, query: &FeedQuery) -> Result<EventsResponse, FeedError> {
        self.list_events(query).await
    }
}

// ---------------------------------------------------------------------------
// Remote provider API
// ---------------------------------------------------------------------------

/// Queries a provider API's `GET {base}/events` endpoint.
#[derive(Debug, Clone)]
pub struct HttpFeedSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpFeedSource {
    /// Create a client for the provider at `base_url`.
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> Result<Self, FeedError> {
        Ok(Self {
            client: build_client(user_agent, timeout)?,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    /// The provider base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl FeedSource for HttpFeedSource {
    async fn fetch(&self, query: &FeedQuery) -> Result<EventsResponse, FeedError> {
        let url = format!("{}/events", self.base_url);
        let request = self.client.get(&url).query(&query.to_query_pairs());
        get_json(request, EVENTS_API).await
    }
}

// ---------------------------------------------------------------------------
// Enum dispatch
// ---------------------------------------------------------------------------

/// The configured feed source.
#[derive(Debug, Clone)]
pub enum FeedBackend {
    /// A remote provider API.
    Remote(HttpFeedSource),
    /// In-process upstream fetches, shared with the provider endpoint.
    Direct(Arc<EventProvider>),
}

impl FeedBackend {
    /// Human-readable name for logging.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Remote(_) => "remote",
            Self::Direct(_) => "direct",
        }
    }
}

impl FeedSource for FeedBackend {
    async fn fetch(&self, query: &FeedQuery) -> Result<EventsResponse, FeedError> {
        match self {
            Self::Remote(source) => source.fetch(query).await,
            Self::Direct(provider) => provider.list_events(query).await,
        }
    }
}

/// Create the feed backend.
///
/// A configured `api_url` selects the remote provider; otherwise the
/// in-process `provider` is used.
pub fn create_source(
    api_url: Option<&str>,
    upstream: &UpstreamConfig,
    provider: &Arc<EventProvider>,
) -> Result<FeedBackend, FeedError> {
    match api_url {
        Some(url) => Ok(FeedBackend::Remote(HttpFeedSource::new(
            url,
            &upstream.user_agent,
            upstream.timeout(),
        )?)),
        None => Ok(FeedBackend::Direct(Arc::clone(provider))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn create_source_dispatches_correctly() {
        let upstream = UpstreamConfig::default();
        let provider = Arc::new(EventProvider::new(&upstream).unwrap());

        let direct = create_source(None, &upstream, &provider).unwrap();
        assert_eq!(direct.name(), "direct");

        let remote = create_source(Some("http://localhost:8000/"), &upstream, &provider).unwrap();
        assert_eq!(remote.name(), "remote");
        if let FeedBackend::Remote(source) = remote {
            assert_eq!(source.base_url(), "http://localhost:8000");
        }
    }

    #[tokio::test]
    async fn unreachable_remote_surfaces_request_error() {
        let source =
            HttpFeedSource::new("http://127.0.0.1:9", "riskwatch-test", Duration::from_secs(2))
                .unwrap();
        let result = source.fetch(&FeedQuery::default()).await;
        let err = result.unwrap_err();
        assert_eq!(err.feed(), Some(EVENTS_API));
        assert!(matches!(err, FeedError::Request { .. }));
    }
}
