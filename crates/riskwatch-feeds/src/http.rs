//! Shared request plumbing: send, check status, decode JSON.

use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::error::FeedError;

/// Build the HTTP client used by every upstream fetcher.
pub fn build_client(user_agent: &str, timeout: Duration) -> Result<reqwest::Client, FeedError> {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .build()
        .map_err(|e| FeedError::Client(format!("failed to build HTTP client: {e}")))
}

/// Send `request` and decode a 2xx JSON body into `T`.
///
/// Non-2xx responses become [`FeedError::Status`] carrying the body text.
pub async fn get_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
    feed: &'static str,
) -> Result<T, FeedError> {
    let response = request.send().await.map_err(|e| FeedError::Request {
        feed,
        message: e.to_string(),
    })?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "unable to read error body".to_owned());
        return Err(FeedError::Status {
            feed,
            status: status.as_u16(),
            body,
        });
    }

    response.json::<T>().await.map_err(|e| FeedError::Decode {
        feed,
        message: e.to_string(),
    })
}
