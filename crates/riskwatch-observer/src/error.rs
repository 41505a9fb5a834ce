//! Error types for the dashboard API server.
//!
//! [`ObserverError`] unifies all failure modes into a single enum that
//! can be converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use riskwatch_core::FilterError;
use riskwatch_feeds::FeedError;

/// Errors that can occur in the API layer.
#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    /// An invalid query parameter was provided.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// An upstream feed could not be fetched.
    #[error("upstream error: {0}")]
    Upstream(#[from] FeedError),

    /// The endpoint needs a component this process was started without.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// A serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<FilterError> for ObserverError {
    fn from(err: FilterError) -> Self {
        Self::InvalidQuery(err.to_string())
    }
}

impl From<validator::ValidationErrors> for ObserverError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::InvalidQuery(err.to_string())
    }
}

impl IntoResponse for ObserverError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::InvalidQuery(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Upstream(e) => (StatusCode::BAD_GATEWAY, e.to_string()),
            Self::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            Self::Serialization(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, format!("JSON error: {e}"))
            }
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
