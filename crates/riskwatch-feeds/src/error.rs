//! Error types for upstream feed access.
//!
//! Every failure to obtain a feed response is a [`FeedError`]. The
//! aggregator treats any of them as a fetch failure for the whole cycle.

/// Errors that can occur while fetching or decoding a feed.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// The request could not be sent or the connection failed.
    #[error("{feed} request failed: {message}")]
    Request {
        /// Which feed was being queried.
        feed: &'static str,
        /// Transport error description.
        message: String,
    },

    /// The feed answered with a non-2xx status.
    #[error("{feed} returned {status}: {body}")]
    Status {
        /// Which feed was being queried.
        feed: &'static str,
        /// HTTP status code.
        status: u16,
        /// Response body text.
        body: String,
    },

    /// The response body was not the expected shape.
    #[error("{feed} response parse failed: {message}")]
    Decode {
        /// Which feed was being queried.
        feed: &'static str,
        /// Parser error description.
        message: String,
    },

    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Client(String),
}

impl FeedError {
    /// Name of the feed that failed, if the error is tied to one.
    pub const fn feed(&self) -> Option<&'static str> {
        match self {
            Self::Request { feed, .. } | Self::Status { feed, .. } | Self::Decode { feed, .. } => {
                Some(feed)
            }
            Self::Client(_) => None,
        }
    }
}
