use std::fmt;

use reqwest::{header::HeaderMap, StatusCode};
use url::Url;

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum MewsError {
    /// The client has no access token configured.
    #[error("no access token specified")]
    MissingAccessToken,
    /// The client has no client token configured.
    #[error("no client token specified")]
    MissingClientToken,
    /// Base URL is malformed or the request URL could not be built.
    #[error("invalid url: {0}")]
    Url(String),
    /// A configured header value (such as the user agent) is not a valid header.
    #[error("invalid header: {0}")]
    InvalidHeader(String),
    /// Request payload could not be encoded as JSON.
    #[error("serialization error: {0}")]
    Serialization(#[source] serde_json::Error),
    /// The request deadline elapsed before a response arrived.
    #[error("request timed out after {attempts} attempt(s)")]
    Timeout {
        /// Total number of sends made for this call.
        attempts: usize,
    },
    /// The request context was cancelled by the caller.
    #[error("request cancelled")]
    Cancelled,
    /// Network or request execution error from `reqwest`.
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),
    /// The server kept answering 429 past the configured resend limit.
    #[error("rate limited: gave up after {resends} resend(s)")]
    RateLimitExhausted {
        /// Number of resends made after a 429 response.
        resends: usize,
    },
    /// Non-success HTTP status returned by the API.
    #[error(transparent)]
    Api(#[from] ApiError),
    /// Response body did not match the destination type.
    #[error("decode error: {0}")]
    Decode(String),
}

impl MewsError {
    /// Returns the HTTP status code when the error came from an API response.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Api(err) => Some(err.status),
            _ => None,
        }
    }
}

/// Error returned by the API for a non-2xx response.
#[derive(Clone, Debug)]
pub struct ApiError {
    /// HTTP status of the response.
    pub status: StatusCode,
    /// Machine-readable fault code (`Details` in the error body).
    pub details: String,
    /// Human-readable fault message, or the status line when the body has none.
    pub message: String,
    /// URL the failed request was sent to.
    pub url: Url,
    /// Response headers.
    pub headers: HeaderMap,
    /// Raw response body text.
    pub body: String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "POST {}: {} ({} {})",
            self.url,
            self.status.as_u16(),
            self.details,
            self.message
        )
    }
}

impl std::error::Error for ApiError {}
