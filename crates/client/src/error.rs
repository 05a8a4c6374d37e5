//! Upstream client error types.
//!
//! Every variant the gateways absorb into an `Upstream` outcome keeps a
//! distinct Display text, so batch `error_message`s still tell a timeout
//! from a task failure from a malformed payload.

use std::sync::Arc;

/// Errors from the upstream HTTP clients.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Failed to construct the HTTP client.
    #[error("client build failed: {0}")]
    Build(String),

    /// Malformed or unsupported URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Request timed out at the HTTP layer.
    #[error("request timeout")]
    Timeout,

    /// Crawl task did not complete within the poll budget.
    #[error("crawl task timed out: {0}")]
    TaskTimeout(String),

    /// Authentication rejected by the upstream.
    #[error("authentication failed: upstream rejected credentials")]
    AuthFailed,

    /// Non-success HTTP status.
    #[error("HTTP error: {status}")]
    HttpStatus { status: u16 },

    /// The crawler reported the task itself as failed.
    #[error("crawl task failed: {0}")]
    TaskFailed(String),

    /// Network-level failure.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Response could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { ClientError::Timeout } else { ClientError::Network(Arc::new(err)) }
    }
}
