//! Unified error types for waypost.
//!
//! The taxonomy mirrors the gateway's propagation policy: validation
//! failures are rejected before cache/limiter/remote, not-found is a
//! distinct outcome, upstream failures are absorbed per-call, and cache
//! corruption is non-fatal to the caller.

use rmcp::model::{ErrorCode, ErrorData as McpError};

/// Unified error types for the waypost gateway.
///
/// Carries string payloads only so that outcomes can be cloned across
/// singleflight waiters.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., empty city, oversized batch).
    #[error("VALIDATION_ERROR: {0}")]
    Validation(String),

    /// Malformed or unsupported URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// The upstream legitimately found nothing.
    #[error("NOT_FOUND: {0}")]
    NotFound(String),

    /// Network failure, timeout, or non-success status from an upstream.
    #[error("UPSTREAM_ERROR: {0}")]
    Upstream(String),

    /// Internal cache invariant violation (e.g., zero TTL entry).
    #[error("CACHE_CORRUPTION: {0}")]
    CacheCorruption(String),
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::Validation(msg) => (-32602, msg.clone()),
            Error::InvalidUrl(msg) => (-32003, msg.clone()),
            Error::NotFound(msg) => (-32004, msg.clone()),
            Error::Upstream(msg) => (-32005, msg.clone()),
            Error::CacheCorruption(msg) => (-32002, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}
