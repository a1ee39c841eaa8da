//! Custom error types for the common library
//!
//! This module defines the errors raised while talking to the upstream
//! school-data API. HTTP-level rejections (non-2xx answers) are not errors
//! here: they are returned as values so callers can translate them.

use std::time::Duration;

use thiserror::Error;

/// Custom error type for upstream API calls
#[derive(Error, Debug)]
pub enum UpstreamError {
    /// The request could not be sent or the connection failed
    #[error("Upstream transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The call did not complete before its deadline
    #[error("Upstream request timed out after {0:?}")]
    Timeout(Duration),

    /// The response body was not the JSON we expected
    #[error("Upstream response could not be decoded: {0}")]
    Decode(#[source] reqwest::Error),

    /// A successful login response carried no usable access token
    #[error("Upstream login response did not contain an access token")]
    MissingToken,

    /// The configured base URL cannot be used to build request URLs
    #[error("Invalid upstream base URL: {0}")]
    InvalidBaseUrl(String),
}

impl UpstreamError {
    /// Whether a retry policy may try the call again
    pub fn is_retryable(&self) -> bool {
        matches!(self, UpstreamError::Transport(_))
    }
}

/// Type alias for Result with UpstreamError
pub type UpstreamResult<T> = Result<T, UpstreamError>;
