//! Custom error types for the proxy service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::UpstreamError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Custom error type for the proxy service
///
/// Every variant renders as `{"error": "<message>"}`.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request carried no session cookie
    #[error("Unauthorized")]
    Unauthorized,

    /// Upstream rejected the session token
    #[error("Session expired")]
    SessionExpired,

    /// Upstream answered with an error we pass through
    #[error("{message}")]
    Upstream { status: StatusCode, message: String },

    /// Upstream did not answer before the deadline
    #[error("Request timeout")]
    Timeout,

    /// Internal server error
    #[error("Internal server error")]
    InternalServerError,
}

impl ApiError {
    /// Status code sent to the client
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized | ApiError::SessionExpired => StatusCode::UNAUTHORIZED,
            ApiError::Upstream { status, .. } => *status,
            ApiError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ApiError::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<UpstreamError> for ApiError {
    fn from(e: UpstreamError) -> Self {
        match e {
            UpstreamError::Timeout(deadline) => {
                error!("Upstream request timed out after {:?}", deadline);
                ApiError::Timeout
            }
            other => {
                error!("Upstream request failed: {}", other);
                ApiError::InternalServerError
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.to_string(),
        }));

        (self.status(), body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
