//! Error types for pde-gw
//!
//! Two layers:
//! - `UpstreamError`: one failed call to one model service
//! - `ApiError`: what a request handler returns, rendered as JSON

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failure of a single call to a model service
///
/// Every variant names the model slot that failed.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Connection refused, reset, DNS failure, etc.
    #[error("{model}: network error: {message}")]
    Network { model: String, message: String },

    /// Call exceeded its timeout
    #[error("{model}: timed out after {timeout_ms}ms")]
    Timeout { model: String, timeout_ms: u64 },

    /// Non-success HTTP status
    #[error("{model}: upstream returned {status}: {body}")]
    Status {
        model: String,
        status: u16,
        body: String,
    },

    /// Response body unusable
    #[error("{model}: malformed response: {message}")]
    Malformed { model: String, message: String },
}

impl UpstreamError {
    /// Model slot label the failure belongs to
    pub fn model(&self) -> &str {
        match self {
            UpstreamError::Network { model, .. }
            | UpstreamError::Timeout { model, .. }
            | UpstreamError::Status { model, .. }
            | UpstreamError::Malformed { model, .. } => model,
        }
    }
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// A model prediction call failed (502)
    #[error("Upstream model unavailable: {0}")]
    UpstreamUnavailable(#[from] UpstreamError),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<pde_common::Error> for ApiError {
    fn from(err: pde_common::Error) -> Self {
        match err {
            pde_common::Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::UpstreamUnavailable(ref err) => (
                StatusCode::BAD_GATEWAY,
                json!({
                    "error": {
                        "code": "UPSTREAM_UNAVAILABLE",
                        "message": "Gateway ensemble error",
                        "model": err.model(),
                        "detail": err.to_string(),
                    }
                }),
            ),
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": { "code": "BAD_REQUEST", "message": msg } }),
            ),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": { "code": "INTERNAL_ERROR", "message": msg } }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_error_carries_model() {
        let err = UpstreamError::Timeout {
            model: "model_b".to_string(),
            timeout_ms: 5000,
        };
        assert_eq!(err.model(), "model_b");
        assert_eq!(err.to_string(), "model_b: timed out after 5000ms");
    }

    #[test]
    fn test_status_codes() {
        let upstream: ApiError = UpstreamError::Status {
            model: "model_a".to_string(),
            status: 503,
            body: "artifacts not loaded".to_string(),
        }
        .into();
        assert_eq!(upstream.into_response().status(), StatusCode::BAD_GATEWAY);

        let bad: ApiError = pde_common::Error::InvalidInput("nope".to_string()).into();
        assert_eq!(bad.into_response().status(), StatusCode::BAD_REQUEST);

        let internal: ApiError = pde_common::Error::Config("broken".to_string()).into();
        assert_eq!(
            internal.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
