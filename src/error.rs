//! Error types for the worker
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Worker Error Enum ==
/// Unified error type for the worker and its HTTP host.
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Network fetch failed outright
    #[error("Network error: {0}")]
    Network(String),

    /// Network fetch did not complete in time
    #[error("Network timeout after {after_ms}ms: {url}")]
    Timeout { url: String, after_ms: u64 },

    /// Cache storage backend failed
    #[error("Cache storage error: {0}")]
    CacheStorage(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Notification display or window client call failed
    #[error("Platform error: {0}")]
    Platform(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl WorkerError {
    /// True for failures that the navigation fallback recovers from.
    pub fn is_network_failure(&self) -> bool {
        matches!(self, WorkerError::Network(_) | WorkerError::Timeout { .. })
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for WorkerError {
    fn into_response(self) -> Response {
        let status = match &self {
            WorkerError::Network(_) => StatusCode::BAD_GATEWAY,
            WorkerError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            WorkerError::CacheStorage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            WorkerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            WorkerError::Platform(_) => StatusCode::INTERNAL_SERVER_ERROR,
            WorkerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the worker.
pub type Result<T> = std::result::Result<T, WorkerError>;
