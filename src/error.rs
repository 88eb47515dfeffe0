//! Error types for the search cache
//!
//! Provides unified error handling using thiserror.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for the cache and the search surface built on it.
///
/// `Clone` so one outcome can be handed to every caller waiting on the same
/// computation.
#[derive(Error, Debug, Clone)]
pub enum CacheError {
    /// Invalid key, payload or request parameter
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Key or resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Underlying cache storage unavailable or exhausted
    #[error("Cache store fault: {0}")]
    StoreFault(String),

    /// The fallback computation failed
    #[error("Computation failed: {0:#}")]
    ComputeFailure(Arc<anyhow::Error>),

    /// The fallback computation exceeded the configured timeout
    #[error("Computation for '{key}' timed out after {after:?}")]
    ComputeTimeout { key: String, after: Duration },

    /// The computing caller went away before producing an outcome
    #[error("Computation cancelled: {0}")]
    Cancelled(String),

    /// Payload could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CacheError {
    /// Wraps a failed computation, keeping its error chain.
    pub fn compute(err: anyhow::Error) -> Self {
        CacheError::ComputeFailure(Arc::new(err))
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::StoreFault(_) | CacheError::Cancelled(_) => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::ComputeTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            CacheError::ComputeFailure(_)
            | CacheError::Serialization(_)
            | CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the search cache.
pub type Result<T> = std::result::Result<T, CacheError>;
