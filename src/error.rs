//! Error types for the proxy server
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Proxy Error Enum ==
/// Unified error type for the proxy server.
///
/// Every variant is scoped to a single request; none is fatal to the process.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Upstream answered with a non-success status
    #[error("{message}")]
    UpstreamStatus { status: u16, message: String },

    /// Upstream did not answer before the per-call deadline
    #[error("Upstream timeout")]
    UpstreamTimeout,

    /// Upstream could not be reached or sent an unreadable body
    #[error("Failed to reach KCDB API")]
    UpstreamUnreachable(String),

    /// The aggregate stats fetch failed
    #[error("Failed to fetch stats")]
    StatsUnavailable(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProxyError {
    /// HTTP status surfaced to the client.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::UpstreamStatus { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            ProxyError::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::UpstreamUnreachable(_) => StatusCode::BAD_GATEWAY,
            ProxyError::StatsUnavailable(_) => StatusCode::BAD_GATEWAY,
            ProxyError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse::new(self.to_string()));

        (self.status_code(), body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the proxy server.
pub type Result<T> = std::result::Result<T, ProxyError>;
