//! HTTP error mapping.

use std::net::SocketAddr;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tenantbox_common::error::TenantboxError;
use thiserror::Error;

/// Result type alias for handlers.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors a handler can answer with.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A coordinator or validation failure.
    #[error(transparent)]
    Lifecycle(#[from] TenantboxError),

    /// The blocking task running the operation did not complete.
    #[error("operation aborted: {0}")]
    Aborted(String),
}

impl ApiError {
    /// Returns the HTTP status code for this error.
    ///
    /// A failed lifecycle step is classified by its root cause, so a
    /// container that vanished mid-operation still answers 404.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Lifecycle(err) => match err.root_cause() {
                TenantboxError::NotFound { .. } => StatusCode::NOT_FOUND,
                TenantboxError::NotRunning { .. }
                | TenantboxError::InvalidIdentity { .. }
                | TenantboxError::InvalidCommand { .. } => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Aborted(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message.
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "request failed");
        } else {
            tracing::warn!(status = %status, error = %self, "request rejected");
        }
        let body = ErrorResponse {
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Errors starting or running the HTTP server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listen address is not a socket address.
    #[error("invalid listen address {addr:?}: {source}")]
    Address {
        /// Configured address.
        addr: String,
        /// Parse failure.
        source: std::net::AddrParseError,
    },

    /// The listener could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address that could not be bound.
        addr: SocketAddr,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The server loop failed.
    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(err: TenantboxError) -> StatusCode {
        ApiError::from(err).status_code()
    }

    #[test]
    fn not_found_maps_to_404() {
        assert_eq!(
            status(TenantboxError::NotFound {
                identity: "a".into()
            }),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn precondition_and_validation_map_to_400() {
        assert_eq!(
            status(TenantboxError::NotRunning {
                identity: "a".into()
            }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(TenantboxError::InvalidIdentity {
                identity: String::new(),
                reason: "identity is empty"
            }),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn failed_step_maps_by_root_cause() {
        let vanished = TenantboxError::StepFailed {
            identity: "a".into(),
            step: "exec",
            source: Box::new(TenantboxError::NotFound {
                identity: "a".into(),
            }),
        };
        assert_eq!(status(vanished), StatusCode::NOT_FOUND);

        let stopped = TenantboxError::StepFailed {
            identity: "a".into(),
            step: "exec",
            source: Box::new(TenantboxError::NotRunning {
                identity: "a".into(),
            }),
        };
        assert_eq!(status(stopped), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn runtime_failures_map_to_500() {
        let step = TenantboxError::StepFailed {
            identity: "a".into(),
            step: "pull",
            source: Box::new(TenantboxError::Runtime {
                operation: "pull",
                detail: "registry unreachable".into(),
            }),
        };
        assert_eq!(status(step), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            ApiError::Aborted("panicked".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
