//! services/api/src/error.rs
//!
//! Defines the primary error type for the API service and the mapping from
//! core errors to HTTP responses.

use axum::{http::StatusCode, Json};
use serde::Serialize;
use skill_swap_core::ports::PortError;
use tracing::{debug, error};
use utoipa::ToSchema;

use crate::config::ConfigError;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents an error while running the embedded migrations.
    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

/// The JSON body returned with every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error kind, e.g. `duplicate_request`.
    pub error: String,
    pub message: String,
}

/// The error half of every handler's `Result`.
pub type HttpError = (StatusCode, Json<ErrorBody>);

pub fn status_for(err: &PortError) -> StatusCode {
    match err {
        PortError::NotFound(_) => StatusCode::NOT_FOUND,
        PortError::NotAuthorized(_) => StatusCode::FORBIDDEN,
        PortError::Unauthorized => StatusCode::UNAUTHORIZED,
        PortError::SelfConnection
        | PortError::AlreadyConnected
        | PortError::DuplicateRequest
        | PortError::AlreadyProcessed
        | PortError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        PortError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Converts a core error into a response, hiding internal details from the client.
pub fn http_error(err: PortError) -> HttpError {
    let status = status_for(&err);
    let message = match &err {
        PortError::Unexpected(detail) => {
            error!("Internal error while handling request: {}", detail);
            "An unexpected internal error occurred".to_string()
        }
        other => {
            debug!("Request rejected: {}", other);
            other.to_string()
        }
    };
    (
        status,
        Json(ErrorBody {
            error: err.kind().to_string(),
            message,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_per_error_kind() {
        assert_eq!(
            status_for(&PortError::NotFound("x".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&PortError::NotAuthorized("x".into())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(status_for(&PortError::DuplicateRequest), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(&PortError::Unauthorized), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_internal_details_are_not_leaked() {
        let (status, Json(body)) = http_error(PortError::Unexpected("pool timed out".into()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "internal");
        assert!(!body.message.contains("pool"));
    }
}
