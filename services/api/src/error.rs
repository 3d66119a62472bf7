//! services/api/src/error.rs
//!
//! Defines the primary error type for the service binary and the JSON error
//! body shared by the HTTP handlers.

use crate::config::ConfigError;
use axum::{http::StatusCode, Json};
use call_desk_core::ports::PortError;
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

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

    /// Represents a failure while applying the schema migrations.
    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

/// The `{error, message?}` body every handler answers with on failure.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// What handlers return on the error path.
pub type HandlerError = (StatusCode, Json<ErrorBody>);

pub fn error_response(status: StatusCode, error: impl Into<String>) -> HandlerError {
    (
        status,
        Json(ErrorBody {
            error: error.into(),
            message: None,
        }),
    )
}

/// Maps a port failure to a response, logging it with `context`.
pub fn port_error_response(context: &str, err: PortError) -> HandlerError {
    match err {
        PortError::NotFound(what) => error_response(StatusCode::NOT_FOUND, what),
        PortError::InvalidInput(why) => error_response(StatusCode::BAD_REQUEST, why),
        PortError::Unauthorized => error_response(StatusCode::UNAUTHORIZED, "Unauthorized"),
        other => {
            error!("{}: {:?}", context, other);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    error: context.to_string(),
                    message: Some(other.to_string()),
                }),
            )
        }
    }
}
