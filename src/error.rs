//! Application error types with HTTP response conversion.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Application-level errors for graphmart.
#[derive(Error, Debug)]
pub enum AppError {
    // Store errors
    #[error("Graph query error: {message}")]
    Query { message: String, query: String },

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Connection pool exhausted: {0}")]
    ResourceExhausted(String),

    #[error("{operation} failed: {source}")]
    Repository {
        operation: &'static str,
        #[source]
        source: Box<AppError>,
    },

    #[error("Internal error: {0}")]
    Internal(String),

    // Domain errors
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("User already exists: {0}")]
    EmailTaken(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Validation error: {0}")]
    Validation(String),

    // Config errors
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl AppError {
    /// Tags a store failure with the repository operation that raised it.
    ///
    /// Domain errors pass through unchanged so callers can still match on
    /// them; only failures coming out of the store are wrapped.
    pub fn in_operation(self, operation: &'static str) -> Self {
        match self {
            AppError::Query { .. } | AppError::Internal(_) | AppError::Constraint(_) => {
                AppError::Repository {
                    operation,
                    source: Box::new(self),
                }
            }
            other => other,
        }
    }

    /// Status code and stable application code for this error.
    pub fn status(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::ProductNotFound(_) => (StatusCode::NOT_FOUND, "PRODUCT_NOT_FOUND"),
            AppError::UserNotFound(_) => (StatusCode::NOT_FOUND, "USER_NOT_FOUND"),
            AppError::EmailTaken(_) => (StatusCode::CONFLICT, "EMAIL_TAKEN"),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::ResourceExhausted(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "RESOURCE_EXHAUSTED")
            }
            AppError::Query { .. } | AppError::Constraint(_) | AppError::Repository { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR")
            }
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR"),
        }
    }
}

/// Extension for tagging repository results with their operation name.
pub trait OperationExt<T> {
    fn in_operation(self, operation: &'static str) -> Result<T, AppError>;
}

impl<T> OperationExt<T> for Result<T, AppError> {
    fn in_operation(self, operation: &'static str) -> Result<T, AppError> {
        self.map_err(|e| e.in_operation(operation))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status();

        // Store and internal failures are logged, never echoed to clients
        let message = if status.is_server_error() && status != StatusCode::SERVICE_UNAVAILABLE {
            tracing::error!(error = %self, code, "request failed");
            "Server error".to_string()
        } else {
            self.to_string()
        };

        (
            status,
            Json(ErrorBody {
                error: code,
                message,
            }),
        )
            .into_response()
    }
}
