//! Domain error types for the tenant auth server.
//!
//! Uses thiserror for ergonomic error handling with automatic Display implementations.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use std::fmt;

/// Message returned for every failed login, whatever the cause.
pub const INVALID_CREDENTIALS_MSG: &str = "Invalid username or password";

/// Message returned when `(account_id, username)` is already in use.
pub const USERNAME_TAKEN_MSG: &str = "Username is already taken";

/// Application-level errors.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Missing or malformed input
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Unknown user or wrong password (never says which)
    #[error("{}", INVALID_CREDENTIALS_MSG)]
    InvalidCredentials,

    /// Missing or invalid token, account key or admin key
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but lacking the required role
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Uniqueness violation (e.g. username taken)
    #[error("{0}")]
    Conflict(String),

    /// Resource not found
    #[error("{0} not found")]
    NotFound(String),

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(String),

    /// Session token could not be signed
    #[error("Signing error: {0}")]
    Signing(String),

    /// Unexpected internal failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_) | AppError::Signing(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let (error_code, response_message) = match self {
            AppError::Validation(_) => ("INVALID_INPUT", self.to_string()),
            AppError::InvalidCredentials => {
                ("INVALID_CREDENTIALS", INVALID_CREDENTIALS_MSG.to_string())
            }
            AppError::Unauthorized(_) => ("UNAUTHORIZED", self.to_string()),
            AppError::Forbidden(_) => ("FORBIDDEN", self.to_string()),
            AppError::Conflict(_) => ("CONFLICT", self.to_string()),
            AppError::NotFound(_) => ("NOT_FOUND", self.to_string()),
            AppError::Database(err_str) => {
                tracing::error!("Database error: {}", err_str);
                (
                    "DATABASE_ERROR",
                    "An internal database error occurred".to_string(),
                )
            }
            AppError::Signing(err_str) => {
                tracing::error!("Signing error: {}", err_str);
                ("SIGNING_ERROR", "Failed to issue session token".to_string())
            }
            AppError::Internal(err_str) => {
                tracing::error!("Internal error: {}", err_str);
                ("INTERNAL_ERROR", "An internal error occurred".to_string())
            }
        };

        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: error_code.to_string(),
            message: response_message,
        })
    }
}

/// Error response body matching OpenAPI schema.
#[derive(Debug, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

// Conversion implementations for common error types

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Validation(format!("JSON parsing error: {}", err))
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::Validation(format!("Invalid UUID: {}", err))
    }
}
