//! Domain error types for CI result ingestion.
//!
//! Uses thiserror for ergonomic error handling with automatic Display implementations.

use std::fmt;

/// Application-level errors.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// CI server request failed (timeout, connection failure, non-2xx status)
    #[error("Network error: {0}")]
    Network(String),

    /// Malformed JSON or XML payload
    #[error("Parse error: {0}")]
    Parse(String),

    /// Resource not found
    #[error("{0} not found")]
    NotFound(String),

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(String),

    /// Invalid input data
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl AppError {
    /// Stable machine-readable code for this error kind.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Network(_) => "NETWORK_ERROR",
            AppError::Parse(_) => "PARSE_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::InvalidInput(_) => "INVALID_INPUT",
        }
    }

    /// Render this error as a serializable response body.
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.error_code().to_string(),
            message: self.to_string(),
        }
    }
}

/// Serializable error body emitted by the command-line entry point.
#[derive(Debug, serde::Serialize)]
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

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Network(format!("Request timed out: {}", err))
        } else if let Some(status) = err.status() {
            AppError::Network(format!("HTTP {}: {}", status.as_u16(), err))
        } else {
            AppError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Parse(format!("JSON parsing error: {}", err))
    }
}

impl From<quick_xml::DeError> for AppError {
    fn from(err: quick_xml::DeError) -> Self {
        AppError::Parse(format!("XML parsing error: {}", err))
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::InvalidInput(format!("Invalid UUID: {}", err))
    }
}
