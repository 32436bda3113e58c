//! Application-wide error types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
///
/// Domain errors from `souk-core` convert into this umbrella so the outer
/// layers only need to render one shape.
#[derive(Debug, Error)]
pub enum AppError {
    /// Access denied.
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Business rule violation (insufficient funds, invalid transition, ...).
    #[error("Business rule violation: {message}")]
    BusinessRule {
        /// Machine-readable code from the originating domain error.
        code: &'static str,
        /// Human-readable message.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// Conflict (e.g., duplicate generated code). Safe to retry.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Storage error.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Storage call exceeded its deadline.
    #[error("Storage timeout")]
    StorageTimeout,

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Validation(_) | Self::BusinessRule { .. } => 400,
            Self::RateLimited(_) => 429,
            Self::Conflict(_) => 409,
            Self::Storage(_) | Self::StorageTimeout | Self::Config(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::BusinessRule { code, .. } => *code,
            Self::RateLimited(_) => "RATE_LIMIT_EXCEEDED",
            Self::Conflict(_) => "CONFLICT",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::StorageTimeout => "STORAGE_TIMEOUT",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns true for 5xx errors whose details must not reach end users.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        self.status_code() >= 500
    }

    /// Builds the response body, hiding internals for infrastructure faults.
    #[must_use]
    pub fn to_body(&self) -> ErrorBody {
        let message = if self.is_internal() {
            "An internal error occurred, please try again later".to_string()
        } else {
            self.to_string()
        };
        ErrorBody {
            code: self.error_code().to_string(),
            message,
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Machine-readable error payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Stable machine-readable code, e.g. `INSUFFICIENT_AVAILABLE_BALANCE`.
    pub code: String,
    /// Human-readable message.
    pub message: String,
}
