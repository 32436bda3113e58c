//! Commission error types.

use souk_shared::AppError;
use souk_shared::types::ShopId;
use thiserror::Error;

use crate::fee::FeeError;

/// Errors that can occur while changing or listing commissions.
#[derive(Debug, Error)]
pub enum CommissionError {
    /// Shop not found.
    #[error("Shop not found: {0}")]
    ShopNotFound(ShopId),

    /// The resulting config failed validation.
    #[error(transparent)]
    Fee(#[from] FeeError),

    /// Storage error.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Storage call exceeded its deadline.
    #[error("Storage timeout")]
    StorageTimeout,
}

impl CommissionError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ShopNotFound(_) => "SHOP_NOT_FOUND",
            Self::Fee(err) => err.error_code(),
            Self::Storage(_) => "STORAGE_ERROR",
            Self::StorageTimeout => "STORAGE_TIMEOUT",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::ShopNotFound(_) => 404,
            Self::Fee(err) => err.http_status_code(),
            Self::Storage(_) | Self::StorageTimeout => 500,
        }
    }
}

impl From<CommissionError> for AppError {
    fn from(err: CommissionError) -> Self {
        match err {
            CommissionError::ShopNotFound(_) => Self::NotFound(err.to_string()),
            CommissionError::Fee(err) => err.into(),
            CommissionError::Storage(msg) => Self::Storage(msg),
            CommissionError::StorageTimeout => Self::StorageTimeout,
        }
    }
}
