//! Balance ledger error types.

use rust_decimal::Decimal;
use souk_shared::AppError;
use souk_shared::types::UserId;
use thiserror::Error;

/// Errors that can occur during balance ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Posting amount must be positive.
    #[error("Amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),

    /// Posting amount must be whole currency units.
    #[error("Amount must be a whole number of currency units, got {0}")]
    FractionalAmount(Decimal),

    // ========== Balance Errors ==========
    /// A debit would take the balance below zero.
    #[error("Insufficient balance: requested {requested}, balance {balance}")]
    InsufficientBalance {
        /// Debit amount.
        requested: Decimal,
        /// Committed balance at the time of the debit.
        balance: Decimal,
    },

    // ========== Lookup Errors ==========
    /// No account for the user.
    #[error("Account not found for user {0}")]
    AccountNotFound(UserId),

    // ========== Storage Errors ==========
    /// Storage error.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Storage call exceeded its deadline.
    #[error("Storage timeout")]
    StorageTimeout,
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NonPositiveAmount(_) => "NON_POSITIVE_AMOUNT",
            Self::FractionalAmount(_) => "FRACTIONAL_AMOUNT",
            Self::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::StorageTimeout => "STORAGE_TIMEOUT",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::NonPositiveAmount(_) | Self::FractionalAmount(_) | Self::InsufficientBalance { .. } => {
                400
            }
            Self::AccountNotFound(_) => 404,
            Self::Storage(_) | Self::StorageTimeout => 500,
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NonPositiveAmount(_) | LedgerError::FractionalAmount(_) => {
                Self::Validation(err.to_string())
            }
            LedgerError::InsufficientBalance { .. } => Self::BusinessRule {
                code: err.error_code(),
                message: err.to_string(),
            },
            LedgerError::AccountNotFound(_) => Self::NotFound(err.to_string()),
            LedgerError::Storage(msg) => Self::Storage(msg),
            LedgerError::StorageTimeout => Self::StorageTimeout,
        }
    }
}
