//! Storage error type and its mapping into each domain error.

use souk_core::commission::CommissionError;
use souk_core::fee::FeeError;
use souk_core::ledger::LedgerError;
use souk_core::withdrawal::WithdrawalError;
use thiserror::Error;

/// Errors raised by the document store itself.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A call did not finish within the configured deadline.
    #[error("Storage call timed out")]
    Timeout,

    /// A unique key is already taken.
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// A document vanished between read and write.
    #[error("Document not found: {0}")]
    Missing(String),

    /// Snapshot file I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot (de)serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<StorageError> for FeeError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Timeout => Self::StorageTimeout,
            other => Self::Storage(other.to_string()),
        }
    }
}

impl From<StorageError> for LedgerError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Timeout => Self::StorageTimeout,
            other => Self::Storage(other.to_string()),
        }
    }
}

impl From<StorageError> for WithdrawalError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Timeout => Self::StorageTimeout,
            StorageError::DuplicateKey(code) => Self::DuplicateWithdrawalCode(code),
            other => Self::Storage(other.to_string()),
        }
    }
}

impl From<StorageError> for CommissionError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Timeout => Self::StorageTimeout,
            other => Self::Storage(other.to_string()),
        }
    }
}
