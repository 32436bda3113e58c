//! Withdrawal error types.
//!
//! Validation and business-rule errors are raised before any mutation, so a
//! caller receiving one of them can rely on no side effects having happened.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use souk_shared::AppError;
use souk_shared::types::{UserId, WithdrawalFeeConfigId};
use souk_shared::types::money::format_amount;
use thiserror::Error;

use super::types::WithdrawalStatus;
use crate::ledger::LedgerError;

/// Errors that can occur while requesting or progressing a withdrawal.
#[derive(Debug, Error)]
pub enum WithdrawalError {
    // ========== Lookup Errors ==========
    /// No account for the requesting user.
    #[error("User not found: {0}")]
    UserNotFound(UserId),

    /// Withdrawal not found by id or code.
    #[error("Withdrawal not found: {0}")]
    WithdrawalNotFound(String),

    /// Withdrawal fee config not found by id.
    #[error("Withdrawal fee config not found: {0}")]
    FeeConfigNotFound(WithdrawalFeeConfigId),

    // ========== Validation Errors ==========
    /// Malformed or out-of-range input.
    #[error("Validation error: {0}")]
    Validation(String),

    // ========== Business Rule Errors ==========
    /// Available balance does not cover `amount + fee`.
    #[error(
        "Insufficient available balance: required {}, available {}, shortfall {}",
        money(.required),
        money(.available),
        money(.shortfall)
    )]
    InsufficientAvailableBalance {
        /// `amount + fee`.
        required: Decimal,
        /// Available balance at decision time.
        available: Decimal,
        /// `required - available`.
        shortfall: Decimal,
    },

    /// The withdrawal would leave less than the configured floor.
    #[error(
        "Balance after withdrawal would be {}, minimum is {}",
        money(.balance_after),
        money(.minimum)
    )]
    MinimumBalanceRequired {
        /// Configured floor.
        minimum: Decimal,
        /// Projected available balance after the withdrawal.
        balance_after: Decimal,
    },

    /// Attempted a transition outside the status table.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition {
        /// Current status.
        from: WithdrawalStatus,
        /// Requested status.
        to: WithdrawalStatus,
    },

    // ========== Conflict Errors ==========
    /// Generated code collided with an existing withdrawal.
    #[error("Withdrawal code {0} already exists")]
    DuplicateWithdrawalCode(String),

    // ========== Rate Limit Errors ==========
    /// Daily request cap reached.
    #[error("Daily withdrawal limit of {limit} reached ({count} today), resets at {reset_at}")]
    DailyLimitExceeded {
        /// Configured cap.
        limit: u32,
        /// Requests already made today.
        count: u32,
        /// Next local midnight.
        reset_at: DateTime<Utc>,
    },

    /// Too many withdrawals still pending or processing.
    #[error("Too many pending withdrawals: {count} of {limit}")]
    TooManyPendingWithdrawals {
        /// Configured cap.
        limit: u32,
        /// In-flight withdrawals.
        count: u32,
    },

    // ========== Storage Errors ==========
    /// Storage error.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Storage call exceeded its deadline.
    #[error("Storage timeout")]
    StorageTimeout,
}

impl WithdrawalError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UserNotFound(_) => "USER_NOT_FOUND",
            Self::WithdrawalNotFound(_) => "WITHDRAWAL_NOT_FOUND",
            Self::FeeConfigNotFound(_) => "WITHDRAWAL_FEE_CONFIG_NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InsufficientAvailableBalance { .. } => "INSUFFICIENT_AVAILABLE_BALANCE",
            Self::MinimumBalanceRequired { .. } => "MINIMUM_BALANCE_REQUIRED",
            Self::InvalidStatusTransition { .. } => "INVALID_STATUS_TRANSITION",
            Self::DuplicateWithdrawalCode(_) => "DUPLICATE_WITHDRAWAL_CODE",
            Self::DailyLimitExceeded { .. } => "DAILY_LIMIT_EXCEEDED",
            Self::TooManyPendingWithdrawals { .. } => "TOO_MANY_PENDING_WITHDRAWALS",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::StorageTimeout => "STORAGE_TIMEOUT",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::UserNotFound(_) | Self::WithdrawalNotFound(_) | Self::FeeConfigNotFound(_) => 404,
            Self::Validation(_)
            | Self::InsufficientAvailableBalance { .. }
            | Self::MinimumBalanceRequired { .. }
            | Self::InvalidStatusTransition { .. } => 400,
            Self::DuplicateWithdrawalCode(_) => 409,
            Self::DailyLimitExceeded { .. } | Self::TooManyPendingWithdrawals { .. } => 429,
            Self::Storage(_) | Self::StorageTimeout => 500,
        }
    }

    /// True if the caller may retry the identical request.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::DuplicateWithdrawalCode(_))
    }
}

impl From<LedgerError> for WithdrawalError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::AccountNotFound(user_id) => Self::UserNotFound(user_id),
            LedgerError::InsufficientBalance { requested, balance } => {
                Self::InsufficientAvailableBalance {
                    required: requested,
                    available: balance,
                    shortfall: requested - balance,
                }
            }
            LedgerError::NonPositiveAmount(_) | LedgerError::FractionalAmount(_) => {
                Self::Validation(err.to_string())
            }
            LedgerError::Storage(msg) => Self::Storage(msg),
            LedgerError::StorageTimeout => Self::StorageTimeout,
        }
    }
}

impl From<WithdrawalError> for AppError {
    fn from(err: WithdrawalError) -> Self {
        match err {
            WithdrawalError::UserNotFound(_)
            | WithdrawalError::WithdrawalNotFound(_)
            | WithdrawalError::FeeConfigNotFound(_) => Self::NotFound(err.to_string()),
            WithdrawalError::Validation(msg) => Self::Validation(msg),
            WithdrawalError::InsufficientAvailableBalance { .. }
            | WithdrawalError::MinimumBalanceRequired { .. }
            | WithdrawalError::InvalidStatusTransition { .. } => Self::BusinessRule {
                code: err.error_code(),
                message: err.to_string(),
            },
            WithdrawalError::DuplicateWithdrawalCode(_) => Self::Conflict(err.to_string()),
            WithdrawalError::DailyLimitExceeded { .. }
            | WithdrawalError::TooManyPendingWithdrawals { .. } => {
                Self::RateLimited(err.to_string())
            }
            WithdrawalError::Storage(msg) => Self::Storage(msg),
            WithdrawalError::StorageTimeout => Self::StorageTimeout,
        }
    }
}

fn money(amount: &Decimal) -> String {
    format_amount(*amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn reset() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 2, 17, 0, 0).unwrap()
    }

    #[rstest]
    #[case(WithdrawalError::UserNotFound(UserId::new()), 404)]
    #[case(WithdrawalError::Validation("x".into()), 400)]
    #[case(WithdrawalError::InsufficientAvailableBalance { required: dec!(1), available: dec!(0), shortfall: dec!(1) }, 400)]
    #[case(WithdrawalError::MinimumBalanceRequired { minimum: dec!(1), balance_after: dec!(0) }, 400)]
    #[case(WithdrawalError::DuplicateWithdrawalCode("WD".into()), 409)]
    #[case(WithdrawalError::DailyLimitExceeded { limit: 5, count: 5, reset_at: reset() }, 429)]
    #[case(WithdrawalError::TooManyPendingWithdrawals { limit: 3, count: 3 }, 429)]
    #[case(WithdrawalError::StorageTimeout, 500)]
    fn test_http_status_codes(#[case] err: WithdrawalError, #[case] status: u16) {
        assert_eq!(err.http_status_code(), status);
        let app: AppError = err.into();
        assert_eq!(app.status_code(), status);
    }

    #[test]
    fn test_only_duplicate_code_is_retryable() {
        assert!(WithdrawalError::DuplicateWithdrawalCode("WD1".into()).is_retryable());
        assert!(!WithdrawalError::StorageTimeout.is_retryable());
        assert!(!WithdrawalError::Validation("x".into()).is_retryable());
    }

    #[test]
    fn test_insufficient_balance_message_keeps_amounts() {
        let err = WithdrawalError::InsufficientAvailableBalance {
            required: dec!(70000),
            available: dec!(69000),
            shortfall: dec!(1000),
        };
        let body = AppError::from(err).to_body();
        assert_eq!(body.code, "INSUFFICIENT_AVAILABLE_BALANCE");
        assert!(body.message.contains("70,000"));
        assert!(body.message.contains("69,000"));
        assert!(body.message.contains("1,000"));
    }

    #[test]
    fn test_ledger_overdraft_maps_to_insufficient_available() {
        let err: WithdrawalError = LedgerError::InsufficientBalance {
            requested: dec!(5000),
            balance: dec!(3000),
        }
        .into();
        assert!(matches!(
            err,
            WithdrawalError::InsufficientAvailableBalance { shortfall, .. } if shortfall == dec!(2000)
        ));
    }
}
