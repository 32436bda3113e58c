//! Fee configuration error types.

use rust_decimal::Decimal;
use souk_shared::AppError;
use souk_shared::types::FeeConfigId;
use thiserror::Error;

/// Errors that can occur while validating, resolving, or storing fee configs.
#[derive(Debug, Error)]
pub enum FeeError {
    // ========== Validation Errors ==========
    /// Percentage rate outside `0..=100`.
    #[error("Percentage rate must be between 0 and 100, got {0}")]
    InvalidPercentageRate(Decimal),

    /// A monetary field that must be non-negative was negative.
    #[error("{field} cannot be negative")]
    NegativeAmount {
        /// The offending field name.
        field: &'static str,
    },

    /// A tiered config without tiers.
    #[error("Tiered fee config requires at least one tier")]
    EmptyTiers,

    /// A tier whose upper bound is not above its lower bound.
    #[error("Tier {index} has max_amount <= min_amount")]
    InvalidTierRange {
        /// Position of the tier after sorting by `min_amount`.
        index: usize,
    },

    /// Two tiers cover a common amount.
    #[error("Tier {index} overlaps the previous tier")]
    OverlappingTiers {
        /// Position of the later tier after sorting by `min_amount`.
        index: usize,
    },

    /// `effective_from` is not before `effective_to`.
    #[error("effective_from must be before effective_to")]
    InvalidEffectiveWindow,

    /// `minimum_fee` exceeds `maximum_fee`.
    #[error("minimum_fee {min} exceeds maximum_fee {max}")]
    InvalidFeeBounds {
        /// Lower clamp bound.
        min: Decimal,
        /// Upper clamp bound.
        max: Decimal,
    },

    /// Scope does not agree with the restriction lists.
    #[error("Scope mismatch: {0}")]
    ScopeMismatch(String),

    /// Amount too large to price.
    #[error("Amount out of range: {0}")]
    AmountOutOfRange(Decimal),

    // ========== Lookup Errors ==========
    /// Config not found by id.
    #[error("Fee config not found: {0}")]
    ConfigNotFound(FeeConfigId),

    /// No active config applies to the given context.
    #[error("No applicable fee config found")]
    NoApplicableConfig,

    // ========== Storage Errors ==========
    /// Storage error.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Storage call exceeded its deadline.
    #[error("Storage timeout")]
    StorageTimeout,
}

impl FeeError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidPercentageRate(_) => "INVALID_PERCENTAGE_RATE",
            Self::NegativeAmount { .. } => "NEGATIVE_AMOUNT",
            Self::EmptyTiers => "EMPTY_TIERS",
            Self::InvalidTierRange { .. } => "INVALID_TIER_RANGE",
            Self::OverlappingTiers { .. } => "OVERLAPPING_TIERS",
            Self::InvalidEffectiveWindow => "INVALID_EFFECTIVE_WINDOW",
            Self::InvalidFeeBounds { .. } => "INVALID_FEE_BOUNDS",
            Self::ScopeMismatch(_) => "SCOPE_MISMATCH",
            Self::AmountOutOfRange(_) => "AMOUNT_OUT_OF_RANGE",
            Self::ConfigNotFound(_) => "FEE_CONFIG_NOT_FOUND",
            Self::NoApplicableConfig => "NO_APPLICABLE_FEE_CONFIG",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::StorageTimeout => "STORAGE_TIMEOUT",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::ConfigNotFound(_) | Self::NoApplicableConfig => 404,
            Self::Storage(_) | Self::StorageTimeout => 500,
            _ => 400,
        }
    }
}

impl From<FeeError> for AppError {
    fn from(err: FeeError) -> Self {
        match err {
            FeeError::ConfigNotFound(_) | FeeError::NoApplicableConfig => {
                Self::NotFound(err.to_string())
            }
            FeeError::Storage(msg) => Self::Storage(msg),
            FeeError::StorageTimeout => Self::StorageTimeout,
            other => Self::Validation(other.to_string()),
        }
    }
}
