//! Withdrawal requests and their lifecycle.
//!
//! This module implements withdrawal validation, fee resolution, the status
//! state machine, and the per-user rate limits.
//!
//! # Modules
//!
//! - `types` - Withdrawal record, status table, bank info, snapshots
//! - `fee` - Withdrawal fee configuration
//! - `policy` - Amount bounds, balance floor, daily and pending caps
//! - `service` - Request validation, fee and funds decisions, record building
//! - `error` - Withdrawal-specific error types

pub mod error;
pub mod fee;
pub mod policy;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use error::WithdrawalError;
pub use fee::{FeeQuote, FeeSource, WithdrawalFeeConfig, WithdrawalFeeConfigInput};
pub use policy::{DayWindow, RateLimitPolicy, WithdrawalPolicy};
pub use service::{WithdrawalRequest, WithdrawalService};
pub use types::{
    BalanceSnapshot, BankInfo, BankInfoInput, FeeInfo, ProcessingInfo, Withdrawal,
    WithdrawalFilter, WithdrawalStatus, WithdrawalView,
};
