//! Repository abstractions for data access.
//!
//! Repositories own the orchestration of each operation: they take the
//! per-user lock where money moves, call the pure services in `souk-core`,
//! and write the results back to the document store.

pub mod balance;
pub mod commission;
pub mod fee_config;
pub mod withdrawal;
pub mod withdrawal_fee;

pub use balance::BalanceRepository;
pub use commission::{CommissionRepository, DEFAULT_COMMISSION_NAME, RecordChangeInput};
pub use fee_config::{CalculateFeeRequest, FeeConfigFilter, FeeConfigRepository};
pub use withdrawal::{CodeGenerator, WithdrawalRepository};
pub use withdrawal_fee::WithdrawalFeeConfigRepository;
