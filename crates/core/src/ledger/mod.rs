//! User balances and their posting history.
//!
//! - `account` - User accounts and loyalty tiers
//! - `balance` - Available balance aggregation over in-flight withdrawals
//! - `entry` - Immutable ledger entries
//! - `service` - Debit and credit postings
//! - `error` - Ledger-specific error types

pub mod account;
pub mod balance;
pub mod entry;
pub mod error;
pub mod service;

#[cfg(test)]
mod service_props;

pub use account::{UserAccount, UserTier};
pub use balance::AvailableBalance;
pub use entry::{LedgerEntry, LedgerEntryType};
pub use error::LedgerError;
pub use service::LedgerService;
