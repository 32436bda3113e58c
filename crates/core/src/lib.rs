//! Core business logic for Souk.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `fee` - Platform fee configs, fee math, and config resolution
//! - `ledger` - User balances, available balance, and ledger entries
//! - `withdrawal` - Withdrawal requests, fees, limits, and the status machine
//! - `commission` - Seller commissions and the commission audit log
//! - `clock` - Injectable time source

pub mod clock;
pub mod commission;
pub mod fee;
pub mod ledger;
pub mod withdrawal;

pub use clock::{Clock, ManualClock, SystemClock};
