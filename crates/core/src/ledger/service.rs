//! Balance postings.
//!
//! Pure functions over a [`UserAccount`]. Callers are responsible for
//! serializing postings per user; the storage layer holds a per-user lock
//! around every call.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use souk_shared::types::LedgerEntryId;
use souk_shared::types::money::is_whole;

use super::account::UserAccount;
use super::entry::{LedgerEntry, LedgerEntryType};
use super::error::LedgerError;

/// Stateless ledger service.
pub struct LedgerService;

impl LedgerService {
    /// Removes `amount` from the account.
    ///
    /// # Errors
    ///
    /// Fails without touching the account if the amount is not a positive
    /// whole number or exceeds the committed balance.
    pub fn debit(
        account: &mut UserAccount,
        amount: Decimal,
        memo: impl Into<String>,
        reference: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<LedgerEntry, LedgerError> {
        Self::validate_amount(amount)?;
        if amount > account.balance {
            return Err(LedgerError::InsufficientBalance {
                requested: amount,
                balance: account.balance,
            });
        }
        account.balance -= amount;
        account.updated_at = now;
        Ok(Self::entry(account, LedgerEntryType::Debit, amount, memo, reference, now))
    }

    /// Adds `amount` to the account.
    ///
    /// # Errors
    ///
    /// Fails if the amount is not a positive whole number.
    pub fn credit(
        account: &mut UserAccount,
        amount: Decimal,
        memo: impl Into<String>,
        reference: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<LedgerEntry, LedgerError> {
        Self::validate_amount(amount)?;
        account.balance += amount;
        account.updated_at = now;
        Ok(Self::entry(account, LedgerEntryType::Credit, amount, memo, reference, now))
    }

    fn validate_amount(amount: Decimal) -> Result<(), LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::NonPositiveAmount(amount));
        }
        if !is_whole(amount) {
            return Err(LedgerError::FractionalAmount(amount));
        }
        Ok(())
    }

    fn entry(
        account: &UserAccount,
        entry_type: LedgerEntryType,
        amount: Decimal,
        memo: impl Into<String>,
        reference: Option<String>,
        now: DateTime<Utc>,
    ) -> LedgerEntry {
        LedgerEntry {
            id: LedgerEntryId::new(),
            user_id: account.id,
            entry_type,
            amount,
            balance_after: account.balance,
            memo: memo.into(),
            reference,
            created_at: now,
        }
    }
}
