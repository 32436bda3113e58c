//! Balance ledger repository.
//!
//! Postings take the user's lock so they serialize with withdrawal
//! creation and settlement.

use rust_decimal::Decimal;
use souk_core::ledger::{AvailableBalance, LedgerEntry, LedgerError, UserAccount, UserTier};
use souk_shared::types::UserId;

use crate::store::Database;

/// Balance ledger repository.
#[derive(Debug, Clone)]
pub struct BalanceRepository {
    db: Database,
}

impl BalanceRepository {
    /// Creates a new balance repository.
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Opens an account with a zero balance.
    pub fn create_user(&self, name: impl Into<String>, tier: UserTier) -> UserAccount {
        let account = UserAccount::new(name, tier, self.db.now());
        self.db.put_user(account.clone());
        tracing::info!(user_id = %account.id, tier = %tier, "user account created");
        account
    }

    /// Fetches an account.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the user has no account.
    pub fn get_user(&self, user_id: UserId) -> Result<UserAccount, LedgerError> {
        self.db
            .user(user_id)
            .ok_or(LedgerError::AccountNotFound(user_id))
    }

    /// Committed balance.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the user has no account.
    pub fn get_balance(&self, user_id: UserId) -> Result<Decimal, LedgerError> {
        self.get_user(user_id).map(|u| u.balance)
    }

    /// Committed balance less the user's in-flight withdrawals.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the user has no account.
    pub fn get_available_balance(&self, user_id: UserId) -> Result<AvailableBalance, LedgerError> {
        self.db.available_balance(user_id)
    }

    /// Removes `amount` from the committed balance.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientBalance` if the balance would go negative, a
    /// validation error for non-positive or fractional amounts, or
    /// `StorageTimeout` if the user's lock is not acquired in time.
    pub async fn debit(
        &self,
        user_id: UserId,
        amount: Decimal,
        memo: &str,
    ) -> Result<LedgerEntry, LedgerError> {
        let _guard = self.db.lock_user(user_id).await?;
        let entry = self.db.apply_debit(user_id, amount, memo, None)?;
        tracing::info!(user_id = %user_id, %amount, balance_after = %entry.balance_after, "balance debited");
        Ok(entry)
    }

    /// Adds `amount` to the committed balance.
    ///
    /// # Errors
    ///
    /// Returns a validation error for non-positive or fractional amounts, or
    /// `StorageTimeout` if the user's lock is not acquired in time.
    pub async fn credit(
        &self,
        user_id: UserId,
        amount: Decimal,
        memo: &str,
    ) -> Result<LedgerEntry, LedgerError> {
        let _guard = self.db.lock_user(user_id).await?;
        let entry = self.db.apply_credit(user_id, amount, memo, None)?;
        tracing::info!(user_id = %user_id, %amount, balance_after = %entry.balance_after, "balance credited");
        Ok(entry)
    }

    /// The user's ledger entries, newest first.
    #[must_use]
    pub fn entries(&self, user_id: UserId) -> Vec<LedgerEntry> {
        let mut entries = self.db.ledger_entries(user_id);
        entries.reverse();
        entries
    }
}
