//! Immutable balance ledger entries.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use souk_shared::types::{LedgerEntryId, UserId};

/// Direction of a balance posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerEntryType {
    /// Money leaves the user's balance.
    Debit,
    /// Money enters the user's balance.
    Credit,
}

/// One posting against a user's balance. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    /// Entry id.
    pub id: LedgerEntryId,
    /// Account owner.
    pub user_id: UserId,
    /// Debit or credit.
    pub entry_type: LedgerEntryType,
    /// Unsigned amount.
    pub amount: Decimal,
    /// Committed balance right after this posting.
    pub balance_after: Decimal,
    /// Free-text description.
    pub memo: String,
    /// External reference, e.g. a withdrawal code.
    pub reference: Option<String>,
    /// Posting time.
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Returns the signed effect on the balance.
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        match self.entry_type {
            LedgerEntryType::Debit => -self.amount,
            LedgerEntryType::Credit => self.amount,
        }
    }
}
