//! Serializable image of the document store.

use serde::{Deserialize, Serialize};
use souk_core::commission::{CommissionChange, Shop};
use souk_core::fee::FeeConfig;
use souk_core::ledger::{LedgerEntry, UserAccount};
use souk_core::withdrawal::{Withdrawal, WithdrawalFeeConfig};

/// Every collection of the store, flattened to lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// User accounts.
    #[serde(default)]
    pub users: Vec<UserAccount>,
    /// Shops.
    #[serde(default)]
    pub shops: Vec<Shop>,
    /// Platform fee configs.
    #[serde(default)]
    pub fee_configs: Vec<FeeConfig>,
    /// Withdrawal fee configs.
    #[serde(default)]
    pub withdrawal_fee_configs: Vec<WithdrawalFeeConfig>,
    /// Withdrawals.
    #[serde(default)]
    pub withdrawals: Vec<Withdrawal>,
    /// Ledger entries, oldest first per user.
    #[serde(default)]
    pub ledger_entries: Vec<LedgerEntry>,
    /// Commission audit rows, oldest first per shop.
    #[serde(default)]
    pub commission_changes: Vec<CommissionChange>,
}

impl Snapshot {
    /// Total number of documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
            + self.shops.len()
            + self.fee_configs.len()
            + self.withdrawal_fee_configs.len()
            + self.withdrawals.len()
            + self.ledger_entries.len()
            + self.commission_changes.len()
    }

    /// True if the snapshot holds no documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
