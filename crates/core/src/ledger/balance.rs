//! Available balance: committed balance minus in-flight withdrawals.
//!
//! Always recomputed from the pending set at decision time; there is no
//! stored reserved-balance field that could drift.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Snapshot of a user's spendable funds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableBalance {
    /// Committed balance.
    pub current_balance: Decimal,
    /// Sum of `amount + fee` over pending and processing withdrawals.
    pub pending_total: Decimal,
    /// `current_balance - pending_total`.
    pub available_balance: Decimal,
}

impl AvailableBalance {
    /// Aggregates `pending` deductions against `current_balance`.
    #[must_use]
    pub fn compute<I>(current_balance: Decimal, pending: I) -> Self
    where
        I: IntoIterator<Item = Decimal>,
    {
        let pending_total: Decimal = pending.into_iter().sum();
        Self {
            current_balance,
            pending_total,
            available_balance: current_balance - pending_total,
        }
    }

    /// Amount missing to cover `required`, zero if covered.
    #[must_use]
    pub fn shortfall(&self, required: Decimal) -> Decimal {
        (required - self.available_balance).max(Decimal::ZERO)
    }

    /// True if `required` fits in the available balance.
    #[must_use]
    pub fn covers(&self, required: Decimal) -> bool {
        self.available_balance >= required
    }
}
