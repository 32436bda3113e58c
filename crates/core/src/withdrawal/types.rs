//! Withdrawal domain types.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use souk_shared::types::money::{SNAPSHOT_EPSILON, format_amount};
use souk_shared::types::{UserId, WithdrawalId};

use super::error::WithdrawalError;

/// Withdrawal status.
///
/// The valid transitions are:
/// - Pending → Processing, Cancelled, Success
/// - Processing → Completed, Failed, Cancelled, Success
/// - Failed → Processing (retry)
/// - Completed, Cancelled, Success are terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WithdrawalStatus {
    /// Requested, funds reserved through the pending set.
    Pending,
    /// Picked up by an operator.
    Processing,
    /// Paid out.
    Completed,
    /// Payout failed; may be retried.
    Failed,
    /// Abandoned before payout.
    Cancelled,
    /// Auto-approved fast path.
    Success,
}

impl WithdrawalStatus {
    /// Every status, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Pending,
        Self::Processing,
        Self::Completed,
        Self::Failed,
        Self::Cancelled,
        Self::Success,
    ];

    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Success => "success",
        }
    }

    /// Statuses reachable from `self` in one step.
    #[must_use]
    pub fn allowed_transitions(&self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::Processing, Self::Cancelled, Self::Success],
            Self::Processing => &[Self::Completed, Self::Failed, Self::Cancelled, Self::Success],
            Self::Failed => &[Self::Processing],
            Self::Completed | Self::Cancelled | Self::Success => &[],
        }
    }

    /// Checks if a transition from `self` to `target` is in the table.
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        self.allowed_transitions().contains(&target)
    }

    /// True if no transition leaves this status.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.allowed_transitions().is_empty()
    }

    /// True while the withdrawal counts against the available balance.
    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::Pending | Self::Processing)
    }

    /// True for the statuses that mean the money left the balance.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Completed | Self::Success)
    }
}

impl fmt::Display for WithdrawalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bank details as submitted by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankInfoInput {
    /// Bank name.
    pub bank_name: String,
    /// Account number, 6 to 20 digits.
    pub account_number: String,
    /// Account holder name.
    pub account_holder_name: String,
}

impl BankInfoInput {
    /// Validates every field and returns the stored, masked snapshot.
    pub fn validate(&self) -> Result<BankInfo, WithdrawalError> {
        let bank_name = self.bank_name.trim();
        if bank_name.is_empty() {
            return Err(WithdrawalError::Validation("bankName is required".to_string()));
        }
        let holder = self.account_holder_name.trim();
        if holder.is_empty() {
            return Err(WithdrawalError::Validation(
                "accountHolderName is required".to_string(),
            ));
        }
        let number = self.account_number.trim();
        if !is_valid_account_number(number) {
            return Err(WithdrawalError::Validation(
                "accountNumber must be 6 to 20 digits".to_string(),
            ));
        }
        Ok(BankInfo {
            bank_name: bank_name.to_string(),
            account_number: mask_account_number(number),
            account_holder_name: holder.to_string(),
        })
    }
}

/// `^[0-9]{6,20}$`
fn is_valid_account_number(number: &str) -> bool {
    (6..=20).contains(&number.len()) && number.bytes().all(|b| b.is_ascii_digit())
}

/// Keeps the last four digits.
#[must_use]
pub fn mask_account_number(number: &str) -> String {
    let hidden = number.chars().count().saturating_sub(4);
    number
        .chars()
        .enumerate()
        .map(|(i, c)| if i < hidden { '*' } else { c })
        .collect()
}

/// Bank details stored with the withdrawal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankInfo {
    /// Bank name.
    pub bank_name: String,
    /// Masked account number.
    pub account_number: String,
    /// Account holder name.
    pub account_holder_name: String,
}

/// Committed balance around the withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSnapshot {
    /// Committed balance when the request was accepted.
    pub before_withdrawal: Decimal,
    /// `before_withdrawal - (amount + fee)`.
    pub after_withdrawal: Decimal,
}

impl BalanceSnapshot {
    /// Builds the snapshot for a deduction of `total_deduction`.
    #[must_use]
    pub fn new(before_withdrawal: Decimal, total_deduction: Decimal) -> Self {
        Self {
            before_withdrawal,
            after_withdrawal: before_withdrawal - total_deduction,
        }
    }

    /// Checks `after = before - total_deduction` within one hundredth.
    pub fn verify(&self, total_deduction: Decimal) -> Result<(), WithdrawalError> {
        let expected = self.before_withdrawal - total_deduction;
        if (self.after_withdrawal - expected).abs() > SNAPSHOT_EPSILON {
            return Err(WithdrawalError::Validation(format!(
                "balance snapshot mismatch: after {} != before {} - {}",
                self.after_withdrawal, self.before_withdrawal, total_deduction
            )));
        }
        Ok(())
    }
}

/// Fee charged on a withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeInfo {
    /// Fee in whole units.
    pub withdrawal_fee: Decimal,
    /// `amount - withdrawal_fee`, what reaches the bank account.
    pub net_amount: Decimal,
}

impl FeeInfo {
    /// Builds fee info for `amount`.
    #[must_use]
    pub fn new(amount: Decimal, withdrawal_fee: Decimal) -> Self {
        Self {
            withdrawal_fee,
            net_amount: amount - withdrawal_fee,
        }
    }
}

/// Operator-supplied details recorded on status updates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingInfo {
    /// Operator who made the change.
    #[serde(default)]
    pub processed_by: Option<UserId>,
    /// Free-text note.
    #[serde(default)]
    pub note: Option<String>,
    /// Reason for a failure.
    #[serde(default)]
    pub failure_reason: Option<String>,
    /// Bank transfer reference.
    #[serde(default)]
    pub transaction_reference: Option<String>,
}

impl ProcessingInfo {
    /// Overlays the fields present in `other`.
    pub fn merge(&mut self, other: ProcessingInfo) {
        if other.processed_by.is_some() {
            self.processed_by = other.processed_by;
        }
        if other.note.is_some() {
            self.note = other.note;
        }
        if other.failure_reason.is_some() {
            self.failure_reason = other.failure_reason;
        }
        if other.transaction_reference.is_some() {
            self.transaction_reference = other.transaction_reference;
        }
    }
}

/// A withdrawal request.
///
/// Immutable after creation except through [`Withdrawal::transition`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Withdrawal {
    /// Withdrawal id.
    pub id: WithdrawalId,
    /// Unique human-facing code, `WD<date><time><rand>`.
    pub withdrawal_code: String,
    /// Requesting user.
    pub user_id: UserId,
    /// Requested amount, excluding the fee.
    pub amount: Decimal,
    /// Bank details snapshot.
    pub bank_info: BankInfo,
    /// Current status.
    pub status: WithdrawalStatus,
    /// Committed balance around the deduction.
    pub balance_snapshot: BalanceSnapshot,
    /// Fee and net payout.
    pub fee_info: FeeInfo,
    /// Operator details.
    #[serde(default)]
    pub processing_info: ProcessingInfo,
    /// Request time; drives the daily cap.
    pub requested_at: DateTime<Utc>,
    /// First entry into processing.
    pub processed_at: Option<DateTime<Utc>>,
    /// Entry into completed or success.
    pub completed_at: Option<DateTime<Utc>>,
    /// Last change.
    pub updated_at: DateTime<Utc>,
}

impl Withdrawal {
    /// `amount + withdrawal_fee`.
    #[must_use]
    pub fn total_deduction(&self) -> Decimal {
        self.amount + self.fee_info.withdrawal_fee
    }

    /// Moves to `to` if the status table allows it, stamping timestamps.
    ///
    /// `processed_at` is stamped on the first entry into processing;
    /// `completed_at` on entry into completed or success, backfilling
    /// `processed_at` when it was never set.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStatusTransition` and leaves the record untouched if
    /// the move is not in the table.
    pub fn transition(
        &mut self,
        to: WithdrawalStatus,
        info: Option<ProcessingInfo>,
        now: DateTime<Utc>,
    ) -> Result<(), WithdrawalError> {
        if !self.status.can_transition_to(to) {
            return Err(WithdrawalError::InvalidStatusTransition {
                from: self.status,
                to,
            });
        }
        match to {
            WithdrawalStatus::Processing if self.processed_at.is_none() => {
                self.processed_at = Some(now);
            }
            WithdrawalStatus::Completed | WithdrawalStatus::Success => {
                self.completed_at = Some(now);
                self.processed_at.get_or_insert(now);
            }
            _ => {}
        }
        if let Some(info) = info {
            self.processing_info.merge(info);
        }
        self.status = to;
        self.updated_at = now;
        Ok(())
    }
}

/// Display strings for a withdrawal's amounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedAmounts {
    /// Requested amount.
    pub amount: String,
    /// Fee.
    pub withdrawal_fee: String,
    /// Net payout.
    pub net_amount: String,
    /// Amount plus fee.
    pub total_deduction: String,
}

/// A withdrawal as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalView {
    /// The stored record.
    #[serde(flatten)]
    pub withdrawal: Withdrawal,
    /// `amount + fee`.
    pub total_deduction: Decimal,
    /// Thousands-separated display strings.
    pub formatted: FormattedAmounts,
}

impl From<Withdrawal> for WithdrawalView {
    fn from(withdrawal: Withdrawal) -> Self {
        let total_deduction = withdrawal.total_deduction();
        let formatted = FormattedAmounts {
            amount: format_amount(withdrawal.amount),
            withdrawal_fee: format_amount(withdrawal.fee_info.withdrawal_fee),
            net_amount: format_amount(withdrawal.fee_info.net_amount),
            total_deduction: format_amount(total_deduction),
        };
        Self {
            withdrawal,
            total_deduction,
            formatted,
        }
    }
}

/// Filter for withdrawal listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalFilter {
    /// Restrict to one user.
    #[serde(default)]
    pub user_id: Option<UserId>,
    /// Restrict to one status.
    #[serde(default)]
    pub status: Option<WithdrawalStatus>,
    /// `requested_at >= from`.
    #[serde(default)]
    pub from: Option<DateTime<Utc>>,
    /// `requested_at < to`.
    #[serde(default)]
    pub to: Option<DateTime<Utc>>,
}

impl WithdrawalFilter {
    /// True if `withdrawal` passes every set criterion.
    #[must_use]
    pub fn matches(&self, withdrawal: &Withdrawal) -> bool {
        self.user_id.is_none_or(|u| u == withdrawal.user_id)
            && self.status.is_none_or(|s| s == withdrawal.status)
            && self.from.is_none_or(|from| withdrawal.requested_at >= from)
            && self.to.is_none_or(|to| withdrawal.requested_at < to)
    }
}
