//! Withdrawal decision logic.
//!
//! Everything here is pure: the storage layer gathers the account, the
//! pending set and the active fee config under the user's lock, then calls
//! these functions in order and persists the result.

use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use souk_shared::types::{UserId, WithdrawalId};

use super::error::WithdrawalError;
use super::fee::{FeeQuote, FeeSource, WithdrawalFeeConfig, validate_fee_override};
use super::policy::WithdrawalPolicy;
use super::types::{
    BalanceSnapshot, BankInfo, BankInfoInput, FeeInfo, ProcessingInfo, Withdrawal,
    WithdrawalStatus,
};
use crate::ledger::{AvailableBalance, UserTier};

/// A withdrawal request as submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalRequest {
    /// Requesting user.
    pub user_id: UserId,
    /// Amount to pay out, excluding the fee.
    pub amount: Decimal,
    /// Destination account.
    pub bank_info: BankInfoInput,
    /// Caller-supplied fee replacing the configured one.
    #[serde(default)]
    pub withdrawal_fee: Option<Decimal>,
}

/// Stateless withdrawal service.
pub struct WithdrawalService;

impl WithdrawalService {
    /// Validates the request shape: amount bounds, bank details, and the
    /// fee override if any. Returns the masked bank snapshot.
    pub fn validate_request(
        request: &WithdrawalRequest,
        policy: &WithdrawalPolicy,
    ) -> Result<BankInfo, WithdrawalError> {
        policy.validate_amount(request.amount)?;
        let bank_info = request.bank_info.validate()?;
        if let Some(fee) = request.withdrawal_fee {
            validate_fee_override(fee, request.amount)?;
        }
        Ok(bank_info)
    }

    /// Decides the fee for a request.
    ///
    /// An override wins over the config. Without an active config the fee
    /// is zero unless the policy fails closed.
    pub fn resolve_fee(
        active: Option<&WithdrawalFeeConfig>,
        tier: UserTier,
        amount: Decimal,
        fee_override: Option<Decimal>,
        policy: &WithdrawalPolicy,
    ) -> Result<FeeQuote, WithdrawalError> {
        if let Some(fee) = fee_override {
            return Ok(FeeQuote {
                fee,
                source: FeeSource::Override,
            });
        }
        let Some(config) = active else {
            if policy.fee_fail_closed {
                return Err(WithdrawalError::Validation(
                    "no active withdrawal fee config".to_string(),
                ));
            }
            tracing::warn!(%amount, "no active withdrawal fee config, fee defaults to zero");
            return Ok(FeeQuote {
                fee: Decimal::ZERO,
                source: FeeSource::Unconfigured,
            });
        };
        if config.vip_exemption && tier.is_elevated() {
            tracing::debug!(config_id = %config.id, %tier, "withdrawal fee waived by VIP exemption");
            return Ok(FeeQuote {
                fee: Decimal::ZERO,
                source: FeeSource::Exempt,
            });
        }
        Ok(FeeQuote {
            fee: config.fee_for(amount, tier)?,
            source: FeeSource::Config,
        })
    }

    /// Checks `available` covers `total_deduction` and that the balance
    /// floor survives it.
    pub fn check_funds(
        available: &AvailableBalance,
        total_deduction: Decimal,
        policy: &WithdrawalPolicy,
    ) -> Result<(), WithdrawalError> {
        if !available.covers(total_deduction) {
            return Err(WithdrawalError::InsufficientAvailableBalance {
                required: total_deduction,
                available: available.available_balance,
                shortfall: available.shortfall(total_deduction),
            });
        }
        let balance_after = available.available_balance - total_deduction;
        if balance_after < policy.minimum_balance_after {
            return Err(WithdrawalError::MinimumBalanceRequired {
                minimum: policy.minimum_balance_after,
                balance_after,
            });
        }
        Ok(())
    }

    /// Generates a code of the form `WD<YYYYMMDD><HHMMSS><4 digits>`.
    #[must_use]
    pub fn generate_code(now: DateTime<Utc>) -> String {
        let suffix: u16 = rand::rng().random_range(0..10_000);
        format!("WD{}{suffix:04}", now.format("%Y%m%d%H%M%S"))
    }

    /// Builds the withdrawal record for an accepted request.
    ///
    /// Auto-approved withdrawals start in `success`; otherwise `pending`.
    pub fn build(
        request: &WithdrawalRequest,
        bank_info: BankInfo,
        current_balance: Decimal,
        quote: FeeQuote,
        policy: &WithdrawalPolicy,
        withdrawal_code: String,
        now: DateTime<Utc>,
    ) -> Result<Withdrawal, WithdrawalError> {
        let total_deduction = request.amount + quote.fee;
        let balance_snapshot = BalanceSnapshot::new(current_balance, total_deduction);
        balance_snapshot.verify(total_deduction)?;

        let (status, processed_at, completed_at) = if policy.auto_approve {
            (WithdrawalStatus::Success, Some(now), Some(now))
        } else {
            (WithdrawalStatus::Pending, None, None)
        };

        Ok(Withdrawal {
            id: WithdrawalId::new(),
            withdrawal_code,
            user_id: request.user_id,
            amount: request.amount,
            bank_info,
            status,
            balance_snapshot,
            fee_info: FeeInfo::new(request.amount, quote.fee),
            processing_info: ProcessingInfo::default(),
            requested_at: now,
            processed_at,
            completed_at,
            updated_at: now,
        })
    }

    /// True if moving `from` → `to` must debit the ledger.
    ///
    /// Withdrawals created as `success` are debited at creation and never
    /// transition again, so only in-flight records settle here.
    #[must_use]
    pub fn settles_on(from: WithdrawalStatus, to: WithdrawalStatus) -> bool {
        from.is_in_flight() && to.is_settled()
    }

    /// True if moving `from` → `to` puts the amount back in the pending set.
    #[must_use]
    pub fn reserves_on(from: WithdrawalStatus, to: WithdrawalStatus) -> bool {
        !from.is_in_flight() && to.is_in_flight()
    }
}
