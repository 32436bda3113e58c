//! Withdrawal fee configuration.
//!
//! A simplified sibling of the platform fee config: no scopes or priorities,
//! and exactly one config is active at an instant, chosen by query.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use souk_shared::types::money::{is_whole, round_amount};
use souk_shared::types::{UserId, WithdrawalFeeConfigId};

use super::error::WithdrawalError;
use crate::fee::calculator::{FeeCalculator, find_tier, percentage_fee};
use crate::fee::error::FeeError;
use crate::fee::types::{FeeKind, TierCharge, validate_bounds, validate_window};
use crate::ledger::UserTier;

/// Admin-supplied fields of a withdrawal fee config.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalFeeConfigInput {
    /// Display name.
    pub name: String,
    /// Fee kind and its payload.
    #[serde(flatten)]
    pub kind: FeeKind,
    /// Lower clamp bound for percentage fees.
    #[serde(default)]
    pub min_fee: Decimal,
    /// Upper clamp bound for percentage fees.
    #[serde(default)]
    pub max_fee: Option<Decimal>,
    /// Waive the fee for VIP and PLATINUM users.
    #[serde(default)]
    pub vip_exemption: bool,
    /// Inactive configs are never selected.
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Start of the effective window (inclusive).
    pub effective_from: DateTime<Utc>,
    /// End of the effective window (exclusive).
    #[serde(default)]
    pub effective_to: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

/// A persisted withdrawal fee config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalFeeConfig {
    /// Config id.
    pub id: WithdrawalFeeConfigId,
    /// Display name.
    pub name: String,
    /// Fee kind and its payload.
    #[serde(flatten)]
    pub kind: FeeKind,
    /// Lower clamp bound for percentage fees.
    pub min_fee: Decimal,
    /// Upper clamp bound for percentage fees.
    pub max_fee: Option<Decimal>,
    /// Waive the fee for VIP and PLATINUM users.
    pub vip_exemption: bool,
    /// Inactive configs are never selected.
    pub is_active: bool,
    /// Start of the effective window (inclusive).
    pub effective_from: DateTime<Utc>,
    /// End of the effective window (exclusive).
    pub effective_to: Option<DateTime<Utc>>,
    /// Creator.
    pub created_by: UserId,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl WithdrawalFeeConfig {
    /// Validates `input` and builds a new config.
    pub fn create(
        mut input: WithdrawalFeeConfigInput,
        created_by: UserId,
        now: DateTime<Utc>,
    ) -> Result<Self, WithdrawalError> {
        let invalid = |e: crate::fee::FeeError| WithdrawalError::Validation(e.to_string());
        input.kind.validate().map_err(invalid)?;
        validate_bounds(input.min_fee, input.max_fee).map_err(invalid)?;
        validate_window(input.effective_from, input.effective_to).map_err(invalid)?;

        Ok(Self {
            id: WithdrawalFeeConfigId::new(),
            name: input.name,
            kind: input.kind,
            min_fee: input.min_fee,
            max_fee: input.max_fee,
            vip_exemption: input.vip_exemption,
            is_active: input.is_active,
            effective_from: input.effective_from,
            effective_to: input.effective_to,
            created_by,
            created_at: now,
            updated_at: now,
        })
    }

    /// True if active and `now` lies in `[effective_from, effective_to)`.
    #[must_use]
    pub fn is_effective_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active
            && self.effective_from <= now
            && self.effective_to.is_none_or(|to| to > now)
    }

    /// The config in force at `now`: the effective one with the latest
    /// `effective_from`, then the latest `created_at`.
    #[must_use]
    pub fn select_active<'a, I>(configs: I, now: DateTime<Utc>) -> Option<&'a Self>
    where
        I: IntoIterator<Item = &'a Self>,
    {
        configs
            .into_iter()
            .filter(|c| c.is_effective_at(now))
            .max_by(|a, b| {
                a.effective_from
                    .cmp(&b.effective_from)
                    .then_with(|| a.created_at.cmp(&b.created_at))
            })
    }

    /// Fee for `amount` charged to a user of `tier`, in whole units.
    ///
    /// Percentage fees are clamped to `[min_fee, max_fee]`; fixed and tiered
    /// fees are taken as configured.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if `amount` is too large to price.
    pub fn fee_for(&self, amount: Decimal, tier: UserTier) -> Result<Decimal, WithdrawalError> {
        if self.vip_exemption && tier.is_elevated() {
            return Ok(Decimal::ZERO);
        }
        if amount <= Decimal::ZERO {
            return Ok(Decimal::ZERO);
        }
        let out_of_range = |err: FeeError| WithdrawalError::Validation(err.to_string());
        let fee = match &self.kind {
            FeeKind::Percentage { percentage_rate } => FeeCalculator::clamp(
                percentage_fee(amount, *percentage_rate).map_err(out_of_range)?,
                self.min_fee,
                self.max_fee,
            ),
            FeeKind::Fixed { fixed_amount } => *fixed_amount,
            FeeKind::Tiered { tiers } => match find_tier(tiers, amount).map(|t| &t.charge) {
                Some(TierCharge::Percentage { rate }) => {
                    percentage_fee(amount, *rate).map_err(out_of_range)?
                }
                Some(TierCharge::Fixed { amount: flat }) => *flat,
                None => Decimal::ZERO,
            },
        };
        Ok(round_amount(fee))
    }
}

/// Where a withdrawal's fee came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeeSource {
    /// Computed from the active config.
    Config,
    /// Waived by the VIP exemption.
    Exempt,
    /// Supplied with the request.
    Override,
    /// No active config; defaulted to zero.
    Unconfigured,
}

/// A resolved withdrawal fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeQuote {
    /// Fee in whole units.
    pub fee: Decimal,
    /// Where it came from.
    pub source: FeeSource,
}

/// Validates a caller-supplied fee: whole, non-negative, below `amount`.
pub fn validate_fee_override(fee: Decimal, amount: Decimal) -> Result<(), WithdrawalError> {
    if fee.is_sign_negative() {
        return Err(WithdrawalError::Validation(
            "withdrawalFee cannot be negative".to_string(),
        ));
    }
    if !is_whole(fee) {
        return Err(WithdrawalError::Validation(
            "withdrawalFee must be a whole number".to_string(),
        ));
    }
    if fee >= amount {
        return Err(WithdrawalError::Validation(
            "withdrawalFee must be less than the amount".to_string(),
        ));
    }
    Ok(())
}
