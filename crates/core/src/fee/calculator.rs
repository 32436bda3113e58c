//! Fee math.
//!
//! All arithmetic stays in `Decimal` and is checked; an amount too large to
//! price is an error, never a panic. The fee is rounded to whole units once,
//! after the clamp, and never at intermediate tier lookups.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use souk_shared::types::money::{round_amount, round_rate};

use super::error::FeeError;
use super::types::{FeeConfig, FeeKind, FeeTier, FeeType, TierCharge};

/// Result of applying a fee config to an order amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeCalculation {
    /// Fee charged, in whole units.
    pub fee_amount: Decimal,
    /// `order_amount - fee_amount`, in whole units.
    pub net_amount: Decimal,
    /// Rate in percent, two decimals. For flat charges this is display-only.
    pub fee_rate: Decimal,
    /// Kind of the config that produced the fee.
    pub fee_type: FeeType,
}

/// Stateless fee calculator.
pub struct FeeCalculator;

impl FeeCalculator {
    /// Computes the fee for `order_amount` under `config`.
    ///
    /// Non-positive amounts yield a zero fee and are not clamped.
    ///
    /// # Errors
    ///
    /// Returns `AmountOutOfRange` if the fee or rate cannot be represented.
    pub fn compute(config: &FeeConfig, order_amount: Decimal) -> Result<FeeCalculation, FeeError> {
        let fee_type = config.fee_type();
        if order_amount <= Decimal::ZERO {
            return Ok(FeeCalculation {
                fee_amount: Decimal::ZERO,
                net_amount: order_amount,
                fee_rate: round_rate(Decimal::ZERO),
                fee_type,
            });
        }

        let (raw_fee, rate) = Self::raw_fee(&config.kind, order_amount)?;
        let fee_amount = round_amount(Self::clamp(raw_fee, config.minimum_fee, config.maximum_fee));
        let net_amount = order_amount
            .checked_sub(fee_amount)
            .ok_or(FeeError::AmountOutOfRange(order_amount))?;

        Ok(FeeCalculation {
            fee_amount,
            net_amount: round_amount(net_amount),
            fee_rate: round_rate(rate),
            fee_type,
        })
    }

    /// Unrounded, unclamped fee and its rate in percent.
    ///
    /// `amount` must be positive.
    ///
    /// # Errors
    ///
    /// Returns `AmountOutOfRange` on arithmetic overflow.
    pub fn raw_fee(kind: &FeeKind, amount: Decimal) -> Result<(Decimal, Decimal), FeeError> {
        match kind {
            FeeKind::Percentage { percentage_rate } => {
                Ok((percentage_fee(amount, *percentage_rate)?, *percentage_rate))
            }
            FeeKind::Fixed { fixed_amount } => {
                Ok((*fixed_amount, display_rate(*fixed_amount, amount)?))
            }
            FeeKind::Tiered { tiers } => match find_tier(tiers, amount) {
                Some(tier) => match tier.charge {
                    TierCharge::Percentage { rate } => Ok((percentage_fee(amount, rate)?, rate)),
                    TierCharge::Fixed { amount: flat } => Ok((flat, display_rate(flat, amount)?)),
                },
                None => Ok((Decimal::ZERO, Decimal::ZERO)),
            },
        }
    }

    /// `max(minimum, min(fee, maximum))`; an absent maximum is unbounded.
    #[must_use]
    pub fn clamp(fee: Decimal, minimum: Decimal, maximum: Option<Decimal>) -> Decimal {
        let capped = maximum.map_or(fee, |max| fee.min(max));
        capped.max(minimum)
    }
}

/// Returns the tier containing `amount`, if any.
#[must_use]
pub fn find_tier(tiers: &[FeeTier], amount: Decimal) -> Option<&FeeTier> {
    tiers.iter().find(|tier| tier.contains(amount))
}

/// `amount * rate / 100`. The rate is scaled first so a rate of at most 100
/// never grows the amount.
pub(crate) fn percentage_fee(amount: Decimal, rate: Decimal) -> Result<Decimal, FeeError> {
    rate.checked_div(Decimal::ONE_HUNDRED)
        .and_then(|fraction| amount.checked_mul(fraction))
        .ok_or(FeeError::AmountOutOfRange(amount))
}

fn display_rate(fee: Decimal, amount: Decimal) -> Result<Decimal, FeeError> {
    if amount.is_zero() {
        return Ok(Decimal::ZERO);
    }
    fee.checked_div(amount)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .ok_or(FeeError::AmountOutOfRange(amount))
}
