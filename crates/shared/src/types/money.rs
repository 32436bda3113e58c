//! Money helpers for a single, whole-unit currency.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! All amounts are `rust_decimal::Decimal`; the platform currency has no
//! fractional minor unit, so settled amounts are whole numbers.

use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal places used when reporting a fee rate (e.g. `5.00`).
pub const RATE_DECIMAL_PLACES: u32 = 2;

/// Tolerance used when checking balance snapshot arithmetic.
pub const SNAPSHOT_EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Rounds an amount to whole currency units, half away from zero.
///
/// This is the only rounding applied to fee amounts, and it happens once,
/// on the final value.
#[must_use]
pub fn round_amount(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds a percentage rate for display, always carrying two decimals
/// (`5` becomes `5.00`).
#[must_use]
pub fn round_rate(rate: Decimal) -> Decimal {
    let mut rounded =
        rate.round_dp_with_strategy(RATE_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(RATE_DECIMAL_PLACES);
    rounded
}

/// Returns true if the amount has no fractional part.
#[must_use]
pub fn is_whole(amount: Decimal) -> bool {
    amount.fract().is_zero()
}

/// Formats a whole amount with `,` thousands separators, e.g. `1,000,000`.
#[must_use]
pub fn format_amount(amount: Decimal) -> String {
    let rounded = round_amount(amount);
    let digits = rounded.abs().trunc().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-{grouped}")
    } else {
        grouped
    }
}
