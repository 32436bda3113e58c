//! Fee configuration domain types.
//!
//! A fee config is a rule describing how platform commission is computed for
//! a scope of transactions. The fee kind is a tagged variant: the tag decides
//! which payload is present, and validation runs once at construction or
//! update instead of being scattered through the calculation code.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use souk_shared::types::{CategoryId, FeeConfigId, ShopId, UserId};

use super::error::FeeError;

/// Applicability restriction of a config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeeScope {
    /// Applies to every transaction.
    Global,
    /// Restricted to a set of categories.
    Category,
    /// Restricted to a set of shops.
    Shop,
}

/// Discriminant of [`FeeKind`], used in responses and audit rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeeType {
    /// Percentage of the order amount.
    Percentage,
    /// Flat amount.
    Fixed,
    /// Amount-banded schedule.
    Tiered,
}

impl FeeType {
    /// Returns the string representation of the fee type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Percentage => "PERCENTAGE",
            Self::Fixed => "FIXED",
            Self::Tiered => "TIERED",
        }
    }
}

impl fmt::Display for FeeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a single tier charges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "chargeType", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TierCharge {
    /// Percentage of the order amount.
    Percentage {
        /// Rate in percent (0-100).
        rate: Decimal,
    },
    /// Flat amount.
    Fixed {
        /// Amount in whole currency units.
        amount: Decimal,
    },
}

/// One band of a tiered schedule: `[min_amount, max_amount)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeTier {
    /// Inclusive lower bound.
    pub min_amount: Decimal,
    /// Exclusive upper bound; `None` is unbounded.
    pub max_amount: Option<Decimal>,
    /// The charge applied inside the band.
    #[serde(flatten)]
    pub charge: TierCharge,
}

impl FeeTier {
    /// Returns true if `amount` falls in this band.
    #[must_use]
    pub fn contains(&self, amount: Decimal) -> bool {
        self.min_amount <= amount && self.max_amount.is_none_or(|max| amount < max)
    }
}

/// How a fee is computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "feeType", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeeKind {
    /// Percentage of the order amount.
    Percentage {
        /// Rate in percent (0-100).
        #[serde(rename = "percentageRate")]
        percentage_rate: Decimal,
    },
    /// Flat amount.
    Fixed {
        /// Amount in whole currency units.
        #[serde(rename = "fixedAmount")]
        fixed_amount: Decimal,
    },
    /// Amount-banded schedule, sorted by `min_amount`.
    Tiered {
        /// Non-overlapping tiers.
        tiers: Vec<FeeTier>,
    },
}

impl FeeKind {
    /// Returns the discriminant.
    #[must_use]
    pub fn fee_type(&self) -> FeeType {
        match self {
            Self::Percentage { .. } => FeeType::Percentage,
            Self::Fixed { .. } => FeeType::Fixed,
            Self::Tiered { .. } => FeeType::Tiered,
        }
    }

    /// The rate recorded in the commission audit trail.
    ///
    /// Only percentage configs carry a single rate; other kinds report zero.
    #[must_use]
    pub fn headline_rate(&self) -> Decimal {
        match self {
            Self::Percentage { percentage_rate } => *percentage_rate,
            Self::Fixed { .. } | Self::Tiered { .. } => Decimal::ZERO,
        }
    }

    /// Validates the payload and normalizes tier order.
    pub fn validate(&mut self) -> Result<(), FeeError> {
        match self {
            Self::Percentage { percentage_rate } => validate_rate(*percentage_rate),
            Self::Fixed { fixed_amount } => {
                if fixed_amount.is_sign_negative() {
                    return Err(FeeError::NegativeAmount {
                        field: "fixed_amount",
                    });
                }
                Ok(())
            }
            Self::Tiered { tiers } => validate_tiers(tiers),
        }
    }
}

fn validate_rate(rate: Decimal) -> Result<(), FeeError> {
    if rate < Decimal::ZERO || rate > Decimal::ONE_HUNDRED {
        return Err(FeeError::InvalidPercentageRate(rate));
    }
    Ok(())
}

/// Sorts tiers by lower bound and rejects empty, inverted, or overlapping bands.
pub fn validate_tiers(tiers: &mut [FeeTier]) -> Result<(), FeeError> {
    if tiers.is_empty() {
        return Err(FeeError::EmptyTiers);
    }
    tiers.sort_by(|a, b| a.min_amount.cmp(&b.min_amount));

    for (index, tier) in tiers.iter().enumerate() {
        if tier.min_amount.is_sign_negative() {
            return Err(FeeError::NegativeAmount {
                field: "tier.min_amount",
            });
        }
        if tier.max_amount.is_some_and(|max| max <= tier.min_amount) {
            return Err(FeeError::InvalidTierRange { index });
        }
        match tier.charge {
            TierCharge::Percentage { rate } => validate_rate(rate)?,
            TierCharge::Fixed { amount } if amount.is_sign_negative() => {
                return Err(FeeError::NegativeAmount {
                    field: "tier.amount",
                });
            }
            TierCharge::Fixed { .. } => {}
        }
    }

    for (index, pair) in tiers.windows(2).enumerate() {
        // An unbounded tier followed by anything overlaps it.
        let overlaps = pair[0]
            .max_amount
            .is_none_or(|prev_max| prev_max > pair[1].min_amount);
        if overlaps {
            return Err(FeeError::OverlappingTiers { index: index + 1 });
        }
    }
    Ok(())
}

/// Validates a clamp pair.
pub fn validate_bounds(minimum_fee: Decimal, maximum_fee: Option<Decimal>) -> Result<(), FeeError> {
    if minimum_fee.is_sign_negative() {
        return Err(FeeError::NegativeAmount {
            field: "minimum_fee",
        });
    }
    if let Some(max) = maximum_fee {
        if max.is_sign_negative() {
            return Err(FeeError::NegativeAmount {
                field: "maximum_fee",
            });
        }
        if minimum_fee > max {
            return Err(FeeError::InvalidFeeBounds {
                min: minimum_fee,
                max,
            });
        }
    }
    Ok(())
}

/// Validates an effective window.
pub fn validate_window(
    effective_from: DateTime<Utc>,
    effective_to: Option<DateTime<Utc>>,
) -> Result<(), FeeError> {
    if effective_to.is_some_and(|to| effective_from >= to) {
        return Err(FeeError::InvalidEffectiveWindow);
    }
    Ok(())
}

/// Admin-supplied fields of a fee config.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeConfigInput {
    /// Display name.
    pub name: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Applicability scope.
    pub scope: FeeScope,
    /// Fee kind and its payload.
    #[serde(flatten)]
    pub kind: FeeKind,
    /// Lower clamp bound.
    #[serde(default)]
    pub minimum_fee: Decimal,
    /// Upper clamp bound; `None` is unbounded.
    #[serde(default)]
    pub maximum_fee: Option<Decimal>,
    /// Category restriction; empty means unrestricted.
    #[serde(default)]
    pub applicable_categories: BTreeSet<CategoryId>,
    /// Shop restriction; empty means unrestricted.
    #[serde(default)]
    pub applicable_shops: BTreeSet<ShopId>,
    /// Higher wins.
    #[serde(default)]
    pub priority: i32,
    /// Inactive configs are never resolved.
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Start of the effective window (inclusive).
    pub effective_from: DateTime<Utc>,
    /// End of the effective window (exclusive); `None` is open-ended.
    #[serde(default)]
    pub effective_to: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

impl FeeConfigInput {
    /// A percentage config with no restrictions, effective from `effective_from`.
    #[must_use]
    pub fn global_percentage(
        name: impl Into<String>,
        percentage_rate: Decimal,
        effective_from: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            description: None,
            scope: FeeScope::Global,
            kind: FeeKind::Percentage { percentage_rate },
            minimum_fee: Decimal::ZERO,
            maximum_fee: None,
            applicable_categories: BTreeSet::new(),
            applicable_shops: BTreeSet::new(),
            priority: 0,
            is_active: true,
            effective_from,
            effective_to: None,
        }
    }

    /// Validates every field and normalizes tier order.
    pub fn validate(&mut self) -> Result<(), FeeError> {
        self.kind.validate()?;
        validate_bounds(self.minimum_fee, self.maximum_fee)?;
        validate_window(self.effective_from, self.effective_to)?;
        match self.scope {
            FeeScope::Shop if self.applicable_shops.is_empty() => Err(FeeError::ScopeMismatch(
                "SHOP scope requires at least one shop".to_string(),
            )),
            FeeScope::Category if self.applicable_categories.is_empty() => {
                Err(FeeError::ScopeMismatch(
                    "CATEGORY scope requires at least one category".to_string(),
                ))
            }
            _ => Ok(()),
        }
    }
}

/// A persisted fee configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeConfig {
    /// Config id.
    pub id: FeeConfigId,
    /// Display name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Applicability scope.
    pub scope: FeeScope,
    /// Fee kind and its payload.
    #[serde(flatten)]
    pub kind: FeeKind,
    /// Lower clamp bound.
    pub minimum_fee: Decimal,
    /// Upper clamp bound; `None` is unbounded.
    pub maximum_fee: Option<Decimal>,
    /// Category restriction; empty means unrestricted.
    pub applicable_categories: BTreeSet<CategoryId>,
    /// Shop restriction; empty means unrestricted.
    pub applicable_shops: BTreeSet<ShopId>,
    /// Higher wins.
    pub priority: i32,
    /// Inactive configs are never resolved.
    pub is_active: bool,
    /// Start of the effective window (inclusive).
    pub effective_from: DateTime<Utc>,
    /// End of the effective window (exclusive).
    pub effective_to: Option<DateTime<Utc>>,
    /// Creator.
    pub created_by: UserId,
    /// Last editor.
    pub updated_by: Option<UserId>,
    /// Creation time; breaks priority ties (newer first).
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl FeeConfig {
    /// Validates `input` and builds a new config.
    pub fn create(
        mut input: FeeConfigInput,
        created_by: UserId,
        now: DateTime<Utc>,
    ) -> Result<Self, FeeError> {
        input.validate()?;
        Ok(Self {
            id: FeeConfigId::new(),
            name: input.name,
            description: input.description,
            scope: input.scope,
            kind: input.kind,
            minimum_fee: input.minimum_fee,
            maximum_fee: input.maximum_fee,
            applicable_categories: input.applicable_categories,
            applicable_shops: input.applicable_shops,
            priority: input.priority,
            is_active: input.is_active,
            effective_from: input.effective_from,
            effective_to: input.effective_to,
            created_by,
            updated_by: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Validates `input` and replaces every admin-editable field.
    ///
    /// On error the config is left untouched.
    pub fn apply(
        &mut self,
        mut input: FeeConfigInput,
        updated_by: UserId,
        now: DateTime<Utc>,
    ) -> Result<(), FeeError> {
        input.validate()?;
        self.name = input.name;
        self.description = input.description;
        self.scope = input.scope;
        self.kind = input.kind;
        self.minimum_fee = input.minimum_fee;
        self.maximum_fee = input.maximum_fee;
        self.applicable_categories = input.applicable_categories;
        self.applicable_shops = input.applicable_shops;
        self.priority = input.priority;
        self.is_active = input.is_active;
        self.effective_from = input.effective_from;
        self.effective_to = input.effective_to;
        self.updated_by = Some(updated_by);
        self.updated_at = now;
        Ok(())
    }

    /// Returns the admin-editable fields, for read-modify-write updates.
    #[must_use]
    pub fn to_input(&self) -> FeeConfigInput {
        FeeConfigInput {
            name: self.name.clone(),
            description: self.description.clone(),
            scope: self.scope,
            kind: self.kind.clone(),
            minimum_fee: self.minimum_fee,
            maximum_fee: self.maximum_fee,
            applicable_categories: self.applicable_categories.clone(),
            applicable_shops: self.applicable_shops.clone(),
            priority: self.priority,
            is_active: self.is_active,
            effective_from: self.effective_from,
            effective_to: self.effective_to,
        }
    }

    /// Returns the discriminant of the fee kind.
    #[must_use]
    pub fn fee_type(&self) -> FeeType {
        self.kind.fee_type()
    }

    /// True if active and `now` lies in `[effective_from, effective_to)`.
    #[must_use]
    pub fn is_effective_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active
            && self.effective_from <= now
            && self.effective_to.is_none_or(|to| to > now)
    }

    /// True if this config is restricted to shops.
    #[must_use]
    pub fn is_shop_specific(&self) -> bool {
        !self.applicable_shops.is_empty()
    }

    /// True if this config has neither shop nor category restrictions.
    #[must_use]
    pub fn is_general(&self) -> bool {
        self.applicable_shops.is_empty() && self.applicable_categories.is_empty()
    }
}
