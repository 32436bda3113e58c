//! Selection of the single fee config that applies to a transaction.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use souk_shared::types::{CategoryId, ShopId};

use super::error::FeeError;
use super::types::FeeConfig;

/// What is known about the transaction being charged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeContext {
    /// Selling shop, if known.
    #[serde(default)]
    pub shop_id: Option<ShopId>,
    /// Categories of the items sold.
    #[serde(default)]
    pub category_ids: BTreeSet<CategoryId>,
    /// Order amount. Not used for selection.
    #[serde(default)]
    pub order_amount: Option<Decimal>,
}

impl FeeContext {
    /// Context for a shop sale.
    #[must_use]
    pub fn for_shop(shop_id: ShopId, category_ids: impl IntoIterator<Item = CategoryId>) -> Self {
        Self {
            shop_id: Some(shop_id),
            category_ids: category_ids.into_iter().collect(),
            order_amount: None,
        }
    }

    /// Sets the order amount.
    #[must_use]
    pub fn with_amount(mut self, amount: Decimal) -> Self {
        self.order_amount = Some(amount);
        self
    }
}

/// How specifically a config matched a context. Later variants win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MatchLevel {
    /// No restrictions.
    General,
    /// Category restriction intersected the context.
    Category,
    /// Shop restriction contained the context's shop.
    Shop,
}

/// Stateless resolver over a set of stored configs.
pub struct FeeResolver;

impl FeeResolver {
    /// Candidate ordering: priority desc, then `created_at` desc.
    #[must_use]
    pub fn candidate_order(a: &FeeConfig, b: &FeeConfig) -> Ordering {
        b.priority
            .cmp(&a.priority)
            .then_with(|| b.created_at.cmp(&a.created_at))
    }

    /// Returns configs that are active at `now`, in candidate order.
    #[must_use]
    pub fn candidates<'a, I>(configs: I, now: DateTime<Utc>) -> Vec<&'a FeeConfig>
    where
        I: IntoIterator<Item = &'a FeeConfig>,
    {
        let mut active: Vec<&FeeConfig> = configs
            .into_iter()
            .filter(|c| c.is_effective_at(now))
            .collect();
        active.sort_by(|a, b| Self::candidate_order(a, b));
        active
    }

    /// How `config` matches `ctx`, or `None` if it does not apply.
    ///
    /// A config with a shop list is shop-scoped even if it also lists
    /// categories; the category list is then ignored.
    #[must_use]
    pub fn match_level(config: &FeeConfig, ctx: &FeeContext) -> Option<MatchLevel> {
        if config.is_shop_specific() {
            return ctx
                .shop_id
                .filter(|shop| config.applicable_shops.contains(shop))
                .map(|_| MatchLevel::Shop);
        }
        if !config.applicable_categories.is_empty() {
            let intersects = ctx
                .category_ids
                .iter()
                .any(|c| config.applicable_categories.contains(c));
            return intersects.then_some(MatchLevel::Category);
        }
        Some(MatchLevel::General)
    }

    /// Picks the config for `ctx` among `configs` at instant `now`.
    ///
    /// A shop match beats a category match, which beats a general match.
    /// Within one level the first candidate in candidate order wins.
    pub fn resolve<'a, I>(
        configs: I,
        ctx: &FeeContext,
        now: DateTime<Utc>,
    ) -> Result<&'a FeeConfig, FeeError>
    where
        I: IntoIterator<Item = &'a FeeConfig>,
    {
        let mut best: Option<(MatchLevel, &FeeConfig)> = None;
        for config in Self::candidates(configs, now) {
            let Some(level) = Self::match_level(config, ctx) else {
                continue;
            };
            if best.is_none_or(|(current, _)| level > current) {
                best = Some((level, config));
                if level == MatchLevel::Shop {
                    break;
                }
            }
        }
        best.map(|(_, config)| config)
            .ok_or(FeeError::NoApplicableConfig)
    }
}
