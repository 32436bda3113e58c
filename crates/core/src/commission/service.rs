//! Commission decisions and audit row construction.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use souk_shared::types::money::round_rate;
use souk_shared::types::{CommissionChangeId, ShopId, UserId};

use super::types::{ChangeContext, CommissionChange, CommissionSummary, SellerCommission, Shop};
use crate::fee::{
    FeeConfig, FeeConfigInput, FeeContext, FeeError, FeeKind, FeeResolver, FeeScope, MatchLevel,
};

/// Stateless commission service.
pub struct CommissionService;

impl CommissionService {
    /// Rejects rates outside `0..=100`.
    pub fn validate_rate(rate: Decimal) -> Result<(), FeeError> {
        if rate < Decimal::ZERO || rate > Decimal::ONE_HUNDRED {
            return Err(FeeError::InvalidPercentageRate(rate));
        }
        Ok(())
    }

    /// The general config in force at `now`: what a context without shop or
    /// categories resolves to.
    #[must_use]
    pub fn default_config<'a, I>(configs: I, now: DateTime<Utc>) -> Option<&'a FeeConfig>
    where
        I: IntoIterator<Item = &'a FeeConfig>,
    {
        FeeResolver::resolve(configs, &FeeContext::default(), now).ok()
    }

    /// The shop's effective commission at `now`.
    #[must_use]
    pub fn effective_commission(
        shop: &Shop,
        configs: &[FeeConfig],
        now: DateTime<Utc>,
    ) -> SellerCommission {
        let ctx = FeeContext::for_shop(shop.id, shop.category_ids.iter().copied());
        let resolved = FeeResolver::resolve(configs, &ctx, now).ok();
        let has_custom_commission = resolved
            .and_then(|c| FeeResolver::match_level(c, &ctx))
            .is_some_and(|level| level == MatchLevel::Shop);
        SellerCommission {
            shop_id: shop.id,
            shop_name: shop.name.clone(),
            seller_id: shop.seller_id,
            is_active: shop.is_active,
            commission_rate: resolved.map_or(Decimal::ZERO, |c| c.kind.headline_rate()),
            has_custom_commission,
            config_id: resolved.map(|c| c.id),
        }
    }

    /// The active config that lists `shop_id`, in candidate order.
    #[must_use]
    pub fn shop_config<'a>(
        configs: &'a [FeeConfig],
        shop_id: ShopId,
        now: DateTime<Utc>,
    ) -> Option<&'a FeeConfig> {
        FeeResolver::candidates(configs, now)
            .into_iter()
            .find(|c| c.applicable_shops.contains(&shop_id))
    }

    /// Summary over `rows` given the default rate.
    #[must_use]
    pub fn summarize(rows: &[SellerCommission], default_rate: Decimal) -> CommissionSummary {
        let average_rate = if rows.is_empty() {
            Decimal::ZERO
        } else {
            let total: Decimal = rows.iter().map(|r| r.commission_rate).sum();
            round_rate(total / Decimal::from(rows.len()))
        };
        CommissionSummary {
            average_rate,
            custom_commission_count: rows.iter().filter(|r| r.has_custom_commission).count(),
            default_rate,
        }
    }

    /// True if the shop name contains `search`, ignoring case.
    #[must_use]
    pub fn matches_search(shop: &Shop, search: Option<&str>) -> bool {
        match search.map(str::trim).filter(|s| !s.is_empty()) {
            Some(needle) => shop.name.to_lowercase().contains(&needle.to_lowercase()),
            None => true,
        }
    }

    /// Input for a new shop-specific percentage config.
    #[must_use]
    pub fn custom_config_input(shop: &Shop, rate: Decimal, now: DateTime<Utc>) -> FeeConfigInput {
        let mut input = FeeConfigInput::global_percentage(format!("Commission: {}", shop.name), rate, now);
        input.scope = FeeScope::Shop;
        input.applicable_shops.insert(shop.id);
        input
    }

    /// Replaces the config's fee kind with a flat percentage.
    ///
    /// Returns the headline rate before the change.
    pub fn set_rate(
        config: &mut FeeConfig,
        rate: Decimal,
        changed_by: UserId,
        now: DateTime<Utc>,
    ) -> Result<Decimal, FeeError> {
        let previous = config.kind.headline_rate();
        let mut input = config.to_input();
        input.kind = FeeKind::Percentage {
            percentage_rate: rate,
        };
        config.apply(input, changed_by, now)?;
        Ok(previous)
    }

    /// Removes `shop_id` from the config's shop list.
    pub fn detach_shop(
        config: &mut FeeConfig,
        shop_id: ShopId,
        changed_by: UserId,
        now: DateTime<Utc>,
    ) -> Result<(), FeeError> {
        let mut input = config.to_input();
        input.applicable_shops.remove(&shop_id);
        config.apply(input, changed_by, now)
    }

    /// Shops whose commission an edit from `before` to `after` touches.
    ///
    /// Any change to the fee kind, the clamp bounds or the shop list counts,
    /// and every shop listed before or after is affected. Empty when the
    /// edit leaves pricing and the shop list alone.
    #[must_use]
    pub fn affected_shops(before: &FeeConfig, after: &FeeConfig) -> BTreeSet<ShopId> {
        let priced_differently = before.kind != after.kind
            || before.minimum_fee != after.minimum_fee
            || before.maximum_fee != after.maximum_fee;
        if !priced_differently && before.applicable_shops == after.applicable_shops {
            return BTreeSet::new();
        }
        before
            .applicable_shops
            .union(&after.applicable_shops)
            .copied()
            .collect()
    }

    /// One audit row per shop listed on `config`.
    #[must_use]
    pub fn changes_for(
        config: &FeeConfig,
        previous_rate: Decimal,
        ctx: &ChangeContext,
        sellers: &HashMap<ShopId, UserId>,
        now: DateTime<Utc>,
    ) -> Vec<CommissionChange> {
        Self::changes_for_shops(config, &config.applicable_shops, previous_rate, ctx, sellers, now)
    }

    /// One audit row per shop in `shops`.
    #[must_use]
    pub fn changes_for_shops(
        config: &FeeConfig,
        shops: &BTreeSet<ShopId>,
        previous_rate: Decimal,
        ctx: &ChangeContext,
        sellers: &HashMap<ShopId, UserId>,
        now: DateTime<Utc>,
    ) -> Vec<CommissionChange> {
        shops
            .iter()
            .map(|shop_id| {
                Self::change(config, *shop_id, sellers.get(shop_id).copied(), previous_rate, ctx, now)
            })
            .collect()
    }

    /// A single audit row.
    #[must_use]
    pub fn change(
        config: &FeeConfig,
        shop_id: ShopId,
        seller_id: Option<UserId>,
        previous_rate: Decimal,
        ctx: &ChangeContext,
        now: DateTime<Utc>,
    ) -> CommissionChange {
        CommissionChange {
            id: CommissionChangeId::new(),
            shop_id,
            seller_id,
            config_id: config.id,
            changed_by: ctx.changed_by,
            previous_rate,
            new_rate: config.kind.headline_rate(),
            fee_type: config.fee_type(),
            reason: ctx.reason.clone(),
            note: ctx.note.clone(),
            applied_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fee::FeeType;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;
    use souk_shared::types::CategoryId;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 9, 1, 0, 0, 0).unwrap()
    }

    fn default_config(rate: Decimal) -> FeeConfig {
        FeeConfig::create(
            FeeConfigInput::global_percentage("Default", rate, t0()),
            UserId::new(),
            t0(),
        )
        .unwrap()
    }

    #[test]
    fn test_effective_commission_custom_vs_default() {
        let shop = Shop::new("Tea House", UserId::new(), [CategoryId::new()], t0());
        let other = Shop::new("Book Nook", UserId::new(), [], t0());
        let custom = FeeConfig::create(
            CommissionService::custom_config_input(&shop, dec!(3), t0()),
            UserId::new(),
            t0(),
        )
        .unwrap();
        let configs = vec![default_config(dec!(5)), custom.clone()];
        let now = t0() + Duration::hours(1);

        let row = CommissionService::effective_commission(&shop, &configs, now);
        assert!(row.has_custom_commission);
        assert_eq!(row.commission_rate, dec!(3));
        assert_eq!(row.config_id, Some(custom.id));

        let row = CommissionService::effective_commission(&other, &configs, now);
        assert!(!row.has_custom_commission);
        assert_eq!(row.commission_rate, dec!(5));
    }

    #[test]
    fn test_summary() {
        let shop = Shop::new("A", UserId::new(), [], t0());
        let mut rows = vec![
            CommissionService::effective_commission(&shop, &[default_config(dec!(5))], t0()),
            CommissionService::effective_commission(&shop, &[default_config(dec!(5))], t0()),
        ];
        rows[1].commission_rate = dec!(2);
        rows[1].has_custom_commission = true;
        let summary = CommissionService::summarize(&rows, dec!(5));
        assert_eq!(summary.average_rate, dec!(3.50));
        assert_eq!(summary.custom_commission_count, 1);
        assert_eq!(summary.default_rate, dec!(5));

        assert_eq!(CommissionService::summarize(&[], dec!(5)).average_rate, dec!(0));
    }

    #[test]
    fn test_set_rate_returns_previous() {
        let mut config = FeeConfig::create(
            FeeConfigInput {
                kind: FeeKind::Fixed {
                    fixed_amount: dec!(2000),
                },
                ..FeeConfigInput::global_percentage("Flat", dec!(0), t0())
            },
            UserId::new(),
            t0(),
        )
        .unwrap();
        let previous = CommissionService::set_rate(&mut config, dec!(4), UserId::new(), t0()).unwrap();
        assert_eq!(previous, dec!(0));
        assert_eq!(config.fee_type(), FeeType::Percentage);
        assert_eq!(config.kind.headline_rate(), dec!(4));

        assert!(CommissionService::set_rate(&mut config, dec!(101), UserId::new(), t0()).is_err());
        assert_eq!(config.kind.headline_rate(), dec!(4));
    }

    #[test]
    fn test_one_change_per_listed_shop() {
        let seller = UserId::new();
        let a = Shop::new("A", seller, [], t0());
        let b = Shop::new("B", UserId::new(), [], t0());
        let mut input = CommissionService::custom_config_input(&a, dec!(3), t0());
        input.applicable_shops.insert(b.id);
        let config = FeeConfig::create(input, UserId::new(), t0()).unwrap();

        let sellers = HashMap::from([(a.id, seller)]);
        let ctx = ChangeContext {
            changed_by: UserId::new(),
            reason: Some("promo".to_string()),
            note: None,
        };
        let rows = CommissionService::changes_for(&config, dec!(5), &ctx, &sellers, t0());
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.previous_rate == dec!(5) && r.new_rate == dec!(3)));
        let row_a = rows.iter().find(|r| r.shop_id == a.id).unwrap();
        assert_eq!(row_a.seller_id, Some(seller));
        let row_b = rows.iter().find(|r| r.shop_id == b.id).unwrap();
        assert_eq!(row_b.seller_id, None);
    }

    #[test]
    fn test_affected_shops() {
        let a = Shop::new("A", UserId::new(), [], t0());
        let b = Shop::new("B", UserId::new(), [], t0());
        let mut input = CommissionService::custom_config_input(&a, dec!(0), t0());
        input.kind = FeeKind::Fixed {
            fixed_amount: dec!(1000),
        };
        let before = FeeConfig::create(input, UserId::new(), t0()).unwrap();

        let mut renamed = before.clone();
        renamed.name = "Renamed".to_string();
        assert!(CommissionService::affected_shops(&before, &renamed).is_empty());

        let mut repriced = before.clone();
        repriced.kind = FeeKind::Fixed {
            fixed_amount: dec!(9000),
        };
        assert_eq!(
            CommissionService::affected_shops(&before, &repriced),
            BTreeSet::from([a.id])
        );

        let mut capped = before.clone();
        capped.maximum_fee = Some(dec!(500));
        assert_eq!(CommissionService::affected_shops(&before, &capped).len(), 1);

        let mut moved = before.clone();
        moved.applicable_shops = BTreeSet::from([b.id]);
        assert_eq!(
            CommissionService::affected_shops(&before, &moved),
            BTreeSet::from([a.id, b.id])
        );
    }

    #[test]
    fn test_search() {
        let shop = Shop::new("Saigon Coffee", UserId::new(), [], t0());
        assert!(CommissionService::matches_search(&shop, None));
        assert!(CommissionService::matches_search(&shop, Some("  ")));
        assert!(CommissionService::matches_search(&shop, Some("coffee")));
        assert!(!CommissionService::matches_search(&shop, Some("tea")));
    }

    #[test]
    fn test_rate_validation() {
        assert!(CommissionService::validate_rate(dec!(0)).is_ok());
        assert!(CommissionService::validate_rate(dec!(100)).is_ok());
        assert!(CommissionService::validate_rate(dec!(-0.01)).is_err());
    }
}
