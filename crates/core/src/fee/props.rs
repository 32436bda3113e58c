//! Property-based tests for fee math and config resolution.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use souk_shared::types::{CategoryId, ShopId, UserId};

use crate::fee::calculator::FeeCalculator;
use crate::fee::error::FeeError;
use crate::fee::resolver::{FeeContext, FeeResolver};
use crate::fee::types::{FeeConfig, FeeConfigInput, FeeKind, FeeScope};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
}

/// Strategy for whole amounts up to 100 million.
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (0i64..=100_000_000).prop_map(Decimal::from)
}

/// Strategy for whole amounts across the full 96-bit mantissa.
fn arb_huge_amount() -> impl Strategy<Value = Decimal> {
    (any::<u32>(), any::<u32>(), any::<u32>())
        .prop_map(|(lo, mid, hi)| Decimal::from_parts(lo, mid, hi, false, 0))
}

/// Strategy for rates 0.00..=100.00.
fn arb_rate() -> impl Strategy<Value = Decimal> {
    (0i64..=10_000).prop_map(|r| Decimal::new(r, 2))
}

fn arb_kind() -> impl Strategy<Value = FeeKind> {
    prop_oneof![
        arb_rate().prop_map(|percentage_rate| FeeKind::Percentage { percentage_rate }),
        (0i64..=1_000_000).prop_map(|f| FeeKind::Fixed {
            fixed_amount: Decimal::from(f)
        }),
    ]
}

fn percentage(rate: Decimal, min: Decimal, max: Option<Decimal>) -> FeeConfig {
    let mut input = FeeConfigInput::global_percentage("prop", rate, t0());
    input.minimum_fee = min;
    input.maximum_fee = max;
    FeeConfig::create(input, UserId::new(), t0()).unwrap()
}

#[derive(Debug, Clone, Copy)]
enum Specificity {
    General,
    Category,
    Shop,
}

fn arb_specificity() -> impl Strategy<Value = Specificity> {
    prop_oneof![
        Just(Specificity::General),
        Just(Specificity::Category),
        Just(Specificity::Shop),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// A larger order never pays a smaller percentage fee.
    #[test]
    fn prop_percentage_fee_is_monotonic(
        rate in arb_rate(),
        a in arb_amount(),
        b in arb_amount(),
    ) {
        let cfg = percentage(rate, Decimal::ZERO, None);
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let fee_lo = FeeCalculator::compute(&cfg, lo).unwrap().fee_amount;
        let fee_hi = FeeCalculator::compute(&cfg, hi).unwrap().fee_amount;
        prop_assert!(fee_hi >= fee_lo);
    }

    /// Every positive amount lands inside `[minimum_fee, maximum_fee]`.
    #[test]
    fn prop_fee_stays_within_clamp(
        kind in arb_kind(),
        amount in 1i64..=100_000_000,
        min in 0i64..=50_000,
        span in 0i64..=500_000,
    ) {
        let min = Decimal::from(min);
        let max = min + Decimal::from(span);
        let mut input = FeeConfigInput::global_percentage("prop", Decimal::ZERO, t0());
        input.kind = kind;
        input.minimum_fee = min;
        input.maximum_fee = Some(max);
        let cfg = FeeConfig::create(input, UserId::new(), t0()).unwrap();

        let calc = FeeCalculator::compute(&cfg, Decimal::from(amount)).unwrap();
        prop_assert!(calc.fee_amount >= min);
        prop_assert!(calc.fee_amount <= max);
        prop_assert_eq!(calc.net_amount, Decimal::from(amount) - calc.fee_amount);
    }

    /// Amounts near `Decimal::MAX` price or fail cleanly, never panic.
    #[test]
    fn prop_huge_amount_never_panics(
        kind in arb_kind(),
        amount in arb_huge_amount(),
    ) {
        let mut input = FeeConfigInput::global_percentage("prop", Decimal::ZERO, t0());
        let is_percentage = matches!(kind, FeeKind::Percentage { .. });
        input.kind = kind;
        let cfg = FeeConfig::create(input, UserId::new(), t0()).unwrap();

        match FeeCalculator::compute(&cfg, amount) {
            Ok(calc) => {
                prop_assert!(calc.fee_amount >= Decimal::ZERO);
                prop_assert!(calc.net_amount.fract().is_zero());
                if is_percentage {
                    prop_assert!(calc.fee_amount <= amount);
                }
            }
            Err(err) => prop_assert!(matches!(err, FeeError::AmountOutOfRange(_))),
        }
    }

    /// Zero and negative orders never pay a fee.
    #[test]
    fn prop_non_positive_amount_is_free(
        kind in arb_kind(),
        amount in -100_000_000i64..=0,
        min in 0i64..=50_000,
    ) {
        let mut input = FeeConfigInput::global_percentage("prop", Decimal::ZERO, t0());
        input.kind = kind;
        input.minimum_fee = Decimal::from(min);
        let cfg = FeeConfig::create(input, UserId::new(), t0()).unwrap();

        let calc = FeeCalculator::compute(&cfg, Decimal::from(amount)).unwrap();
        prop_assert_eq!(calc.fee_amount, Decimal::ZERO);
        prop_assert_eq!(calc.net_amount, Decimal::from(amount));
    }

    /// The picked config depends on specificity, priority and recency only,
    /// never on the order configs were stored in.
    #[test]
    fn prop_resolution_ignores_insertion_order(
        shapes in prop::collection::vec((arb_specificity(), -5i32..5, 0i64..1_000), 1..12),
        seed in any::<u64>(),
    ) {
        let shop = ShopId::new();
        let category = CategoryId::new();
        let configs: Vec<FeeConfig> = shapes
            .iter()
            .enumerate()
            .map(|(i, (shape, priority, minutes))| {
                let mut input = FeeConfigInput::global_percentage(format!("cfg-{i}"), Decimal::ONE, t0());
                input.priority = *priority;
                match shape {
                    Specificity::General => {}
                    Specificity::Category => {
                        input.scope = FeeScope::Category;
                        input.applicable_categories.insert(category);
                    }
                    Specificity::Shop => {
                        input.scope = FeeScope::Shop;
                        input.applicable_shops.insert(shop);
                    }
                }
                // Distinct creation instants keep the order total.
                let created_at = t0() + Duration::minutes(*minutes) + Duration::milliseconds(i as i64);
                FeeConfig::create(input, UserId::new(), created_at).unwrap()
            })
            .collect();

        let mut shuffled = configs.clone();
        let len = shuffled.len();
        let rotate = usize::try_from(seed % len as u64).unwrap();
        shuffled.rotate_left(rotate);
        shuffled.reverse();

        let ctx = FeeContext::for_shop(shop, [category]);
        let now = t0() + Duration::days(1);
        let a = FeeResolver::resolve(&configs, &ctx, now).unwrap();
        let b = FeeResolver::resolve(&shuffled, &ctx, now).unwrap();
        prop_assert_eq!(a.id, b.id);

        let best_level = configs
            .iter()
            .filter_map(|c| FeeResolver::match_level(c, &ctx))
            .max();
        prop_assert_eq!(FeeResolver::match_level(a, &ctx), best_level);
    }
}
