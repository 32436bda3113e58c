//! Integration tests for FeeConfigRepository.

mod common;

use chrono::Duration;
use common::{Harness, start};
use rust_decimal_macros::dec;
use souk_core::commission::ChangeContext;
use souk_core::fee::{
    FeeConfigInput, FeeContext, FeeError, FeeKind, FeeScope, FeeTier, FeeType, TierCharge,
};
use souk_db::repositories::{CalculateFeeRequest, FeeConfigFilter};
use souk_shared::types::{CategoryId, FeeConfigId, UserId};

fn five_percent() -> FeeConfigInput {
    FeeConfigInput {
        minimum_fee: dec!(1000),
        ..FeeConfigInput::global_percentage("Default", dec!(5), start())
    }
}

#[test]
fn test_calculate_with_global_percentage() {
    let h = Harness::new();
    h.fees.create(five_percent(), h.admin).unwrap();

    let result = h
        .fees
        .calculate(&CalculateFeeRequest {
            config_id: None,
            context: FeeContext::default(),
            order_amount: dec!(1000000),
        })
        .unwrap();
    assert_eq!(result.fee_amount, dec!(50000));
    assert_eq!(result.net_amount, dec!(950000));
    assert_eq!(result.fee_rate, dec!(5.00));
    assert_eq!(result.fee_type, FeeType::Percentage);

    let json = serde_json::to_value(&result).unwrap();
    assert!(json.get("feeAmount").is_some());
    assert!(json.get("netAmount").is_some());
    assert_eq!(json["feeType"], "PERCENTAGE");
}

#[test]
fn test_calculate_by_config_id() {
    let h = Harness::new();
    let tiered = h
        .fees
        .create(
            FeeConfigInput {
                kind: FeeKind::Tiered {
                    tiers: vec![
                        FeeTier {
                            min_amount: dec!(100000),
                            max_amount: None,
                            charge: TierCharge::Percentage { rate: dec!(2) },
                        },
                        FeeTier {
                            min_amount: dec!(0),
                            max_amount: Some(dec!(100000)),
                            charge: TierCharge::Fixed { amount: dec!(3000) },
                        },
                    ],
                },
                ..FeeConfigInput::global_percentage("Tiered", dec!(0), start())
            },
            h.admin,
        )
        .unwrap();

    let calc = |amount| {
        h.fees.calculate(&CalculateFeeRequest {
            config_id: Some(tiered.id),
            context: FeeContext::default(),
            order_amount: amount,
        })
    };
    assert_eq!(calc(dec!(50000)).unwrap().fee_amount, dec!(3000));
    assert_eq!(calc(dec!(50000)).unwrap().fee_rate, dec!(6.00));
    assert_eq!(calc(dec!(200000)).unwrap().fee_amount, dec!(4000));

    let missing = h.fees.calculate(&CalculateFeeRequest {
        config_id: Some(FeeConfigId::new()),
        context: FeeContext::default(),
        order_amount: dec!(1000),
    });
    assert!(matches!(missing, Err(FeeError::ConfigNotFound(_))));
}

#[test]
fn test_crud_and_validation() {
    let h = Harness::new();
    let created = h.fees.create(five_percent(), h.admin).unwrap();
    assert_eq!(created.created_by, h.admin);
    assert_eq!(h.fees.get(created.id).unwrap(), created);

    let overlapping = FeeConfigInput {
        kind: FeeKind::Tiered {
            tiers: vec![
                FeeTier {
                    min_amount: dec!(0),
                    max_amount: Some(dec!(100000)),
                    charge: TierCharge::Fixed { amount: dec!(1000) },
                },
                FeeTier {
                    min_amount: dec!(50000),
                    max_amount: None,
                    charge: TierCharge::Fixed { amount: dec!(2000) },
                },
            ],
        },
        ..five_percent()
    };
    assert!(matches!(
        h.fees.create(overlapping, h.admin),
        Err(FeeError::OverlappingTiers { index: 1 })
    ));

    let shop_without_shops = FeeConfigInput {
        scope: FeeScope::Shop,
        ..five_percent()
    };
    assert!(matches!(
        h.fees.create(shop_without_shops, h.admin),
        Err(FeeError::ScopeMismatch(_))
    ));

    let backwards = FeeConfigInput {
        effective_to: Some(start() - Duration::days(1)),
        ..five_percent()
    };
    assert!(matches!(
        h.fees.create(backwards, h.admin),
        Err(FeeError::InvalidEffectiveWindow)
    ));

    let editor = UserId::new();
    h.clock.advance(Duration::minutes(1));
    let updated = h
        .fees
        .update(
            created.id,
            FeeConfigInput {
                name: "Renamed".to_string(),
                ..created.to_input()
            },
            &ChangeContext {
                changed_by: editor,
                ..ChangeContext::default()
            },
        )
        .unwrap();
    assert_eq!(updated.name, "Renamed");
    assert_eq!(updated.updated_by, Some(editor));
    assert_eq!(updated.updated_at, start() + Duration::minutes(1));

    let bad_update = FeeConfigInput {
        kind: FeeKind::Percentage {
            percentage_rate: dec!(150),
        },
        ..updated.to_input()
    };
    assert!(h.fees.update(created.id, bad_update, &ChangeContext::default()).is_err());
    assert_eq!(h.fees.get(created.id).unwrap(), updated);

    h.fees.delete(created.id).unwrap();
    assert!(matches!(h.fees.get(created.id), Err(FeeError::ConfigNotFound(_))));
    assert!(h.fees.delete(created.id).is_err());
}

#[test]
fn test_list_filters_and_orders_by_priority() {
    let h = Harness::new();
    let low = h.fees.create(five_percent(), h.admin).unwrap();
    let high = h
        .fees
        .create(
            FeeConfigInput {
                priority: 10,
                scope: FeeScope::Category,
                applicable_categories: [CategoryId::new()].into(),
                ..five_percent()
            },
            h.admin,
        )
        .unwrap();
    let future = h
        .fees
        .create(
            FeeConfigInput {
                effective_from: start() + Duration::days(1),
                ..five_percent()
            },
            h.admin,
        )
        .unwrap();

    let all = h.fees.list(FeeConfigFilter::default());
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].id, high.id);

    let categories = h.fees.list(FeeConfigFilter {
        scope: Some(FeeScope::Category),
        active_only: false,
    });
    assert_eq!(categories.len(), 1);

    let active = h.fees.list(FeeConfigFilter {
        scope: None,
        active_only: true,
    });
    assert!(active.iter().any(|c| c.id == low.id));
    assert!(active.iter().all(|c| c.id != future.id));
}

#[test]
fn test_shop_beats_category_beats_general() {
    let h = Harness::new();
    let seller = UserId::new();
    let category = CategoryId::new();
    let shop = h.commissions.create_shop("Pho 24", seller, [category]);

    let general = h
        .fees
        .create(
            FeeConfigInput {
                priority: 100,
                ..five_percent()
            },
            h.admin,
        )
        .unwrap();
    let by_category = h
        .fees
        .create(
            FeeConfigInput {
                scope: FeeScope::Category,
                applicable_categories: [category].into(),
                ..FeeConfigInput::global_percentage("Food", dec!(4), start())
            },
            h.admin,
        )
        .unwrap();
    let by_shop = h
        .fees
        .create(
            FeeConfigInput {
                scope: FeeScope::Shop,
                applicable_shops: [shop.id].into(),
                // A shop list takes precedence; the category list is ignored.
                applicable_categories: [CategoryId::new()].into(),
                ..FeeConfigInput::global_percentage("Pho 24", dec!(3), start())
            },
            h.admin,
        )
        .unwrap();

    let ctx = FeeContext::for_shop(shop.id, [category]);
    assert_eq!(h.fees.applicable(&ctx).unwrap().id, by_shop.id);

    let other_shop = FeeContext::for_shop(souk_shared::types::ShopId::new(), [category]);
    assert_eq!(h.fees.applicable(&other_shop).unwrap().id, by_category.id);

    assert_eq!(h.fees.applicable(&FeeContext::default()).unwrap().id, general.id);
}

#[test]
fn test_writes_invalidate_cached_candidates() {
    let h = Harness::new();
    let config = h.fees.create(five_percent(), h.admin).unwrap();
    let ctx = FeeContext::default();
    assert_eq!(h.fees.applicable(&ctx).unwrap().kind.headline_rate(), dec!(5));

    let input = FeeConfigInput {
        kind: FeeKind::Percentage {
            percentage_rate: dec!(7),
        },
        ..config.to_input()
    };
    h.fees.update(config.id, input, &ChangeContext::default()).unwrap();
    assert_eq!(h.fees.applicable(&ctx).unwrap().kind.headline_rate(), dec!(7));

    h.fees.delete(config.id).unwrap();
    assert!(matches!(h.fees.applicable(&ctx), Err(FeeError::NoApplicableConfig)));
}

#[test]
fn test_expired_config_is_never_served_from_cache() {
    let h = Harness::new();
    let fallback = h.fees.create(five_percent(), h.admin).unwrap();
    let promo = h
        .fees
        .create(
            FeeConfigInput {
                priority: 10,
                effective_to: Some(start() + Duration::seconds(30)),
                ..FeeConfigInput::global_percentage("Flash sale", dec!(1), start())
            },
            h.admin,
        )
        .unwrap();

    let ctx = FeeContext::default();
    assert_eq!(h.fees.applicable(&ctx).unwrap().id, promo.id);

    h.clock.advance(Duration::seconds(30));
    assert_eq!(h.fees.applicable(&ctx).unwrap().id, fallback.id);
}

#[test]
fn test_editing_shop_config_rate_is_audited() {
    let h = Harness::new();
    let seller = UserId::new();
    let a = h.commissions.create_shop("A", seller, []);
    let b = h.commissions.create_shop("B", UserId::new(), []);
    let config = h
        .fees
        .create(
            FeeConfigInput {
                scope: FeeScope::Shop,
                applicable_shops: [a.id, b.id].into(),
                ..FeeConfigInput::global_percentage("Partners", dec!(3), start())
            },
            h.admin,
        )
        .unwrap();

    let ctx = ChangeContext {
        changed_by: h.admin,
        reason: Some("renegotiated".to_string()),
        note: None,
    };
    h.fees
        .update(
            config.id,
            FeeConfigInput {
                name: "Partners 2026".to_string(),
                ..config.to_input()
            },
            &ctx,
        )
        .unwrap();
    assert!(h.commissions.history(a.id).is_empty());

    let input = FeeConfigInput {
        kind: FeeKind::Percentage {
            percentage_rate: dec!(2.5),
        },
        ..config.to_input()
    };
    h.fees.update(config.id, input, &ctx).unwrap();

    let history = h.commissions.history(a.id);
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].previous_rate, dec!(3));
    assert_eq!(history[0].new_rate, dec!(2.5));
    assert_eq!(history[0].seller_id, Some(seller));
    assert_eq!(history[0].reason.as_deref(), Some("renegotiated"));
    assert_eq!(h.commissions.history(b.id).len(), 1);
}

#[test]
fn test_editing_fixed_shop_config_amount_is_audited() {
    let h = Harness::new();
    let shop = h.commissions.create_shop("Flat Rate Co", UserId::new(), []);
    let config = h
        .fees
        .create(
            FeeConfigInput {
                scope: FeeScope::Shop,
                applicable_shops: [shop.id].into(),
                kind: FeeKind::Fixed {
                    fixed_amount: dec!(1000),
                },
                ..FeeConfigInput::global_percentage("Flat", dec!(0), start())
            },
            h.admin,
        )
        .unwrap();
    let ctx = ChangeContext {
        changed_by: h.admin,
        reason: None,
        note: None,
    };

    let input = FeeConfigInput {
        kind: FeeKind::Fixed {
            fixed_amount: dec!(9000),
        },
        ..config.to_input()
    };
    h.fees.update(config.id, input, &ctx).unwrap();
    let history = h.commissions.history(shop.id);
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].fee_type, FeeType::Fixed);
    assert_eq!(history[0].config_id, config.id);

    let input = FeeConfigInput {
        maximum_fee: Some(dec!(5000)),
        ..h.fees.get(config.id).unwrap().to_input()
    };
    h.fees.update(config.id, input, &ctx).unwrap();
    assert_eq!(h.commissions.history(shop.id).len(), 2);
}

#[test]
fn test_moving_shop_config_audits_both_shops() {
    let h = Harness::new();
    let a = h.commissions.create_shop("A", UserId::new(), []);
    let b = h.commissions.create_shop("B", UserId::new(), []);
    let config = h
        .fees
        .create(
            FeeConfigInput {
                scope: FeeScope::Shop,
                applicable_shops: [a.id].into(),
                ..FeeConfigInput::global_percentage("Partners", dec!(3), start())
            },
            h.admin,
        )
        .unwrap();
    let ctx = ChangeContext {
        changed_by: h.admin,
        reason: Some("reassigned".to_string()),
        note: None,
    };

    let input = FeeConfigInput {
        applicable_shops: [b.id].into(),
        ..config.to_input()
    };
    h.fees.update(config.id, input, &ctx).unwrap();

    assert_eq!(h.commissions.history(a.id).len(), 1);
    assert_eq!(h.commissions.history(b.id).len(), 1);
}
