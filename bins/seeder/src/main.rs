//! Snapshot seeder for Souk development and testing.
//!
//! Seeds demo users, shops, marketplace fee configs and a withdrawal fee
//! config, then writes the store to `storage.snapshot_path`.
//!
//! Usage: cargo run --bin seeder

use std::sync::Arc;

use anyhow::Context;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use souk_core::clock::SystemClock;
use souk_core::fee::{FeeConfigInput, FeeKind, FeeScope, FeeTier, TierCharge};
use souk_core::ledger::UserTier;
use souk_core::withdrawal::WithdrawalFeeConfigInput;
use souk_db::{
    BalanceRepository, CommissionRepository, Database, FeeConfigRepository,
    WithdrawalFeeConfigRepository,
};
use souk_shared::types::{CategoryId, UserId};
use souk_shared::{AppConfig, LogConfig};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Demo sellers: name, tier and opening balance.
const SELLERS: &[(&str, UserTier, i64)] = &[
    ("Nguyen Van A", UserTier::Regular, 2_000_000),
    ("Tran Thi B", UserTier::Gold, 15_000_000),
    ("Le Van C", UserTier::Vip, 40_000_000),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(&config.log);

    let path = config
        .storage
        .snapshot_path
        .clone()
        .context("storage.snapshot_path must be set to seed a snapshot")?;

    let db = Database::new(&config.storage, &config.fee_cache, Arc::new(SystemClock));
    let admin = UserId::new();

    info!("Seeding users...");
    let sellers = seed_users(&db).await?;

    info!("Seeding shops...");
    let food = CategoryId::new();
    let books = CategoryId::new();
    let commissions = CommissionRepository::new(db.clone());
    let coffee = commissions.create_shop("Saigon Coffee", sellers[0], [food]);
    commissions.create_shop("Hanoi Books", sellers[1], [books]);
    commissions.create_shop("Pho 24", sellers[2], [food]);

    info!("Seeding marketplace fee configs...");
    let fees = FeeConfigRepository::new(db.clone());
    let from = Utc::now() - Duration::days(1);
    fees.create(
        FeeConfigInput {
            minimum_fee: Decimal::from(1_000),
            ..FeeConfigInput::global_percentage("Platform commission", Decimal::from(5), from)
        },
        admin,
    )?;
    fees.create(
        FeeConfigInput {
            scope: FeeScope::Category,
            applicable_categories: [food].into(),
            kind: FeeKind::Tiered {
                tiers: vec![
                    FeeTier {
                        min_amount: Decimal::ZERO,
                        max_amount: Some(Decimal::from(500_000)),
                        charge: TierCharge::Fixed {
                            amount: Decimal::from(10_000),
                        },
                    },
                    FeeTier {
                        min_amount: Decimal::from(500_000),
                        max_amount: None,
                        charge: TierCharge::Percentage {
                            rate: Decimal::from(3),
                        },
                    },
                ],
            },
            ..FeeConfigInput::global_percentage("Food & drink", Decimal::ZERO, from)
        },
        admin,
    )?;
    fees.create(
        FeeConfigInput {
            scope: FeeScope::Shop,
            applicable_shops: [coffee.id].into(),
            ..FeeConfigInput::global_percentage("Saigon Coffee launch", Decimal::from(2), from)
        },
        admin,
    )?;

    info!("Seeding withdrawal fee config...");
    WithdrawalFeeConfigRepository::new(db.clone()).create(
        WithdrawalFeeConfigInput {
            name: "Standard payout".to_string(),
            kind: FeeKind::Percentage {
                percentage_rate: Decimal::ONE,
            },
            min_fee: Decimal::from(2_000),
            max_fee: Some(Decimal::from(50_000)),
            vip_exemption: true,
            is_active: true,
            effective_from: from,
            effective_to: None,
        },
        admin,
    )?;

    db.save_snapshot(&path).await?;
    info!(%path, "Seeding complete!");
    Ok(())
}

fn init_tracing(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| log.filter.as_str().into());
    let registry = tracing_subscriber::registry().with(filter);
    if log.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn seed_users(db: &Database) -> anyhow::Result<Vec<UserId>> {
    let balances = BalanceRepository::new(db.clone());
    let mut ids = Vec::with_capacity(SELLERS.len());
    for &(name, tier, opening) in SELLERS {
        let user = balances.create_user(name, tier);
        balances
            .credit(user.id, Decimal::from(opening), "opening balance")
            .await?;
        ids.push(user.id);
    }
    Ok(ids)
}
