//! Shared fixtures for repository integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use souk_core::clock::ManualClock;
use souk_core::fee::FeeKind;
use souk_core::ledger::{UserAccount, UserTier};
use souk_core::withdrawal::{
    BankInfoInput, WithdrawalFeeConfig, WithdrawalFeeConfigInput, WithdrawalPolicy,
    WithdrawalRequest,
};
use souk_db::{
    BalanceRepository, CommissionRepository, Database, FeeConfigRepository,
    WithdrawalFeeConfigRepository, WithdrawalRepository,
};
use souk_shared::config::{FeeCacheConfig, StorageConfig};
use souk_shared::types::UserId;

/// 10:00 local time in Ho Chi Minh City.
pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 10, 3, 0, 0).unwrap()
}

/// Every repository over one store and one manual clock.
pub struct Harness {
    pub db: Database,
    pub clock: ManualClock,
    pub admin: UserId,
    pub balances: BalanceRepository,
    pub withdrawals: WithdrawalRepository,
    pub withdrawal_fees: WithdrawalFeeConfigRepository,
    pub fees: FeeConfigRepository,
    pub commissions: CommissionRepository,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_policy(WithdrawalPolicy::default())
    }

    pub fn with_policy(policy: WithdrawalPolicy) -> Self {
        Self::with_storage(policy, StorageConfig::default())
    }

    pub fn with_storage(policy: WithdrawalPolicy, storage: StorageConfig) -> Self {
        let clock = ManualClock::new(start());
        let db = Database::new(&storage, &FeeCacheConfig::default(), Arc::new(clock.clone()));
        Self {
            balances: BalanceRepository::new(db.clone()),
            withdrawals: WithdrawalRepository::new(db.clone(), policy),
            withdrawal_fees: WithdrawalFeeConfigRepository::new(db.clone()),
            fees: FeeConfigRepository::new(db.clone()),
            commissions: CommissionRepository::new(db.clone()),
            admin: UserId::new(),
            db,
            clock,
        }
    }

    /// A user holding `balance`.
    pub async fn funded_user(&self, balance: Decimal, tier: UserTier) -> UserAccount {
        let user = self.balances.create_user("Tran Van A", tier);
        if balance > Decimal::ZERO {
            self.balances
                .credit(user.id, balance, "top-up")
                .await
                .expect("credit");
        }
        self.balances.get_user(user.id).expect("user")
    }

    /// 1%, clamped to [5,000, 50,000], VIP exempt.
    pub fn one_percent_fee(&self) -> WithdrawalFeeConfig {
        self.withdrawal_fees
            .create(
                WithdrawalFeeConfigInput {
                    name: "standard".to_string(),
                    kind: FeeKind::Percentage {
                        percentage_rate: dec!(1),
                    },
                    min_fee: dec!(5000),
                    max_fee: Some(dec!(50000)),
                    vip_exemption: true,
                    is_active: true,
                    effective_from: start(),
                    effective_to: None,
                },
                self.admin,
            )
            .expect("withdrawal fee config")
    }
}

pub fn bank() -> BankInfoInput {
    BankInfoInput {
        bank_name: "Vietcombank".to_string(),
        account_number: "0123456789".to_string(),
        account_holder_name: "TRAN VAN A".to_string(),
    }
}

pub fn request(user_id: UserId, amount: Decimal) -> WithdrawalRequest {
    WithdrawalRequest {
        user_id,
        amount,
        bank_info: bank(),
        withdrawal_fee: None,
    }
}

pub fn held_funds() -> WithdrawalPolicy {
    WithdrawalPolicy {
        auto_approve: false,
        ..WithdrawalPolicy::default()
    }
}
