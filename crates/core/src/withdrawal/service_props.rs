//! Property-based tests for the withdrawal status machine.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use souk_shared::types::{UserId, WithdrawalId};

use super::error::WithdrawalError;
use super::types::{
    BalanceSnapshot, BankInfo, FeeInfo, ProcessingInfo, Withdrawal, WithdrawalStatus,
};

fn arb_status() -> impl Strategy<Value = WithdrawalStatus> {
    prop_oneof![
        Just(WithdrawalStatus::Pending),
        Just(WithdrawalStatus::Processing),
        Just(WithdrawalStatus::Completed),
        Just(WithdrawalStatus::Failed),
        Just(WithdrawalStatus::Cancelled),
        Just(WithdrawalStatus::Success),
    ]
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
}

fn withdrawal(status: WithdrawalStatus) -> Withdrawal {
    Withdrawal {
        id: WithdrawalId::new(),
        withdrawal_code: "WD202601010000000000".to_string(),
        user_id: UserId::new(),
        amount: Decimal::from(10_000),
        bank_info: BankInfo {
            bank_name: "ACB".to_string(),
            account_number: "******7890".to_string(),
            account_holder_name: "Holder".to_string(),
        },
        status,
        balance_snapshot: BalanceSnapshot::new(Decimal::from(50_000), Decimal::from(10_000)),
        fee_info: FeeInfo::new(Decimal::from(10_000), Decimal::ZERO),
        processing_info: ProcessingInfo::default(),
        requested_at: t0(),
        processed_at: None,
        completed_at: None,
        updated_at: t0(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// `transition` succeeds exactly for the pairs in the table.
    #[test]
    fn prop_transition_agrees_with_table(from in arb_status(), to in arb_status()) {
        let mut w = withdrawal(from);
        let result = w.transition(to, None, t0());
        prop_assert_eq!(result.is_ok(), from.can_transition_to(to));
        if result.is_ok() {
            prop_assert_eq!(w.status, to);
        } else {
            prop_assert_eq!(w.status, from);
        }
    }

    /// Nothing leaves `completed`.
    #[test]
    fn prop_completed_is_final(to in arb_status()) {
        let mut w = withdrawal(WithdrawalStatus::Completed);
        let is_invalid_transition = matches!(
            w.transition(to, None, t0()),
            Err(WithdrawalError::InvalidStatusTransition { .. })
        );
        prop_assert!(is_invalid_transition);
    }

    /// Retrying a failed payout is always allowed.
    #[test]
    fn prop_failed_to_processing_succeeds(minutes in 0i64..100_000) {
        let mut w = withdrawal(WithdrawalStatus::Failed);
        prop_assert!(w.transition(WithdrawalStatus::Processing, None, t0() + Duration::minutes(minutes)).is_ok());
    }

    /// Along any walk, once set, timestamps never move and
    /// `completed_at` implies `processed_at`.
    #[test]
    fn prop_timestamps_are_stable(steps in prop::collection::vec(arb_status(), 0..20)) {
        let mut w = withdrawal(WithdrawalStatus::Pending);
        for (i, to) in steps.into_iter().enumerate() {
            let before = w.clone();
            let now = t0() + Duration::minutes(i64::try_from(i).unwrap() + 1);
            if w.transition(to, None, now).is_ok() {
                if let Some(p) = before.processed_at {
                    prop_assert_eq!(w.processed_at, Some(p));
                }
                if before.completed_at.is_some() {
                    prop_assert!(false, "terminal record transitioned");
                }
            }
            if w.completed_at.is_some() {
                prop_assert!(w.processed_at.is_some());
            }
        }
    }
}
