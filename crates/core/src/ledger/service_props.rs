//! Property-based tests for balance postings.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::account::{UserAccount, UserTier};
use super::service::LedgerService;

/// Strategy for whole posting amounts.
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (1i64..=5_000_000).prop_map(Decimal::from)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// The final balance equals the initial balance minus every accepted
    /// debit, and never drops below zero along the way.
    #[test]
    fn prop_balance_invariant(
        initial in 0i64..=20_000_000,
        debits in prop::collection::vec(arb_amount(), 0..40),
    ) {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let initial = Decimal::from(initial);
        let mut account = UserAccount::new("prop", UserTier::Regular, now);
        account.balance = initial;

        let mut accepted = Decimal::ZERO;
        for amount in debits {
            let before = account.balance;
            match LedgerService::debit(&mut account, amount, "prop", None, now) {
                Ok(entry) => {
                    accepted += amount;
                    prop_assert_eq!(entry.balance_after, before - amount);
                }
                Err(_) => prop_assert_eq!(account.balance, before),
            }
            prop_assert!(account.balance >= Decimal::ZERO);
        }
        prop_assert_eq!(account.balance, initial - accepted);
    }
}
