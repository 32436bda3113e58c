//! Integration tests for BalanceRepository.

mod common;

use chrono::Duration;
use common::Harness;
use rust_decimal_macros::dec;
use souk_core::ledger::{LedgerEntryType, LedgerError, UserTier};
use souk_shared::types::UserId;

#[tokio::test]
async fn test_credit_debit_and_entries() {
    let h = Harness::new();
    let user = h.balances.create_user("Le Thi C", UserTier::Gold);
    assert_eq!(h.balances.get_balance(user.id).unwrap(), dec!(0));

    h.balances.credit(user.id, dec!(80000), "sale payout").await.unwrap();
    h.clock.advance(Duration::seconds(1));
    let debit = h.balances.debit(user.id, dec!(30000), "adjustment").await.unwrap();
    assert_eq!(debit.balance_after, dec!(50000));

    let entries = h.balances.entries(user.id);
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].entry_type, LedgerEntryType::Debit);
    assert_eq!(entries[0].memo, "adjustment");
    assert_eq!(entries[1].entry_type, LedgerEntryType::Credit);
    assert_eq!(h.balances.get_balance(user.id).unwrap(), dec!(50000));
}

#[tokio::test]
async fn test_debit_never_goes_negative() {
    let h = Harness::new();
    let user = h.funded_user(dec!(10000), UserTier::Regular).await;

    let err = h.balances.debit(user.id, dec!(10001), "too much").await.unwrap_err();
    match err {
        LedgerError::InsufficientBalance { requested, balance } => {
            assert_eq!(requested, dec!(10001));
            assert_eq!(balance, dec!(10000));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(h.balances.get_balance(user.id).unwrap(), dec!(10000));
    assert_eq!(h.balances.entries(user.id).len(), 1);

    h.balances.debit(user.id, dec!(10000), "all of it").await.unwrap();
    assert_eq!(h.balances.get_balance(user.id).unwrap(), dec!(0));
}

#[tokio::test]
async fn test_invalid_amounts_and_unknown_users() {
    let h = Harness::new();
    let user = h.funded_user(dec!(10000), UserTier::Regular).await;

    assert!(matches!(
        h.balances.credit(user.id, dec!(0), "nothing").await,
        Err(LedgerError::NonPositiveAmount(_))
    ));
    assert!(matches!(
        h.balances.debit(user.id, dec!(10.5), "cents").await,
        Err(LedgerError::FractionalAmount(_))
    ));
    assert!(matches!(
        h.balances.debit(UserId::new(), dec!(100), "ghost").await,
        Err(LedgerError::AccountNotFound(_))
    ));
    assert!(h.balances.get_available_balance(UserId::new()).is_err());
}
