//! In-process document store.
//!
//! Each collection is a `DashMap`, so single-document writes are atomic.
//! Multi-document operations on one user's money (check available balance,
//! insert withdrawal, debit) run under that user's async mutex, obtained with
//! [`Database::lock_user`]. Lock acquisition is bounded by the storage timeout.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use moka::sync::Cache;
use rust_decimal::Decimal;
use souk_core::clock::Clock;
use souk_core::commission::{CommissionChange, Shop};
use souk_core::fee::FeeConfig;
use souk_core::ledger::{AvailableBalance, LedgerEntry, LedgerError, LedgerService, UserAccount};
use souk_core::withdrawal::policy::DayWindow;
use souk_core::withdrawal::{Withdrawal, WithdrawalFeeConfig};
use souk_shared::config::{FeeCacheConfig, StorageConfig};
use souk_shared::types::{FeeConfigId, ShopId, UserId, WithdrawalFeeConfigId, WithdrawalId};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::StorageError;
use crate::snapshot::Snapshot;

const ACTIVE_FEE_CONFIGS: &str = "active";

/// Handle to the document store. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct Database {
    inner: Arc<Inner>,
}

struct Inner {
    clock: Arc<dyn Clock>,
    timeout: Duration,
    fee_cache: Cache<&'static str, Arc<Vec<FeeConfig>>>,
    users: DashMap<UserId, UserAccount>,
    shops: DashMap<ShopId, Shop>,
    fee_configs: DashMap<FeeConfigId, FeeConfig>,
    withdrawal_fee_configs: DashMap<WithdrawalFeeConfigId, WithdrawalFeeConfig>,
    withdrawals: DashMap<WithdrawalId, Withdrawal>,
    withdrawal_codes: DashMap<String, WithdrawalId>,
    ledger_entries: DashMap<UserId, Vec<LedgerEntry>>,
    commission_changes: DashMap<ShopId, Vec<CommissionChange>>,
    user_locks: DashMap<UserId, Arc<Mutex<()>>>,
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("timeout", &self.inner.timeout)
            .field("users", &self.inner.users.len())
            .field("fee_configs", &self.inner.fee_configs.len())
            .field("withdrawals", &self.inner.withdrawals.len())
            .finish_non_exhaustive()
    }
}

impl Database {
    /// Creates an empty store.
    #[must_use]
    pub fn new(storage: &StorageConfig, fee_cache: &FeeCacheConfig, clock: Arc<dyn Clock>) -> Self {
        let cache = Cache::builder()
            .max_capacity(fee_cache.max_capacity)
            .time_to_live(fee_cache.ttl())
            .build();

        Self {
            inner: Arc::new(Inner {
                clock,
                timeout: storage.timeout(),
                fee_cache: cache,
                users: DashMap::new(),
                shops: DashMap::new(),
                fee_configs: DashMap::new(),
                withdrawal_fee_configs: DashMap::new(),
                withdrawals: DashMap::new(),
                withdrawal_codes: DashMap::new(),
                ledger_entries: DashMap::new(),
                commission_changes: DashMap::new(),
                user_locks: DashMap::new(),
            }),
        }
    }

    /// Current instant from the injected clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.inner.clock.now()
    }

    /// Runs `fut` under the storage deadline.
    pub async fn with_timeout<F, T>(&self, fut: F) -> Result<T, StorageError>
    where
        F: Future<Output = T>,
    {
        tokio::time::timeout(self.inner.timeout, fut)
            .await
            .map_err(|_| StorageError::Timeout)
    }

    /// Acquires the per-user critical section.
    ///
    /// Every read-decide-write sequence on a user's balance or withdrawals
    /// must hold this guard for its whole duration.
    pub async fn lock_user(&self, user_id: UserId) -> Result<OwnedMutexGuard<()>, StorageError> {
        let lock = self
            .inner
            .user_locks
            .entry(user_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        self.with_timeout(lock.lock_owned()).await
    }

    // ========== Users ==========

    /// Inserts or replaces a user account.
    pub fn put_user(&self, account: UserAccount) {
        self.inner.users.insert(account.id, account);
    }

    /// Fetches a user account.
    #[must_use]
    pub fn user(&self, user_id: UserId) -> Option<UserAccount> {
        self.inner.users.get(&user_id).map(|u| u.clone())
    }

    /// Debits a user and appends the ledger entry. Caller holds the user lock.
    pub fn apply_debit(
        &self,
        user_id: UserId,
        amount: Decimal,
        memo: &str,
        reference: Option<String>,
    ) -> Result<LedgerEntry, LedgerError> {
        let now = self.now();
        let entry = {
            let mut account = self
                .inner
                .users
                .get_mut(&user_id)
                .ok_or(LedgerError::AccountNotFound(user_id))?;
            LedgerService::debit(&mut account, amount, memo, reference, now)?
        };
        self.append_entry(entry.clone());
        Ok(entry)
    }

    /// Credits a user and appends the ledger entry. Caller holds the user lock.
    pub fn apply_credit(
        &self,
        user_id: UserId,
        amount: Decimal,
        memo: &str,
        reference: Option<String>,
    ) -> Result<LedgerEntry, LedgerError> {
        let now = self.now();
        let entry = {
            let mut account = self
                .inner
                .users
                .get_mut(&user_id)
                .ok_or(LedgerError::AccountNotFound(user_id))?;
            LedgerService::credit(&mut account, amount, memo, reference, now)?
        };
        self.append_entry(entry.clone());
        Ok(entry)
    }

    fn append_entry(&self, entry: LedgerEntry) {
        self.inner
            .ledger_entries
            .entry(entry.user_id)
            .or_default()
            .push(entry);
    }

    /// A user's ledger entries, oldest first.
    #[must_use]
    pub fn ledger_entries(&self, user_id: UserId) -> Vec<LedgerEntry> {
        self.inner
            .ledger_entries
            .get(&user_id)
            .map(|e| e.clone())
            .unwrap_or_default()
    }

    /// Committed balance minus the user's in-flight withdrawals.
    pub fn available_balance(&self, user_id: UserId) -> Result<AvailableBalance, LedgerError> {
        let account = self.user(user_id).ok_or(LedgerError::AccountNotFound(user_id))?;
        let pending = self
            .user_withdrawals(user_id)
            .into_iter()
            .filter(|w| w.status.is_in_flight())
            .map(|w| w.total_deduction());
        Ok(AvailableBalance::compute(account.balance, pending))
    }

    // ========== Shops ==========

    /// Inserts or replaces a shop.
    pub fn put_shop(&self, shop: Shop) {
        self.inner.shops.insert(shop.id, shop);
    }

    /// Fetches a shop.
    #[must_use]
    pub fn shop(&self, shop_id: ShopId) -> Option<Shop> {
        self.inner.shops.get(&shop_id).map(|s| s.clone())
    }

    /// Every shop.
    #[must_use]
    pub fn shops(&self) -> Vec<Shop> {
        self.inner.shops.iter().map(|s| s.value().clone()).collect()
    }

    // ========== Fee configs ==========

    /// Inserts or replaces a fee config and drops cached candidate lists.
    pub fn put_fee_config(&self, config: FeeConfig) {
        self.inner.fee_configs.insert(config.id, config);
        self.invalidate_fee_cache();
    }

    /// Removes a fee config and drops cached candidate lists.
    pub fn remove_fee_config(&self, id: FeeConfigId) -> Option<FeeConfig> {
        let removed = self.inner.fee_configs.remove(&id).map(|(_, c)| c);
        self.invalidate_fee_cache();
        removed
    }

    /// Applies `change` to one fee config in place.
    ///
    /// The document is replaced only if `change` succeeds.
    pub fn modify_fee_config<T, E>(
        &self,
        id: FeeConfigId,
        change: impl FnOnce(&mut FeeConfig) -> Result<T, E>,
    ) -> Result<Option<(T, FeeConfig)>, E> {
        let result = match self.inner.fee_configs.get_mut(&id) {
            Some(mut stored) => {
                let mut draft = stored.clone();
                let out = change(&mut draft)?;
                *stored = draft.clone();
                Some((out, draft))
            }
            None => None,
        };
        if result.is_some() {
            self.invalidate_fee_cache();
        }
        Ok(result)
    }

    /// Fetches a fee config.
    #[must_use]
    pub fn fee_config(&self, id: FeeConfigId) -> Option<FeeConfig> {
        self.inner.fee_configs.get(&id).map(|c| c.clone())
    }

    /// Every fee config.
    #[must_use]
    pub fn fee_configs(&self) -> Vec<FeeConfig> {
        self.inner
            .fee_configs
            .iter()
            .map(|c| c.value().clone())
            .collect()
    }

    /// Configs flagged active, served from the TTL cache.
    ///
    /// The cache never decides effectiveness: callers re-check the effective
    /// window against the clock on every use.
    #[must_use]
    pub fn active_fee_configs(&self) -> Arc<Vec<FeeConfig>> {
        self.inner.fee_cache.get_with(ACTIVE_FEE_CONFIGS, || {
            tracing::debug!("fee config cache miss");
            Arc::new(
                self.inner
                    .fee_configs
                    .iter()
                    .filter(|c| c.is_active)
                    .map(|c| c.value().clone())
                    .collect(),
            )
        })
    }

    /// Drops every cached candidate list.
    pub fn invalidate_fee_cache(&self) {
        self.inner.fee_cache.invalidate_all();
    }

    // ========== Withdrawal fee configs ==========

    /// Inserts or replaces a withdrawal fee config.
    pub fn put_withdrawal_fee_config(&self, config: WithdrawalFeeConfig) {
        self.inner.withdrawal_fee_configs.insert(config.id, config);
    }

    /// Fetches a withdrawal fee config.
    #[must_use]
    pub fn withdrawal_fee_config(&self, id: WithdrawalFeeConfigId) -> Option<WithdrawalFeeConfig> {
        self.inner.withdrawal_fee_configs.get(&id).map(|c| c.clone())
    }

    /// Every withdrawal fee config.
    #[must_use]
    pub fn withdrawal_fee_configs(&self) -> Vec<WithdrawalFeeConfig> {
        self.inner
            .withdrawal_fee_configs
            .iter()
            .map(|c| c.value().clone())
            .collect()
    }

    /// The withdrawal fee config in force at `now`.
    #[must_use]
    pub fn active_withdrawal_fee_config(&self, now: DateTime<Utc>) -> Option<WithdrawalFeeConfig> {
        let configs = self.withdrawal_fee_configs();
        WithdrawalFeeConfig::select_active(&configs, now).cloned()
    }

    // ========== Withdrawals ==========

    /// Inserts a new withdrawal, enforcing a unique code.
    pub fn insert_withdrawal(&self, withdrawal: Withdrawal) -> Result<(), StorageError> {
        match self.inner.withdrawal_codes.entry(withdrawal.withdrawal_code.clone()) {
            Entry::Occupied(_) => Err(StorageError::DuplicateKey(withdrawal.withdrawal_code)),
            Entry::Vacant(slot) => {
                slot.insert(withdrawal.id);
                self.inner.withdrawals.insert(withdrawal.id, withdrawal);
                Ok(())
            }
        }
    }

    /// Removes a withdrawal and frees its code.
    pub fn remove_withdrawal(&self, id: WithdrawalId) -> Option<Withdrawal> {
        let (_, removed) = self.inner.withdrawals.remove(&id)?;
        self.inner.withdrawal_codes.remove(&removed.withdrawal_code);
        Some(removed)
    }

    /// Replaces an existing withdrawal.
    pub fn replace_withdrawal(&self, withdrawal: Withdrawal) -> Result<(), StorageError> {
        match self.inner.withdrawals.get_mut(&withdrawal.id) {
            Some(mut stored) => {
                *stored = withdrawal;
                Ok(())
            }
            None => Err(StorageError::Missing(withdrawal.id.to_string())),
        }
    }

    /// Fetches a withdrawal by id.
    #[must_use]
    pub fn withdrawal(&self, id: WithdrawalId) -> Option<Withdrawal> {
        self.inner.withdrawals.get(&id).map(|w| w.clone())
    }

    /// Fetches a withdrawal by code.
    #[must_use]
    pub fn withdrawal_by_code(&self, code: &str) -> Option<Withdrawal> {
        let id = *self.inner.withdrawal_codes.get(code)?;
        self.withdrawal(id)
    }

    /// Every withdrawal.
    #[must_use]
    pub fn withdrawals(&self) -> Vec<Withdrawal> {
        self.inner
            .withdrawals
            .iter()
            .map(|w| w.value().clone())
            .collect()
    }

    /// A user's withdrawals, in no particular order.
    #[must_use]
    pub fn user_withdrawals(&self, user_id: UserId) -> Vec<Withdrawal> {
        self.inner
            .withdrawals
            .iter()
            .filter(|w| w.user_id == user_id)
            .map(|w| w.value().clone())
            .collect()
    }

    /// Requests made inside `day` and requests still in flight.
    #[must_use]
    pub fn withdrawal_counts(&self, user_id: UserId, day: DayWindow) -> (u32, u32) {
        self.user_withdrawals(user_id)
            .iter()
            .fold((0, 0), |(today, pending), w| {
                (
                    today + u32::from(day.contains(w.requested_at)),
                    pending + u32::from(w.status.is_in_flight()),
                )
            })
    }

    // ========== Commission audit ==========

    /// Appends audit rows. Rows are never modified or removed.
    pub fn append_commission_changes(&self, changes: impl IntoIterator<Item = CommissionChange>) {
        for change in changes {
            self.inner
                .commission_changes
                .entry(change.shop_id)
                .or_default()
                .push(change);
        }
    }

    /// A shop's audit rows, oldest first.
    #[must_use]
    pub fn commission_changes(&self, shop_id: ShopId) -> Vec<CommissionChange> {
        self.inner
            .commission_changes
            .get(&shop_id)
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    // ========== Snapshots ==========

    /// Copies every collection into a serializable snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            users: self.inner.users.iter().map(|u| u.value().clone()).collect(),
            shops: self.shops(),
            fee_configs: self.fee_configs(),
            withdrawal_fee_configs: self.withdrawal_fee_configs(),
            withdrawals: self.withdrawals(),
            ledger_entries: self
                .inner
                .ledger_entries
                .iter()
                .flat_map(|e| e.value().clone())
                .collect(),
            commission_changes: self
                .inner
                .commission_changes
                .iter()
                .flat_map(|c| c.value().clone())
                .collect(),
        }
    }

    /// Loads every document of `snapshot` into this store.
    pub fn restore(&self, snapshot: Snapshot) -> Result<(), StorageError> {
        for user in snapshot.users {
            self.put_user(user);
        }
        for shop in snapshot.shops {
            self.put_shop(shop);
        }
        for config in snapshot.fee_configs {
            self.inner.fee_configs.insert(config.id, config);
        }
        for config in snapshot.withdrawal_fee_configs {
            self.put_withdrawal_fee_config(config);
        }
        for withdrawal in snapshot.withdrawals {
            self.insert_withdrawal(withdrawal)?;
        }
        for entry in snapshot.ledger_entries {
            self.append_entry(entry);
        }
        self.append_commission_changes(snapshot.commission_changes);
        self.invalidate_fee_cache();
        Ok(())
    }

    /// Writes a JSON snapshot to `path`.
    pub async fn save_snapshot(&self, path: impl AsRef<std::path::Path>) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec_pretty(&self.snapshot())?;
        self.with_timeout(tokio::fs::write(path.as_ref(), bytes))
            .await??;
        tracing::info!(path = %path.as_ref().display(), "snapshot saved");
        Ok(())
    }

    /// Reads a JSON snapshot from `path` into this store.
    pub async fn load_snapshot(&self, path: impl AsRef<std::path::Path>) -> Result<(), StorageError> {
        let bytes = self
            .with_timeout(tokio::fs::read(path.as_ref()))
            .await??;
        let snapshot: Snapshot = serde_json::from_slice(&bytes)?;
        self.restore(snapshot)?;
        tracing::info!(path = %path.as_ref().display(), "snapshot loaded");
        Ok(())
    }
}
