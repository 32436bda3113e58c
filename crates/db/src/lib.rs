//! Storage layer for Souk.
//!
//! This crate provides:
//! - An in-process document store with per-user critical sections
//! - Repository abstractions for every fee, withdrawal, ledger and
//!   commission operation
//! - JSON snapshots for durability

pub mod error;
pub mod repositories;
pub mod snapshot;
pub mod store;

pub use error::StorageError;
pub use repositories::{
    BalanceRepository, CommissionRepository, FeeConfigRepository, WithdrawalFeeConfigRepository,
    WithdrawalRepository,
};
pub use snapshot::Snapshot;
pub use store::Database;

use std::sync::Arc;

use souk_core::clock::Clock;
use souk_shared::AppConfig;

/// Opens a store from configuration, loading the snapshot file if one is
/// configured and present.
///
/// # Errors
///
/// Returns an error if the snapshot exists but cannot be read or parsed.
pub async fn connect(config: &AppConfig, clock: Arc<dyn Clock>) -> Result<Database, StorageError> {
    let db = Database::new(&config.storage, &config.fee_cache, clock);
    if let Some(path) = &config.storage.snapshot_path {
        if tokio::fs::try_exists(path).await? {
            db.load_snapshot(path).await?;
        } else {
            tracing::info!(%path, "no snapshot found, starting empty");
        }
    }
    Ok(db)
}
