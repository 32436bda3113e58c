//! Withdrawal fee config repository.

use souk_core::withdrawal::{WithdrawalError, WithdrawalFeeConfig, WithdrawalFeeConfigInput};
use souk_shared::types::{UserId, WithdrawalFeeConfigId};

use crate::store::Database;

/// Withdrawal fee config repository.
#[derive(Debug, Clone)]
pub struct WithdrawalFeeConfigRepository {
    db: Database,
}

impl WithdrawalFeeConfigRepository {
    /// Creates a new withdrawal fee config repository.
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Validates and stores a new config.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if the fee kind, bounds or window are invalid.
    pub fn create(
        &self,
        input: WithdrawalFeeConfigInput,
        created_by: UserId,
    ) -> Result<WithdrawalFeeConfig, WithdrawalError> {
        let config = WithdrawalFeeConfig::create(input, created_by, self.db.now())?;
        self.db.put_withdrawal_fee_config(config.clone());
        tracing::info!(config_id = %config.id, name = %config.name, "withdrawal fee config created");
        Ok(config)
    }

    /// Fetches a config by id.
    ///
    /// # Errors
    ///
    /// Returns `FeeConfigNotFound` if no config has this id.
    pub fn get(&self, id: WithdrawalFeeConfigId) -> Result<WithdrawalFeeConfig, WithdrawalError> {
        self.db
            .withdrawal_fee_config(id)
            .ok_or(WithdrawalError::FeeConfigNotFound(id))
    }

    /// Every config, most recent `effective_from` first.
    #[must_use]
    pub fn list(&self) -> Vec<WithdrawalFeeConfig> {
        let mut configs = self.db.withdrawal_fee_configs();
        configs.sort_by(|a, b| {
            b.effective_from
                .cmp(&a.effective_from)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        configs
    }

    /// Marks a config inactive.
    ///
    /// # Errors
    ///
    /// Returns `FeeConfigNotFound` if no config has this id.
    pub fn deactivate(
        &self,
        id: WithdrawalFeeConfigId,
    ) -> Result<WithdrawalFeeConfig, WithdrawalError> {
        let mut config = self.get(id)?;
        config.is_active = false;
        config.updated_at = self.db.now();
        self.db.put_withdrawal_fee_config(config.clone());
        tracing::info!(config_id = %id, "withdrawal fee config deactivated");
        Ok(config)
    }

    /// The config in force right now.
    #[must_use]
    pub fn active(&self) -> Option<WithdrawalFeeConfig> {
        self.db.active_withdrawal_fee_config(self.db.now())
    }
}
