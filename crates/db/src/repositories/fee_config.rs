//! Fee config repository: admin CRUD, resolution and fee calculation.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use souk_core::commission::{ChangeContext, CommissionService};
use souk_core::fee::{
    FeeCalculation, FeeCalculator, FeeConfig, FeeConfigInput, FeeContext, FeeError, FeeResolver,
    FeeScope,
};
use souk_shared::types::{FeeConfigId, ShopId, UserId};

use crate::store::Database;

/// Filter for fee config listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeConfigFilter {
    /// Restrict to one scope.
    #[serde(default)]
    pub scope: Option<FeeScope>,
    /// Only configs effective right now.
    #[serde(default)]
    pub active_only: bool,
}

/// Fee calculation request: a named config or a context to resolve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculateFeeRequest {
    /// Config to use directly; skips resolution.
    #[serde(default)]
    pub config_id: Option<FeeConfigId>,
    /// Context to resolve when no config is named.
    #[serde(default)]
    pub context: FeeContext,
    /// Amount to charge.
    pub order_amount: Decimal,
}

/// Fee config repository.
#[derive(Debug, Clone)]
pub struct FeeConfigRepository {
    db: Database,
}

impl FeeConfigRepository {
    /// Creates a new fee config repository.
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Validates and stores a new config.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the input breaks any config invariant.
    pub fn create(&self, input: FeeConfigInput, created_by: UserId) -> Result<FeeConfig, FeeError> {
        let config = FeeConfig::create(input, created_by, self.db.now())?;
        self.db.put_fee_config(config.clone());
        tracing::info!(config_id = %config.id, name = %config.name, fee_type = %config.fee_type(), "fee config created");
        Ok(config)
    }

    /// Fetches a config by id.
    ///
    /// # Errors
    ///
    /// Returns `ConfigNotFound` if no config has this id.
    pub fn get(&self, id: FeeConfigId) -> Result<FeeConfig, FeeError> {
        self.db.fee_config(id).ok_or(FeeError::ConfigNotFound(id))
    }

    /// Lists configs in candidate order.
    #[must_use]
    pub fn list(&self, filter: FeeConfigFilter) -> Vec<FeeConfig> {
        let now = self.db.now();
        let mut configs: Vec<FeeConfig> = self
            .db
            .fee_configs()
            .into_iter()
            .filter(|c| filter.scope.is_none_or(|s| s == c.scope))
            .filter(|c| !filter.active_only || c.is_effective_at(now))
            .collect();
        configs.sort_by(FeeResolver::candidate_order);
        configs
    }

    /// Replaces a config's admin fields.
    ///
    /// If the edit changes the pricing or the shop list of a config that
    /// lists shops before or after, one audit row is written per shop listed
    /// on either side.
    ///
    /// # Errors
    ///
    /// Returns `ConfigNotFound` or a validation error; the stored config is
    /// unchanged on error.
    pub fn update(
        &self,
        id: FeeConfigId,
        input: FeeConfigInput,
        ctx: &ChangeContext,
    ) -> Result<FeeConfig, FeeError> {
        let now = self.db.now();
        let (before, updated) = self
            .db
            .modify_fee_config(id, |config| {
                let before = config.clone();
                config.apply(input, ctx.changed_by, now)?;
                Ok::<_, FeeError>(before)
            })?
            .ok_or(FeeError::ConfigNotFound(id))?;

        let shops = CommissionService::affected_shops(&before, &updated);
        if !shops.is_empty() {
            let rows = CommissionService::changes_for_shops(
                &updated,
                &shops,
                before.kind.headline_rate(),
                ctx,
                &self.sellers(),
                now,
            );
            tracing::info!(config_id = %id, shops = rows.len(), "shop commission changed");
            self.db.append_commission_changes(rows);
        }
        tracing::info!(config_id = %id, "fee config updated");
        Ok(updated)
    }

    /// Deletes a config.
    ///
    /// # Errors
    ///
    /// Returns `ConfigNotFound` if no config has this id.
    pub fn delete(&self, id: FeeConfigId) -> Result<FeeConfig, FeeError> {
        let removed = self
            .db
            .remove_fee_config(id)
            .ok_or(FeeError::ConfigNotFound(id))?;
        tracing::info!(config_id = %id, "fee config deleted");
        Ok(removed)
    }

    /// The config that applies to `ctx` right now.
    ///
    /// # Errors
    ///
    /// Returns `NoApplicableConfig` if nothing matches.
    pub fn applicable(&self, ctx: &FeeContext) -> Result<FeeConfig, FeeError> {
        let configs = self.db.active_fee_configs();
        FeeResolver::resolve(configs.iter(), ctx, self.db.now()).cloned()
    }

    /// Computes the fee for a request.
    ///
    /// # Errors
    ///
    /// Returns `ConfigNotFound` for an unknown named config,
    /// `NoApplicableConfig` if resolution finds nothing, or `AmountOutOfRange`
    /// if the order amount is too large to price.
    pub fn calculate(&self, request: &CalculateFeeRequest) -> Result<FeeCalculation, FeeError> {
        let config = match request.config_id {
            Some(id) => self.get(id)?,
            None => self.applicable(&request.context)?,
        };
        let calculation = FeeCalculator::compute(&config, request.order_amount)?;
        tracing::debug!(
            config_id = %config.id,
            order_amount = %request.order_amount,
            fee_amount = %calculation.fee_amount,
            "fee calculated"
        );
        Ok(calculation)
    }

    fn sellers(&self) -> HashMap<ShopId, UserId> {
        self.db
            .shops()
            .into_iter()
            .map(|s| (s.id, s.seller_id))
            .collect()
    }
}
