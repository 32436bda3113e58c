//! Commission repository: global and per-seller rate changes, listings, and
//! the append-only audit log.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use souk_core::commission::{
    ChangeContext, CommissionChange, CommissionError, CommissionService, GlobalCommissionResult,
    GlobalCommissionUpdate, OverriddenConfig, SellerCommissionPage, SellerCommissionQuery,
    SellerCommissionResult, SellerCommissionUpdate, Shop,
};
use souk_core::fee::{FeeConfig, FeeConfigInput, FeeError, FeeType};
use souk_shared::types::{
    CategoryId, CommissionChangeId, FeeConfigId, PageRequest, PageResponse, ShopId, UserId,
};

use crate::store::Database;

/// Name given to the default config when none exists yet.
pub const DEFAULT_COMMISSION_NAME: &str = "Platform commission";

/// Fields of a manually recorded audit row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordChangeInput {
    /// Affected shop.
    pub shop_id: ShopId,
    /// Seller owning the shop.
    pub seller_id: Option<UserId>,
    /// Config that changed.
    pub config_id: FeeConfigId,
    /// Rate before the change.
    pub previous_rate: Decimal,
    /// Rate after the change.
    pub new_rate: Decimal,
    /// Kind of the config after the change.
    pub fee_type: FeeType,
    /// Who and why.
    #[serde(flatten)]
    pub context: ChangeContext,
}

/// Commission repository.
#[derive(Debug, Clone)]
pub struct CommissionRepository {
    db: Database,
}

impl CommissionRepository {
    /// Creates a new commission repository.
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    // ========== Shops ==========

    /// Registers an active shop.
    pub fn create_shop(
        &self,
        name: impl Into<String>,
        seller_id: UserId,
        category_ids: impl IntoIterator<Item = CategoryId>,
    ) -> Shop {
        let shop = Shop::new(name, seller_id, category_ids, self.db.now());
        self.db.put_shop(shop.clone());
        tracing::info!(shop_id = %shop.id, name = %shop.name, "shop created");
        shop
    }

    /// Fetches a shop.
    ///
    /// # Errors
    ///
    /// Returns `ShopNotFound` if no shop has this id.
    pub fn get_shop(&self, shop_id: ShopId) -> Result<Shop, CommissionError> {
        self.db
            .shop(shop_id)
            .ok_or(CommissionError::ShopNotFound(shop_id))
    }

    // ========== Audit log ==========

    /// Appends one audit row stamped with the current time.
    pub fn record_change(&self, input: RecordChangeInput) -> CommissionChange {
        let change = CommissionChange {
            id: CommissionChangeId::new(),
            shop_id: input.shop_id,
            seller_id: input.seller_id,
            config_id: input.config_id,
            changed_by: input.context.changed_by,
            previous_rate: input.previous_rate,
            new_rate: input.new_rate,
            fee_type: input.fee_type,
            reason: input.context.reason,
            note: input.context.note,
            applied_at: self.db.now(),
        };
        self.db.append_commission_changes([change.clone()]);
        change
    }

    /// A shop's audit rows, newest first.
    #[must_use]
    pub fn history(&self, shop_id: ShopId) -> Vec<CommissionChange> {
        let mut rows = self.db.commission_changes(shop_id);
        rows.reverse();
        rows
    }

    // ========== Rate changes ==========

    /// Sets the platform default commission.
    ///
    /// Updates the general config in force, or creates one if none exists
    /// (the previous rate is then zero). With `override_shop_configs`, every
    /// active shop-specific config is forced to the same rate one document at
    /// a time; each success writes one audit row per listed shop. Configs
    /// that fail are skipped, logged, and show up as
    /// `overridden_count < matched_count`.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a rate outside `0..=100` or if the
    /// default config cannot be updated. Shop overrides never fail the call.
    pub fn update_global(
        &self,
        update: GlobalCommissionUpdate,
        changed_by: UserId,
    ) -> Result<GlobalCommissionResult, CommissionError> {
        let rate = update.percentage_rate;
        CommissionService::validate_rate(rate)?;
        let now = self.db.now();
        let ctx = ChangeContext {
            changed_by,
            reason: update.reason,
            note: update.note,
        };
        let configs = self.db.fee_configs();

        let default_id = CommissionService::default_config(&configs, now).map(|c| c.id);
        let (previous_rate, config) = match default_id {
            Some(id) => self
                .db
                .modify_fee_config(id, |c| CommissionService::set_rate(c, rate, changed_by, now))?
                .ok_or(FeeError::ConfigNotFound(id))?,
            None => {
                let input = FeeConfigInput::global_percentage(DEFAULT_COMMISSION_NAME, rate, now);
                let config = FeeConfig::create(input, changed_by, now)?;
                self.db.put_fee_config(config.clone());
                (Decimal::ZERO, config)
            }
        };
        tracing::info!(config_id = %config.id, %previous_rate, new_rate = %rate, "global commission updated");

        let mut matched_count = 0;
        let mut overridden_configs = Vec::new();
        if update.override_shop_configs {
            let targets: Vec<FeeConfigId> = configs
                .iter()
                .filter(|c| c.is_active && c.is_shop_specific())
                .map(|c| c.id)
                .collect();
            matched_count = targets.len();
            let sellers = self.sellers();

            for id in targets {
                match self
                    .db
                    .modify_fee_config(id, |c| CommissionService::set_rate(c, rate, changed_by, now))
                {
                    Ok(Some((previous, updated))) => {
                        let rows =
                            CommissionService::changes_for(&updated, previous, &ctx, &sellers, now);
                        self.db.append_commission_changes(rows);
                        overridden_configs.push(OverriddenConfig {
                            config_id: id,
                            shop_ids: updated.applicable_shops.iter().copied().collect(),
                            previous_rate: previous,
                        });
                    }
                    Ok(None) => {
                        tracing::warn!(config_id = %id, "shop config vanished during override");
                    }
                    Err(err) => {
                        tracing::warn!(config_id = %id, error = %err, "shop config override failed");
                    }
                }
            }

            let overridden_count = overridden_configs.len();
            tracing::info!(
                matched = matched_count,
                overridden = overridden_count,
                "shop commission override applied"
            );
            if overridden_count < matched_count {
                tracing::warn!(
                    failed = matched_count - overridden_count,
                    "shop commission override partially failed"
                );
            }
        }

        Ok(GlobalCommissionResult {
            previous_rate,
            new_rate: rate,
            config,
            matched_count,
            overridden_count: overridden_configs.len(),
            overridden_configs,
        })
    }

    /// Sets one shop's commission.
    ///
    /// Updates the shop's own config if it has one in force. A config that
    /// also lists other shops is left at its rate: the shop is removed from
    /// it and moved to a new config of its own at the same priority. With no
    /// config in force a shop-scoped config is created, recording the shop's
    /// previous effective rate. Only this shop gets an audit row.
    ///
    /// # Errors
    ///
    /// Returns `ShopNotFound` or a validation error.
    pub fn update_seller_commission(
        &self,
        shop_id: ShopId,
        update: SellerCommissionUpdate,
        changed_by: UserId,
    ) -> Result<SellerCommissionResult, CommissionError> {
        let rate = update.percentage_rate;
        CommissionService::validate_rate(rate)?;
        let shop = self.get_shop(shop_id)?;
        let now = self.db.now();
        let ctx = ChangeContext {
            changed_by,
            reason: update.reason,
            note: update.note,
        };
        let configs = self.db.fee_configs();

        let (previous_rate, config) = match CommissionService::shop_config(&configs, shop_id, now) {
            Some(own) if own.applicable_shops.len() == 1 => {
                let id = own.id;
                self.db
                    .modify_fee_config(id, |c| CommissionService::set_rate(c, rate, changed_by, now))?
                    .ok_or(FeeError::ConfigNotFound(id))?
            }
            Some(shared) => {
                let mut input = CommissionService::custom_config_input(&shop, rate, now);
                input.priority = shared.priority;
                let config = FeeConfig::create(input, changed_by, now)?;
                let id = shared.id;
                self.db
                    .modify_fee_config(id, |c| {
                        CommissionService::detach_shop(c, shop_id, changed_by, now)
                    })?
                    .ok_or(FeeError::ConfigNotFound(id))?;
                self.db.put_fee_config(config.clone());
                tracing::info!(
                    shop_id = %shop_id,
                    shared_config_id = %id,
                    config_id = %config.id,
                    "shop moved off shared commission config"
                );
                (shared.kind.headline_rate(), config)
            }
            None => {
                let previous =
                    CommissionService::effective_commission(&shop, &configs, now).commission_rate;
                let input = CommissionService::custom_config_input(&shop, rate, now);
                let config = FeeConfig::create(input, changed_by, now)?;
                self.db.put_fee_config(config.clone());
                (previous, config)
            }
        };

        let rows = CommissionService::changes_for(&config, previous_rate, &ctx, &self.sellers(), now);
        let change = rows
            .iter()
            .find(|r| r.shop_id == shop_id)
            .cloned()
            .unwrap_or_else(|| {
                CommissionService::change(&config, shop_id, Some(shop.seller_id), previous_rate, &ctx, now)
            });
        self.db.append_commission_changes(rows);

        tracing::info!(
            shop_id = %shop_id,
            config_id = %config.id,
            %previous_rate,
            new_rate = %rate,
            "seller commission updated"
        );
        Ok(SellerCommissionResult { config, change })
    }

    // ========== Listings ==========

    /// Effective commission of every matching shop, ordered by name, with a
    /// summary over all matches.
    #[must_use]
    pub fn list_seller_commissions(
        &self,
        query: &SellerCommissionQuery,
        page: PageRequest,
    ) -> SellerCommissionPage {
        let now = self.db.now();
        let configs = self.db.active_fee_configs();

        let mut shops: Vec<Shop> = self
            .db
            .shops()
            .into_iter()
            .filter(|s| query.include_inactive || s.is_active)
            .filter(|s| CommissionService::matches_search(s, query.search.as_deref()))
            .collect();
        shops.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

        let rows: Vec<_> = shops
            .iter()
            .map(|s| CommissionService::effective_commission(s, &configs, now))
            .collect();
        let default_rate = CommissionService::default_config(configs.iter(), now)
            .map_or(Decimal::ZERO, |c| c.kind.headline_rate());
        let summary = CommissionService::summarize(&rows, default_rate);
        let PageResponse { data, meta } = PageResponse::from_items(&rows, page);

        SellerCommissionPage {
            data,
            meta,
            summary,
        }
    }

    fn sellers(&self) -> HashMap<ShopId, UserId> {
        self.db
            .shops()
            .into_iter()
            .map(|s| (s.id, s.seller_id))
            .collect()
    }
}
