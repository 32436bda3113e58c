//! Commission audit and seller commission types.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use souk_shared::types::{CategoryId, CommissionChangeId, FeeConfigId, PageMeta, ShopId, UserId};

use crate::fee::{FeeConfig, FeeType};

/// A shop on the marketplace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shop {
    /// Shop id.
    pub id: ShopId,
    /// Display name.
    pub name: String,
    /// Owning seller.
    pub seller_id: UserId,
    /// Categories the shop sells in.
    pub category_ids: BTreeSet<CategoryId>,
    /// Inactive shops are hidden from listings by default.
    pub is_active: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl Shop {
    /// Creates an active shop.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        seller_id: UserId,
        category_ids: impl IntoIterator<Item = CategoryId>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ShopId::new(),
            name: name.into(),
            seller_id,
            category_ids: category_ids.into_iter().collect(),
            is_active: true,
            created_at: now,
        }
    }
}

/// Who changed a commission and why.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeContext {
    /// Acting admin.
    pub changed_by: UserId,
    /// Short reason.
    #[serde(default)]
    pub reason: Option<String>,
    /// Free-text note.
    #[serde(default)]
    pub note: Option<String>,
}

/// Immutable audit row: one shop's effective commission changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionChange {
    /// Row id.
    pub id: CommissionChangeId,
    /// Affected shop.
    pub shop_id: ShopId,
    /// Seller owning the shop; `None` if the shop record is missing.
    pub seller_id: Option<UserId>,
    /// Config whose change caused the row.
    pub config_id: FeeConfigId,
    /// Acting admin.
    pub changed_by: UserId,
    /// Rate before the change, in percent.
    pub previous_rate: Decimal,
    /// Rate after the change, in percent.
    pub new_rate: Decimal,
    /// Kind of the config after the change.
    pub fee_type: FeeType,
    /// Short reason.
    pub reason: Option<String>,
    /// Free-text note.
    pub note: Option<String>,
    /// When the change took effect.
    pub applied_at: DateTime<Utc>,
}

/// Request to change the platform-wide default commission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalCommissionUpdate {
    /// New rate in percent.
    pub percentage_rate: Decimal,
    /// Short reason.
    #[serde(default)]
    pub reason: Option<String>,
    /// Free-text note.
    #[serde(default)]
    pub note: Option<String>,
    /// Also force every shop-specific config to the new rate.
    #[serde(default)]
    pub override_shop_configs: bool,
}

/// A shop-specific config forced to the global rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverriddenConfig {
    /// Config id.
    pub config_id: FeeConfigId,
    /// Shops listed on the config.
    pub shop_ids: Vec<ShopId>,
    /// Rate before the override.
    pub previous_rate: Decimal,
}

/// Outcome of a global commission update.
///
/// `overridden_count < matched_count` reports a partial bulk failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalCommissionResult {
    /// Default rate before the update.
    pub previous_rate: Decimal,
    /// Default rate after the update.
    pub new_rate: Decimal,
    /// The default config after the update.
    pub config: FeeConfig,
    /// Shop-specific configs selected for override.
    pub matched_count: usize,
    /// Shop-specific configs actually overridden.
    pub overridden_count: usize,
    /// Details of each overridden config.
    pub overridden_configs: Vec<OverriddenConfig>,
}

/// Request to set one shop's commission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerCommissionUpdate {
    /// New rate in percent.
    pub percentage_rate: Decimal,
    /// Short reason.
    #[serde(default)]
    pub reason: Option<String>,
    /// Free-text note.
    #[serde(default)]
    pub note: Option<String>,
}

/// Outcome of a seller commission update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerCommissionResult {
    /// The shop-specific config after the update.
    pub config: FeeConfig,
    /// Audit row for the shop.
    pub change: CommissionChange,
}

/// Listing parameters for seller commissions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerCommissionQuery {
    /// Case-insensitive substring of the shop name.
    #[serde(default)]
    pub search: Option<String>,
    /// Include inactive shops.
    #[serde(default)]
    pub include_inactive: bool,
}

/// One shop's effective commission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerCommission {
    /// Shop id.
    pub shop_id: ShopId,
    /// Shop name.
    pub shop_name: String,
    /// Owning seller.
    pub seller_id: UserId,
    /// Shop status.
    pub is_active: bool,
    /// Effective rate in percent.
    pub commission_rate: Decimal,
    /// True if a shop-specific config applies.
    pub has_custom_commission: bool,
    /// Config that produced the rate, if any.
    pub config_id: Option<FeeConfigId>,
}

/// Aggregate figures over a seller commission listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionSummary {
    /// Mean effective rate over every listed shop, two decimals.
    pub average_rate: Decimal,
    /// Shops with a shop-specific config.
    pub custom_commission_count: usize,
    /// Rate of the general default config.
    pub default_rate: Decimal,
}

/// A page of seller commissions with its summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerCommissionPage {
    /// Rows on this page.
    pub data: Vec<SellerCommission>,
    /// Pagination metadata.
    pub meta: PageMeta,
    /// Summary over every matching shop, not just this page.
    pub summary: CommissionSummary,
}
