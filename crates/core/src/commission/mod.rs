//! Seller commissions and the commission audit log.
//!
//! - `types` - Shops, audit rows, update requests and listings
//! - `service` - Effective rates, summaries, and audit row construction
//! - `error` - Commission-specific error types

pub mod error;
pub mod service;
pub mod types;

pub use error::CommissionError;
pub use service::CommissionService;
pub use types::{
    ChangeContext, CommissionChange, CommissionSummary, GlobalCommissionResult,
    GlobalCommissionUpdate, OverriddenConfig, SellerCommission, SellerCommissionPage,
    SellerCommissionQuery, SellerCommissionResult, SellerCommissionUpdate, Shop,
};
