//! Platform fee configuration and resolution.
//!
//! # Modules
//!
//! - `types` - Fee config records, tagged fee kinds, tiers, and validation
//! - `calculator` - Fee math with clamp and whole-unit rounding
//! - `resolver` - Selection of the applicable config for a context
//! - `error` - Fee-specific error types

pub mod calculator;
pub mod error;
pub mod resolver;
pub mod types;

#[cfg(test)]
mod props;

pub use calculator::{FeeCalculation, FeeCalculator};
pub use error::FeeError;
pub use resolver::{FeeContext, FeeResolver, MatchLevel};
pub use types::{FeeConfig, FeeConfigInput, FeeKind, FeeScope, FeeTier, FeeType, TierCharge};
