//! User accounts holding a committed balance.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use souk_shared::types::UserId;

/// Loyalty tier of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserTier {
    /// Default tier.
    #[default]
    Regular,
    /// Silver.
    Silver,
    /// Gold.
    Gold,
    /// VIP.
    Vip,
    /// Platinum.
    Platinum,
}

impl UserTier {
    /// Returns the string representation of the tier.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Regular => "REGULAR",
            Self::Silver => "SILVER",
            Self::Gold => "GOLD",
            Self::Vip => "VIP",
            Self::Platinum => "PLATINUM",
        }
    }

    /// Tiers whose withdrawal fee is waived when the active config allows it.
    #[must_use]
    pub fn is_elevated(&self) -> bool {
        matches!(self, Self::Vip | Self::Platinum)
    }
}

impl fmt::Display for UserTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user and their committed balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    /// User id.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Loyalty tier.
    pub tier: UserTier,
    /// Committed balance; never negative.
    pub balance: Decimal,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last balance change.
    pub updated_at: DateTime<Utc>,
}

impl UserAccount {
    /// Creates an account with a zero balance.
    #[must_use]
    pub fn new(name: impl Into<String>, tier: UserTier, now: DateTime<Utc>) -> Self {
        Self {
            id: UserId::new(),
            name: name.into(),
            tier,
            balance: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        }
    }
}
