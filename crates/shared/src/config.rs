//! Application configuration management.

use std::time::Duration;

use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::AppError;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Withdrawal policy.
    #[serde(default)]
    pub withdrawal: WithdrawalConfig,
    /// Fee configuration cache.
    #[serde(default)]
    pub fee_cache: FeeCacheConfig,
    /// Storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Logging configuration.
    #[serde(default)]
    pub log: LogConfig,
}

/// Withdrawal policy configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WithdrawalConfig {
    /// Smallest amount a user may withdraw.
    #[serde(default = "default_min_amount")]
    pub min_amount: i64,
    /// Largest amount a user may withdraw.
    #[serde(default = "default_max_amount")]
    pub max_amount: i64,
    /// Requests allowed per user per local calendar day.
    #[serde(default = "default_daily_limit")]
    pub daily_limit: u32,
    /// Requests allowed to be pending or processing at once.
    #[serde(default = "default_max_pending")]
    pub max_pending: u32,
    /// Floor the available balance may not drop below after a withdrawal.
    #[serde(default)]
    pub minimum_balance_after: i64,
    /// Create withdrawals directly in the terminal `success` state.
    #[serde(default = "default_true")]
    pub auto_approve: bool,
    /// Reject withdrawals when no withdrawal fee config is active.
    #[serde(default)]
    pub fee_fail_closed: bool,
    /// IANA timezone defining the local day for the daily cap.
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_min_amount() -> i64 {
    1_000
}

fn default_max_amount() -> i64 {
    50_000_000
}

fn default_daily_limit() -> u32 {
    5
}

fn default_max_pending() -> u32 {
    3
}

fn default_true() -> bool {
    true
}

fn default_timezone() -> String {
    "Asia/Ho_Chi_Minh".to_string()
}

impl Default for WithdrawalConfig {
    fn default() -> Self {
        Self {
            min_amount: default_min_amount(),
            max_amount: default_max_amount(),
            daily_limit: default_daily_limit(),
            max_pending: default_max_pending(),
            minimum_balance_after: 0,
            auto_approve: true,
            fee_fail_closed: false,
            timezone: default_timezone(),
        }
    }
}

impl WithdrawalConfig {
    /// Parses the configured timezone.
    pub fn tz(&self) -> Result<Tz, AppError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| AppError::Config(format!("invalid timezone {}: {e}", self.timezone)))
    }

    /// Minimum withdrawal amount as a decimal.
    #[must_use]
    pub fn min_amount(&self) -> Decimal {
        Decimal::from(self.min_amount)
    }

    /// Maximum withdrawal amount as a decimal.
    #[must_use]
    pub fn max_amount(&self) -> Decimal {
        Decimal::from(self.max_amount)
    }

    /// Minimum balance after withdrawal as a decimal.
    #[must_use]
    pub fn minimum_balance_after(&self) -> Decimal {
        Decimal::from(self.minimum_balance_after)
    }
}

/// Fee configuration cache settings.
#[derive(Debug, Clone, Deserialize)]
pub struct FeeCacheConfig {
    /// Time-to-live for cached candidate lists, in seconds.
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
    /// Maximum number of cached entries.
    #[serde(default = "default_cache_capacity")]
    pub max_capacity: u64,
}

/// Effective-window granularity; a cached config list may never outlive it.
pub const MAX_FEE_CACHE_TTL_SECS: u64 = 60;

fn default_cache_ttl() -> u64 {
    MAX_FEE_CACHE_TTL_SECS
}

fn default_cache_capacity() -> u64 {
    64
}

impl Default for FeeCacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl(),
            max_capacity: default_cache_capacity(),
        }
    }
}

impl FeeCacheConfig {
    /// TTL, capped at one minute.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs.min(MAX_FEE_CACHE_TTL_SECS))
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Deadline for a single storage call, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Optional JSON snapshot file used to persist the document store.
    #[serde(default)]
    pub snapshot_path: Option<String>,
}

fn default_timeout_ms() -> u64 {
    5_000
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            snapshot_path: None,
        }
    }
}

impl StorageConfig {
    /// Storage call deadline.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

fn default_log_filter() -> String {
    "souk=debug".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded or is inconsistent.
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("SOUK").separator("__"))
            .build()?;

        let app: Self = config.try_deserialize()?;
        app.validate()?;
        Ok(app)
    }

    /// Checks cross-field invariants.
    pub fn validate(&self) -> Result<(), AppError> {
        let w = &self.withdrawal;
        if w.min_amount <= 0 || w.min_amount > w.max_amount {
            return Err(AppError::Config(format!(
                "withdrawal bounds must satisfy 0 < min <= max, got [{}, {}]",
                w.min_amount, w.max_amount
            )));
        }
        if w.minimum_balance_after < 0 {
            return Err(AppError::Config(
                "withdrawal.minimum_balance_after cannot be negative".to_string(),
            ));
        }
        w.tz()?;
        Ok(())
    }
}
