//! Withdrawal limits: amount bounds, balance floor, and request rate caps.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use souk_shared::AppError;
use souk_shared::config::WithdrawalConfig;
use souk_shared::types::money::{format_amount, is_whole};

use super::error::WithdrawalError;

/// The local calendar day containing an instant, as a UTC half-open range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    /// Local midnight starting the day.
    pub start: DateTime<Utc>,
    /// Next local midnight; when the daily cap resets.
    pub reset_at: DateTime<Utc>,
}

impl DayWindow {
    /// Window of the local day in `tz` containing `now`.
    #[must_use]
    pub fn containing(now: DateTime<Utc>, tz: Tz) -> Self {
        let today = now.with_timezone(&tz).date_naive();
        let tomorrow = today.succ_opt().unwrap_or(today);
        Self {
            start: local_midnight(tz, today),
            reset_at: local_midnight(tz, tomorrow),
        }
    }

    /// True if `instant` falls inside the day.
    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.reset_at
    }
}

/// First instant of `date` in `tz`. Zones that skip midnight start the day
/// at the first existing local time.
fn local_midnight(tz: Tz, date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    (0..=2)
        .find_map(|h| {
            tz.from_local_datetime(&(midnight + Duration::hours(h)))
                .earliest()
        })
        .map_or_else(|| midnight.and_utc(), |dt| dt.with_timezone(&Utc))
}

/// Per-user request caps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// Requests allowed per local day.
    pub daily_limit: u32,
    /// Requests allowed in flight at once.
    pub max_pending: u32,
    /// Zone defining the local day.
    pub timezone: Tz,
}

impl RateLimitPolicy {
    /// The local day containing `now`.
    #[must_use]
    pub fn day_window(&self, now: DateTime<Utc>) -> DayWindow {
        DayWindow::containing(now, self.timezone)
    }

    /// Rejects the request if either cap is already reached.
    pub fn check(
        &self,
        now: DateTime<Utc>,
        today_count: u32,
        pending_count: u32,
    ) -> Result<(), WithdrawalError> {
        if today_count >= self.daily_limit {
            return Err(WithdrawalError::DailyLimitExceeded {
                limit: self.daily_limit,
                count: today_count,
                reset_at: self.day_window(now).reset_at,
            });
        }
        if pending_count >= self.max_pending {
            return Err(WithdrawalError::TooManyPendingWithdrawals {
                limit: self.max_pending,
                count: pending_count,
            });
        }
        Ok(())
    }
}

/// Everything that decides whether a withdrawal may proceed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawalPolicy {
    /// Smallest allowed amount.
    pub min_amount: Decimal,
    /// Largest allowed amount.
    pub max_amount: Decimal,
    /// Floor the available balance may not drop below.
    pub minimum_balance_after: Decimal,
    /// Create withdrawals as `success` and debit immediately.
    pub auto_approve: bool,
    /// Reject when no withdrawal fee config is active.
    pub fee_fail_closed: bool,
    /// Request caps.
    pub rate_limit: RateLimitPolicy,
}

impl Default for WithdrawalPolicy {
    fn default() -> Self {
        Self {
            min_amount: Decimal::from(1_000),
            max_amount: Decimal::from(50_000_000),
            minimum_balance_after: Decimal::ZERO,
            auto_approve: true,
            fee_fail_closed: false,
            rate_limit: RateLimitPolicy {
                daily_limit: 5,
                max_pending: 3,
                timezone: chrono_tz::Asia::Ho_Chi_Minh,
            },
        }
    }
}

impl WithdrawalPolicy {
    /// Builds the policy from configuration.
    ///
    /// # Errors
    ///
    /// Returns a config error if the timezone is not a valid IANA name.
    pub fn from_config(config: &WithdrawalConfig) -> Result<Self, AppError> {
        Ok(Self {
            min_amount: config.min_amount(),
            max_amount: config.max_amount(),
            minimum_balance_after: config.minimum_balance_after(),
            auto_approve: config.auto_approve,
            fee_fail_closed: config.fee_fail_closed,
            rate_limit: RateLimitPolicy {
                daily_limit: config.daily_limit,
                max_pending: config.max_pending,
                timezone: config.tz()?,
            },
        })
    }

    /// Checks the amount is a whole number within bounds.
    pub fn validate_amount(&self, amount: Decimal) -> Result<(), WithdrawalError> {
        if !is_whole(amount) {
            return Err(WithdrawalError::Validation(
                "amount must be a whole number".to_string(),
            ));
        }
        if amount < self.min_amount || amount > self.max_amount {
            return Err(WithdrawalError::Validation(format!(
                "amount must be between {} and {}",
                format_amount(self.min_amount),
                format_amount(self.max_amount)
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn policy() -> WithdrawalPolicy {
        WithdrawalPolicy::default()
    }

    #[rstest]
    #[case(dec!(999), false)]
    #[case(dec!(1000), true)]
    #[case(dec!(50000000), true)]
    #[case(dec!(50000001), false)]
    #[case(dec!(1500.5), false)]
    #[case(dec!(-1000), false)]
    fn test_amount_bounds(#[case] amount: Decimal, #[case] ok: bool) {
        assert_eq!(policy().validate_amount(amount).is_ok(), ok);
    }

    #[test]
    fn test_day_window_follows_local_midnight() {
        // 16:59:59 UTC is 23:59:59 in Ho Chi Minh City (UTC+7).
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 16, 59, 59).unwrap();
        let window = policy().rate_limit.day_window(now);
        assert_eq!(window.start, Utc.with_ymd_and_hms(2026, 3, 9, 17, 0, 0).unwrap());
        assert_eq!(window.reset_at, Utc.with_ymd_and_hms(2026, 3, 10, 17, 0, 0).unwrap());
        assert!(window.contains(now));
        assert!(!window.contains(window.reset_at));
    }

    #[test]
    fn test_day_window_across_dst_change() {
        let tz: Tz = "America/New_York".parse().unwrap();
        // DST starts 2026-03-08; that local day is 23 hours long.
        let now = Utc.with_ymd_and_hms(2026, 3, 8, 15, 0, 0).unwrap();
        let window = DayWindow::containing(now, tz);
        assert_eq!(window.reset_at - window.start, Duration::hours(23));
    }

    #[test]
    fn test_daily_cap() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 5, 0, 0).unwrap();
        let limits = policy().rate_limit;
        assert!(limits.check(now, 4, 0).is_ok());
        match limits.check(now, 5, 0) {
            Err(WithdrawalError::DailyLimitExceeded {
                limit,
                count,
                reset_at,
            }) => {
                assert_eq!(limit, 5);
                assert_eq!(count, 5);
                assert_eq!(reset_at, Utc.with_ymd_and_hms(2026, 3, 10, 17, 0, 0).unwrap());
            }
            other => panic!("expected DailyLimitExceeded, got {other:?}"),
        }
    }

    #[test]
    fn test_pending_cap() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 5, 0, 0).unwrap();
        assert!(matches!(
            policy().rate_limit.check(now, 0, 3),
            Err(WithdrawalError::TooManyPendingWithdrawals { limit: 3, count: 3 })
        ));
    }

    #[test]
    fn test_from_config() {
        let mut config = WithdrawalConfig::default();
        config.daily_limit = 2;
        config.timezone = "UTC".to_string();
        let policy = WithdrawalPolicy::from_config(&config).unwrap();
        assert_eq!(policy.rate_limit.daily_limit, 2);
        assert_eq!(policy.rate_limit.timezone, chrono_tz::UTC);
        assert_eq!(policy.min_amount, dec!(1000));
    }
}
