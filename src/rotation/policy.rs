use std::time::Duration;

use chrono::{DateTime, Days, NaiveDate, Utc};

use crate::errors::{ExporterError, Result};

const SECONDS_PER_DAY: u64 = 86_400;

/// When to rotate and what expiry to ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationPolicy {
    pub check_interval: Duration,
    /// Rotate once the expiry distance is at or below this many days.
    pub threshold_days: i64,
    /// New expiry requested on rotation, counted from today (UTC).
    pub expiry_offset_days: i64,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_secs(6 * 60 * 60),
            threshold_days: 2,
            expiry_offset_days: 90,
        }
    }
}

impl RotationPolicy {
    pub fn is_due(&self, expiry_distance: i64) -> bool {
        expiry_distance <= self.threshold_days
    }

    pub fn new_expiry(&self, now: DateTime<Utc>) -> NaiveDate {
        let today = now.date_naive();
        today.checked_add_days(Days::new(self.expiry_offset_days.max(0) as u64)).unwrap_or(today)
    }

    /// Reject policies that can let a credential expire between two ticks.
    ///
    /// Distance is floored, so a credential enters the rotation window with
    /// just under `threshold + 1` days left. A check interval at least that
    /// long can step over the whole window.
    pub fn validate(&self) -> Result<()> {
        if self.threshold_days < 0 {
            return Err(ExporterError::validation_field(
                "Rotation threshold cannot be negative",
                "threshold_days",
            ));
        }

        let window = Duration::from_secs((self.threshold_days as u64 + 1) * SECONDS_PER_DAY);
        if self.check_interval.is_zero() || self.check_interval >= window {
            return Err(ExporterError::validation_field(
                format!(
                    "Check interval of {}s must be non-zero and shorter than the {}s rotation window",
                    self.check_interval.as_secs(),
                    window.as_secs()
                ),
                "check_interval_seconds",
            ));
        }

        if self.expiry_offset_days <= self.threshold_days {
            return Err(ExporterError::validation_field(
                format!(
                    "New expiry offset of {} days must exceed the rotation threshold of {} days",
                    self.expiry_offset_days, self.threshold_days
                ),
                "expiry_offset_days",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_default_policy_is_valid() {
        let policy = RotationPolicy::default();
        assert!(policy.validate().is_ok());
        assert_eq!(policy.check_interval, Duration::from_secs(21_600));
    }

    #[test]
    fn test_is_due_at_threshold() {
        let policy = RotationPolicy::default();
        assert!(!policy.is_due(3));
        assert!(policy.is_due(2));
        assert!(policy.is_due(0));
        assert!(policy.is_due(-5));
    }

    #[test]
    fn test_zero_threshold_only_rotates_on_expiry_day() {
        let policy = RotationPolicy { threshold_days: 0, ..Default::default() };
        assert!(!policy.is_due(1));
        assert!(policy.is_due(0));
    }

    #[test]
    fn test_new_expiry_from_today() {
        let policy = RotationPolicy::default();
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 23, 59, 0).unwrap();
        assert_eq!(policy.new_expiry(now), NaiveDate::from_ymd_opt(2026, 5, 30).unwrap());
    }

    #[test]
    fn test_interval_longer_than_window_rejected() {
        let policy = RotationPolicy {
            check_interval: Duration::from_secs(24 * 60 * 60),
            threshold_days: 0,
            ..Default::default()
        };
        assert!(policy.validate().is_err());

        let policy = RotationPolicy { check_interval: Duration::from_secs(23 * 60 * 60), ..policy };
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_offset_must_exceed_threshold() {
        let policy = RotationPolicy { threshold_days: 2, expiry_offset_days: 2, ..Default::default() };
        let err = policy.validate().unwrap_err();
        assert!(err.to_string().contains("expiry offset"));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let policy = RotationPolicy { check_interval: Duration::ZERO, ..Default::default() };
        assert!(policy.validate().is_err());
    }
}
