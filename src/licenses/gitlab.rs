//! GitLab instance license, read with the rotating token.

use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, Utc};

use super::{days_until, LicenseSnapshot, LicenseSource, Platform, Result};
use crate::gitlab::{GitLabClient, GitLabLicense};

#[async_trait]
impl LicenseSource for GitLabClient {
    fn platform(&self) -> Platform {
        Platform::GitLab
    }

    async fn fetch(&self) -> Result<LicenseSnapshot> {
        let license = self.license().await?;
        Ok(snapshot(&license, Utc::now()))
    }
}

/// Flatten a GitLab license. Days until expiry bottom out at 0 because GitLab
/// reports expiry separately through `expired`.
pub fn snapshot(license: &GitLabLicense, now: DateTime<Utc>) -> LicenseSnapshot {
    let days_until_expiry = license
        .expires_at
        .map(|date| days_until(date.and_time(NaiveTime::MIN).and_utc(), now).max(0))
        .unwrap_or(0);
    let remaining_users = license.user_limit - license.active_users;

    let labels = vec![
        ("plan", license.plan.clone()),
        ("created_at", license.created_at.clone().unwrap_or_default()),
        ("starts_at", license.starts_at.clone().unwrap_or_default()),
        ("expires_at", license.expires_at.map(|d| d.to_string()).unwrap_or_default()),
        ("historical_max", license.historical_max.to_string()),
        ("maximum_user_count", license.maximum_user_count.to_string()),
        ("licensee_name", license.licensee.name.clone()),
        ("licensee_email", license.licensee.email.clone()),
        ("licensee_company", license.licensee.company.clone()),
        ("add_ons", license.add_ons.to_string()),
        ("expired", license.expired.to_string()),
        ("overage", license.overage.to_string()),
        ("user_limit", license.user_limit.to_string()),
        ("active_users", license.active_users.to_string()),
        ("days_until_expiry", days_until_expiry.to_string()),
        ("remaining_users", remaining_users.to_string()),
    ];

    LicenseSnapshot { platform: Platform::GitLab, labels, days_until_expiry }
}
