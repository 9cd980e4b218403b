//! SonarQube commercial edition license.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use super::{
    days_until, get_json, BasicAuthEndpoint, LicenseError, LicenseSnapshot, LicenseSource,
    Platform, Result,
};
use crate::http::{build_http_client, join_url, HttpClientConfig};

const LICENSE_PATH: &str = "/api/editions/show_license";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SonarLicense {
    /// Plain `YYYY-MM-DD`, no time of day.
    pub expires_at: Option<NaiveDate>,
    pub is_expired: bool,
    pub edition: String,
    pub is_valid_edition: bool,
    pub max_loc: i64,
    pub loc: i64,
    pub is_official_distribution: bool,
    pub is_supported: bool,
    pub remaining_loc_threshold: i64,
}

pub struct SonarLicenseSource {
    http: Client,
    endpoint: BasicAuthEndpoint,
}

impl SonarLicenseSource {
    pub fn new(endpoint: BasicAuthEndpoint, http: &HttpClientConfig) -> Result<Self> {
        let http = build_http_client(http)
            .map_err(|source| LicenseError::Client { platform: Platform::Sonar, source })?;
        Ok(Self { http, endpoint })
    }
}

#[async_trait]
impl LicenseSource for SonarLicenseSource {
    fn platform(&self) -> Platform {
        Platform::Sonar
    }

    async fn fetch(&self) -> Result<LicenseSnapshot> {
        let url = join_url(&self.endpoint.url, LICENSE_PATH);
        let license: SonarLicense = get_json(&self.http, Platform::Sonar, &url, &self.endpoint).await?;
        Ok(snapshot(&license, Utc::now()))
    }
}

/// Flatten a Sonar license. A license without an expiry reports 0 days.
pub fn snapshot(license: &SonarLicense, now: DateTime<Utc>) -> LicenseSnapshot {
    let days_until_expiry = license
        .expires_at
        .map(|date| days_until(date.and_time(NaiveTime::MIN).and_utc(), now))
        .unwrap_or(0);

    let labels = vec![
        ("expires_at", license.expires_at.map(|d| d.to_string()).unwrap_or_default()),
        ("is_expired", license.is_expired.to_string()),
        ("edition", license.edition.clone()),
        ("is_valid_edition", license.is_valid_edition.to_string()),
        ("max_loc", license.max_loc.to_string()),
        ("loc", license.loc.to_string()),
        ("is_official_distribution", license.is_official_distribution.to_string()),
        ("is_supported", license.is_supported.to_string()),
        ("remaining_loc_threshold", license.remaining_loc_threshold.to_string()),
    ];

    LicenseSnapshot { platform: Platform::Sonar, labels, days_until_expiry }
}
