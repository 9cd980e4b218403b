//! Sonatype Nexus Repository license.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use super::{
    days_until, get_json, label_value, BasicAuthEndpoint, LicenseError, LicenseSnapshot,
    LicenseSource, Platform, Result,
};
use crate::http::{build_http_client, join_url, HttpClientConfig};

const LICENSE_PATH: &str = "/service/rest/v1/system/license";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NexusLicense {
    #[serde(default, deserialize_with = "label_value")]
    pub contact_email: String,
    #[serde(default, deserialize_with = "label_value")]
    pub contact_company: String,
    #[serde(default, deserialize_with = "label_value")]
    pub contact_name: String,
    #[serde(default, deserialize_with = "label_value")]
    pub effective_date: String,
    pub expiration_date: String,
    #[serde(default, deserialize_with = "label_value")]
    pub license_type: String,
    #[serde(default, deserialize_with = "label_value")]
    pub licensed_users: String,
    #[serde(default, deserialize_with = "label_value")]
    pub features: String,
}

pub struct NexusLicenseSource {
    http: Client,
    endpoint: BasicAuthEndpoint,
}

impl NexusLicenseSource {
    pub fn new(endpoint: BasicAuthEndpoint, http: &HttpClientConfig) -> Result<Self> {
        let http = build_http_client(http)
            .map_err(|source| LicenseError::Client { platform: Platform::Nexus, source })?;
        Ok(Self { http, endpoint })
    }
}

#[async_trait]
impl LicenseSource for NexusLicenseSource {
    fn platform(&self) -> Platform {
        Platform::Nexus
    }

    async fn fetch(&self) -> Result<LicenseSnapshot> {
        let url = join_url(&self.endpoint.url, LICENSE_PATH);
        let license: NexusLicense = get_json(&self.http, Platform::Nexus, &url, &self.endpoint).await?;
        snapshot(&license, Utc::now())
    }
}

/// Flatten a Nexus license. `expirationDate` must be RFC 3339.
pub fn snapshot(license: &NexusLicense, now: DateTime<Utc>) -> Result<LicenseSnapshot> {
    let expires = DateTime::parse_from_rfc3339(&license.expiration_date).map_err(|e| {
        LicenseError::decode(
            Platform::Nexus,
            format!("expirationDate '{}' is not RFC 3339: {}", license.expiration_date, e),
        )
    })?;

    let labels = vec![
        ("contact_email", license.contact_email.clone()),
        ("contact_company", license.contact_company.clone()),
        ("contact_name", license.contact_name.clone()),
        ("effective_date", license.effective_date.clone()),
        ("expiration_date", license.expiration_date.clone()),
        ("license_type", license.license_type.clone()),
        ("licensed_users", license.licensed_users.clone()),
        ("features", license.features.clone()),
    ];

    Ok(LicenseSnapshot {
        platform: Platform::Nexus,
        labels,
        days_until_expiry: days_until(expires.with_timezone(&Utc), now),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_snapshot_from_payload() {
        let license: NexusLicense = serde_json::from_value(json!({
            "contactEmail": "ops@example.com",
            "contactCompany": "Example",
            "contactName": "Ops",
            "effectiveDate": "2025-06-01T00:00:00.000+0000",
            "expirationDate": "2026-06-01T00:00:00Z",
            "licenseType": "PRODUCTION",
            "licensedUsers": 250,
            "features": ["NexusProfessional", "Firewall"]
        }))
        .unwrap();

        let now = Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap();
        let snap = snapshot(&license, now).unwrap();
        assert_eq!(snap.days_until_expiry, 31);
        assert_eq!(snap.label("licensed_users"), Some("250"));
        assert_eq!(snap.label("features"), Some("NexusProfessional, Firewall"));
    }

    #[test]
    fn test_snapshot_rejects_bad_expiration() {
        let license: NexusLicense =
            serde_json::from_value(json!({"expirationDate": "June 2026"})).unwrap();
        let err = snapshot(&license, Utc::now()).unwrap_err();
        assert!(matches!(err, LicenseError::Decode { platform: Platform::Nexus, .. }));
    }

    #[test]
    fn test_expired_license_is_negative() {
        let license: NexusLicense =
            serde_json::from_value(json!({"expirationDate": "2026-04-01T00:00:00Z"})).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap();
        assert_eq!(snapshot(&license, now).unwrap().days_until_expiry, -30);
    }
}
