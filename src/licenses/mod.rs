//! License sources and the per-tick publisher.
//!
//! Each platform's license endpoint is wrapped in a [`LicenseSource`] that
//! returns a normalized [`LicenseSnapshot`]. The [`LicensePublisher`] fans out
//! one task per source every tick and records the snapshots into the injected
//! metrics registry.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;

use crate::secrets::SecretString;

pub mod error;
pub mod gitlab;
pub mod nexus;
pub mod publisher;
pub mod sonar;

pub use error::{LicenseError, Result};
pub use nexus::NexusLicenseSource;
pub use publisher::LicensePublisher;
pub use sonar::SonarLicenseSource;

/// Platforms whose licenses are exported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    GitLab,
    Nexus,
    Sonar,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::GitLab => "gitlab",
            Platform::Nexus => "nexus",
            Platform::Sonar => "sonar",
        }
    }

    /// Name of the labelled info gauge, always set to 1.
    pub fn info_metric(&self) -> &'static str {
        match self {
            Platform::GitLab => "gitlab_license",
            Platform::Nexus => "nexus_license_info",
            Platform::Sonar => "sonar_license_info",
        }
    }

    pub fn days_until_expiry_metric(&self) -> &'static str {
        match self {
            Platform::GitLab => "gitlab_license_days_until_expiry",
            Platform::Nexus => "nexus_license_days_until_expiry",
            Platform::Sonar => "sonar_license_days_until_expiry",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One platform's license, flattened into metric labels.
#[derive(Debug, Clone, PartialEq)]
pub struct LicenseSnapshot {
    pub platform: Platform,
    pub labels: Vec<(&'static str, String)>,
    pub days_until_expiry: i64,
}

impl LicenseSnapshot {
    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels.iter().find(|(key, _)| *key == name).map(|(_, value)| value.as_str())
    }
}

/// Something that can report a platform's current license.
#[async_trait]
pub trait LicenseSource: Send + Sync {
    fn platform(&self) -> Platform;

    async fn fetch(&self) -> Result<LicenseSnapshot>;
}

/// URL and basic-auth credentials for a platform polled with a static login.
#[derive(Debug, Clone)]
pub struct BasicAuthEndpoint {
    pub url: String,
    pub username: String,
    pub password: SecretString,
}

/// GET `url` with basic auth and decode the JSON body.
pub(crate) async fn get_json<T: DeserializeOwned>(
    http: &Client,
    platform: Platform,
    url: &str,
    endpoint: &BasicAuthEndpoint,
) -> Result<T> {
    let response = http
        .get(url)
        .basic_auth(&endpoint.username, Some(endpoint.password.expose_secret()))
        .send()
        .await
        .map_err(|source| LicenseError::Request { platform, source })?;

    let status = response.status();
    if !status.is_success() {
        return Err(LicenseError::UnexpectedStatus { platform, status: status.as_u16() });
    }

    response.json::<T>().await.map_err(|e| LicenseError::decode(platform, e.to_string()))
}

/// Whole days from `now` until `expires`, truncated toward zero.
pub fn days_until(expires: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (expires - now).num_days()
}

/// Deserialize any scalar or list into a label string.
pub(crate) fn label_value<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.map(|v| render_label(&v)).unwrap_or_default())
}

fn render_label(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(render_label).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}
