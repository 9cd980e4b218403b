//! Common test utilities for all integration tests.
//!
//! Provides wiremock-backed stand-ins for Vault and GitLab plus helpers for
//! building stores and authorities pointed at them.

#![allow(dead_code)]

pub mod mocks;

use std::sync::Arc;
use std::time::Duration;

use chrono::{Days, NaiveDate, Utc};
use license_exporter::gitlab::GitLabAuthority;
use license_exporter::http::HttpClientConfig;
use license_exporter::licenses::LicensePublisher;
use license_exporter::observability::MetricsRegistry;
use license_exporter::secrets::{KvPath, VaultAuth, VaultConfig, VaultCredentialStore};

/// Today (UTC) shifted by `days`, which may be negative.
pub fn days_from_today(days: i64) -> NaiveDate {
    let today = Utc::now().date_naive();
    if days >= 0 {
        today.checked_add_days(Days::new(days as u64)).unwrap()
    } else {
        today.checked_sub_days(Days::new(days.unsigned_abs())).unwrap()
    }
}

pub fn vault_config(address: &str, auth: VaultAuth) -> VaultConfig {
    VaultConfig {
        address: address.to_string(),
        namespace: None,
        auth,
        timeout: Duration::from_secs(5),
        verify_tls: true,
    }
}

/// Store using the static token the Vault mocks expect.
pub fn token_store(address: &str) -> Arc<VaultCredentialStore> {
    let auth = VaultAuth::Token(mocks::VAULT_TOKEN.into());
    Arc::new(VaultCredentialStore::new(vault_config(address, auth)).unwrap())
}

pub fn kv_path() -> KvPath {
    KvPath::new(mocks::KV_MOUNT, mocks::KV_PATH)
}

pub fn http_config() -> HttpClientConfig {
    HttpClientConfig { timeout: Duration::from_secs(5), ..Default::default() }
}

pub fn gitlab_authority(base_url: &str) -> Arc<GitLabAuthority> {
    Arc::new(GitLabAuthority::new(base_url, &http_config()).unwrap())
}

pub fn publisher() -> (LicensePublisher, Arc<MetricsRegistry>) {
    let metrics = Arc::new(MetricsRegistry::detached());
    (LicensePublisher::new(Arc::clone(&metrics)), metrics)
}
