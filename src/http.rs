//! Shared reqwest client construction for upstream platforms.

use std::time::Duration;

use reqwest::Client;

/// Timeouts and TLS policy applied to every upstream HTTP client.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Whole-request timeout
    pub timeout: Duration,
    /// TCP/TLS connect timeout
    pub connect_timeout: Duration,
    /// Skip certificate verification. Only for lab installs with self-signed certs.
    pub accept_invalid_certs: bool,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            accept_invalid_certs: false,
        }
    }
}

/// Build a client honoring `config`.
pub fn build_http_client(config: &HttpClientConfig) -> reqwest::Result<Client> {
    if config.accept_invalid_certs {
        tracing::warn!("TLS certificate verification disabled for upstream HTTP clients");
    }

    Client::builder()
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .danger_accept_invalid_certs(config.accept_invalid_certs)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Join a base URL and an absolute API path without doubling slashes.
pub fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
