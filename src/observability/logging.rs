//! # Structured Logging
//!
//! `RUST_LOG` wins when set; otherwise the configured level applies to every
//! target. JSON output is meant for cluster log shippers, the compact text
//! format for local runs.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{AppConfig, ObservabilityConfig};
use crate::errors::{ExporterError, Result};

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(config: &ObservabilityConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| {
            ExporterError::config(format!("Invalid log level '{}': {}", config.log_level, e))
        })?;

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = if config.json_logging {
        registry.with(tracing_subscriber::fmt::layer().json().with_current_span(false)).try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer().with_target(true)).try_init()
    };

    result.map_err(|e| ExporterError::config(format!("Failed to initialize logging: {}", e)))
}

/// Log configuration at startup. Secrets are never included.
pub fn log_config_info(config: &AppConfig) {
    tracing::info!(
        vault_address = %config.vault.address,
        vault_path = %config.vault.secret_path,
        vault_auth = config.vault.auth_method(),
        gitlab_url = %config.gitlab.url,
        threshold_days = config.rotation.threshold_days,
        check_interval_secs = config.rotation.check_interval_seconds,
        expiry_offset_days = config.rotation.expiry_offset_days,
        nexus_enabled = config.nexus.is_some(),
        sonar_enabled = config.sonar.is_some(),
        metrics_port = config.observability.metrics_port,
        "License exporter configuration"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_rejects_bad_level() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let config = ObservabilityConfig {
            log_level: "license_exporter=verbose".to_string(),
            ..Default::default()
        };
        assert!(init_logging(&config).is_err());
    }

    #[test]
    fn test_log_config_info() {
        let vars = [
            ("VAULT_URL", "https://vault.example.com"),
            ("VAULT_PATH", "secret/data/gitlab"),
            ("VAULT_TOKEN", "hvs.redacted"),
            ("GITLAB_URL", "https://gitlab.example.com"),
        ];
        let config = AppConfig::from_lookup(|key| {
            vars.iter().find(|(k, _)| *k == key).map(|(_, v)| v.to_string())
        })
        .unwrap();

        // This should not panic
        log_config_info(&config);
    }
}
