//! # Configuration Settings
//!
//! Defines the configuration structure for the license exporter. Values come
//! from the environment; see [`AppConfig::from_env`].

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use url::Url;
use validator::Validate;

use crate::errors::{ExporterError, Result};
use crate::http::HttpClientConfig;
use crate::licenses::BasicAuthEndpoint;
use crate::rotation::RotationPolicy;
use crate::secrets::{
    parse_auth_mount, KvPath, SecretString, VaultAuth, VaultConfig, DEFAULT_WORKLOAD_TOKEN_PATH,
};

/// Main application configuration
#[derive(Debug, Clone, Validate)]
pub struct AppConfig {
    #[validate(nested)]
    pub vault: VaultSettings,

    #[validate(nested)]
    pub gitlab: GitLabSettings,

    #[validate(nested)]
    pub rotation: RotationSettings,

    #[validate(nested)]
    pub http: HttpSettings,

    /// Nexus license source, enabled when `NEXUS_URL` is set
    #[validate(nested)]
    pub nexus: Option<BasicAuthSettings>,

    /// Sonar license source, enabled when `SONAR_URL` is set
    #[validate(nested)]
    pub sonar: Option<BasicAuthSettings>,

    #[validate(nested)]
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Read configuration from the process environment.
    ///
    /// Parsing only; call [`validate`](Self::validate) before use.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let vault = VaultSettings {
            address: env.required_any(&["VAULT_URL", "VAULT_ADDR"])?,
            namespace: env.get("VAULT_NAMESPACE"),
            secret_path: env.required("VAULT_PATH")?,
            kv_mount: env.get("VAULT_KV_MOUNT").unwrap_or_else(|| "secret".to_string()),
            auth_path: env
                .any(&["VAULT_AUTH_PATH", "authPath"])
                .unwrap_or_else(|| "kubernetes".to_string()),
            auth_role: env.any(&["VAULT_AUTH_ROLE", "authRole"]),
            token: env.get("VAULT_TOKEN").map(SecretString::from),
            workload_token_path: env
                .get("WORKLOAD_TOKEN_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_WORKLOAD_TOKEN_PATH)),
            timeout_seconds: env.parse_or("VAULT_TIMEOUT_SECS", 30)?,
        };

        let gitlab = GitLabSettings { url: env.required("GITLAB_URL")? };

        let defaults = RotationSettings::default();
        let rotation = RotationSettings {
            threshold_days: env.parse_or("ROTATION_THRESHOLD_DAYS", defaults.threshold_days)?,
            check_interval_seconds: env
                .parse_or("ROTATION_CHECK_INTERVAL_SECS", defaults.check_interval_seconds)?,
            expiry_offset_days: env.parse_or("GL_TOKEN_EXPIRY_DAYS", defaults.expiry_offset_days)?,
        };

        let http = HttpSettings {
            timeout_seconds: env.parse_or("HTTP_TIMEOUT_SECS", 30)?,
            insecure_skip_verify: env.flag_or("TLS_INSECURE_SKIP_VERIFY", false)?,
        };

        let observability_defaults = ObservabilityConfig::default();
        let observability = ObservabilityConfig {
            metrics_port: env.parse_or("METRICS_PORT", observability_defaults.metrics_port)?,
            service_name: observability_defaults.service_name,
            log_level: env.get("LOG_LEVEL").unwrap_or(observability_defaults.log_level),
            json_logging: env
                .get("LOG_FORMAT")
                .is_some_and(|format| format.eq_ignore_ascii_case("json")),
        };

        Ok(Self {
            vault,
            gitlab,
            rotation,
            http,
            nexus: env.basic_auth("NEXUS"),
            sonar: env.basic_auth("SONAR"),
            observability,
        })
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(ExporterError::from)?;

        self.validate_custom()?;

        Ok(())
    }

    /// Cross-field rules the validator derive cannot express
    fn validate_custom(&self) -> Result<()> {
        self.rotation_policy().validate()?;

        self.kv_path()?;
        require_http_scheme(&self.vault.address, "address")?;
        require_http_scheme(&self.gitlab.url, "url")?;
        for source in self.nexus.iter().chain(self.sonar.iter()) {
            require_http_scheme(&source.url, "url")?;
        }
        parse_auth_mount(&self.vault.auth_path)
            .map_err(|e| ExporterError::validation_field(e.to_string(), "auth_path"))?;

        if self.vault.uses_workload_identity() && self.vault.auth_role.is_none() {
            return Err(ExporterError::validation_field(
                "VAULT_AUTH_ROLE is required for Kubernetes login (or set VAULT_TOKEN)",
                "auth_role",
            ));
        }

        Ok(())
    }

    pub fn kv_path(&self) -> Result<KvPath> {
        KvPath::parse(&self.vault.secret_path, &self.vault.kv_mount)
            .map_err(|e| ExporterError::validation_field(e.to_string(), "secret_path"))
    }

    pub fn rotation_policy(&self) -> RotationPolicy {
        RotationPolicy {
            check_interval: Duration::from_secs(self.rotation.check_interval_seconds),
            threshold_days: self.rotation.threshold_days,
            expiry_offset_days: self.rotation.expiry_offset_days,
        }
    }

    pub fn http_client_config(&self) -> HttpClientConfig {
        HttpClientConfig {
            timeout: self.http.timeout(),
            accept_invalid_certs: self.http.insecure_skip_verify,
            ..Default::default()
        }
    }

    pub fn to_vault_config(&self) -> Result<VaultConfig> {
        let auth = if self.vault.uses_workload_identity() {
            VaultAuth::Kubernetes {
                mount: parse_auth_mount(&self.vault.auth_path)?,
                role: self.vault.auth_role.clone().unwrap_or_default(),
                token_path: self.vault.workload_token_path.clone(),
            }
        } else {
            VaultAuth::Token(self.vault.token.clone().unwrap_or_default())
        };

        Ok(VaultConfig {
            address: self.vault.address.clone(),
            namespace: self.vault.namespace.clone(),
            auth,
            timeout: self.vault.timeout(),
            verify_tls: !self.http.insecure_skip_verify,
        })
    }
}

/// Vault connection and credential location
#[derive(Debug, Clone, Validate)]
pub struct VaultSettings {
    #[validate(url(message = "Vault address must be a valid URL"))]
    pub address: String,

    pub namespace: Option<String>,

    /// Credential path, `mount/data/path` or a plain path under `kv_mount`
    #[validate(length(min = 1, message = "Vault path cannot be empty"))]
    pub secret_path: String,

    #[validate(length(min = 1, message = "KV mount cannot be empty"))]
    pub kv_mount: String,

    /// Kubernetes auth mount, bare or as `auth/<mount>/login`
    pub auth_path: String,

    pub auth_role: Option<String>,

    /// Static token, used only when no workload token file is mounted
    pub token: Option<SecretString>,

    pub workload_token_path: PathBuf,

    #[validate(range(min = 1, max = 300, message = "Vault timeout must be between 1 and 300 seconds"))]
    pub timeout_seconds: u64,
}

impl VaultSettings {
    /// Kubernetes login is used whenever the workload token file exists, and
    /// also when no static token is configured.
    pub fn uses_workload_identity(&self) -> bool {
        self.token.is_none() || token_file_present(&self.workload_token_path)
    }

    pub fn auth_method(&self) -> &'static str {
        if self.uses_workload_identity() {
            "kubernetes"
        } else {
            "token"
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Upstreams are plain REST endpoints; anything but http(s) is a typo.
fn require_http_scheme(raw: &str, field: &str) -> Result<()> {
    let parsed = Url::parse(raw).map_err(|e| {
        ExporterError::validation_field(format!("'{}' is not a valid URL: {}", raw, e), field)
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(ExporterError::validation_field(
            format!("'{}' uses unsupported scheme '{}', expected http or https", raw, scheme),
            field,
        )),
    }
}

fn token_file_present(path: &Path) -> bool {
    path.is_file()
}

#[derive(Debug, Clone, Validate)]
pub struct GitLabSettings {
    #[validate(url(message = "GitLab URL must be a valid URL"))]
    pub url: String,
}

/// Credential rotation timing
#[derive(Debug, Clone, Validate)]
pub struct RotationSettings {
    #[validate(range(min = 0, max = 30, message = "Rotation threshold must be between 0 and 30 days"))]
    pub threshold_days: i64,

    #[validate(range(
        min = 60,
        message = "Rotation check interval must be at least 60 seconds"
    ))]
    pub check_interval_seconds: u64,

    /// GitLab caps personal access token lifetime at a year
    #[validate(range(min = 1, max = 365, message = "Token expiry must be between 1 and 365 days"))]
    pub expiry_offset_days: i64,
}

impl Default for RotationSettings {
    fn default() -> Self {
        let policy = RotationPolicy::default();
        Self {
            threshold_days: policy.threshold_days,
            check_interval_seconds: policy.check_interval.as_secs(),
            expiry_offset_days: policy.expiry_offset_days,
        }
    }
}

/// Upstream HTTP client settings
#[derive(Debug, Clone, Validate)]
pub struct HttpSettings {
    #[validate(range(min = 1, max = 300, message = "HTTP timeout must be between 1 and 300 seconds"))]
    pub timeout_seconds: u64,

    /// Disable TLS verification for Vault and every upstream
    pub insecure_skip_verify: bool,
}

impl HttpSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Platform polled with a static basic-auth login
#[derive(Debug, Clone, Validate)]
pub struct BasicAuthSettings {
    #[validate(url(message = "License endpoint URL must be a valid URL"))]
    pub url: String,

    #[validate(length(min = 1, message = "Username cannot be empty"))]
    pub username: String,

    pub password: SecretString,
}

impl BasicAuthSettings {
    pub fn endpoint(&self) -> BasicAuthEndpoint {
        BasicAuthEndpoint {
            url: self.url.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }
}

/// Observability configuration for logging and metrics
#[derive(Debug, Clone, Validate)]
pub struct ObservabilityConfig {
    /// Metrics server port (0 = no listener)
    pub metrics_port: u16,

    #[validate(length(min = 1, message = "Service name cannot be empty"))]
    pub service_name: String,

    /// Log level or `EnvFilter` directive
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Enable JSON structured logging
    pub json_logging: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_port: 8081,
            service_name: "license-exporter".to_string(),
            log_level: "info".to_string(),
            json_logging: false,
        }
    }
}

impl ObservabilityConfig {
    /// Get metrics bind address (None if disabled)
    pub fn metrics_bind_address(&self) -> Option<String> {
        if self.metrics_port == 0 {
            None
        } else {
            Some(format!("0.0.0.0:{}", self.metrics_port))
        }
    }
}

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
    }

    fn any(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| self.get(key))
    }

    fn required(&self, key: &str) -> Result<String> {
        self.get(key).ok_or_else(|| ExporterError::config(format!("{} must be set", key)))
    }

    fn required_any(&self, keys: &[&str]) -> Result<String> {
        self.any(keys)
            .ok_or_else(|| ExporterError::config(format!("{} must be set", keys.join(" or "))))
    }

    fn parse_or<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => raw.parse::<T>().map_err(|e| {
                ExporterError::config_with_source(format!("Invalid {} '{}'", key, raw), Box::new(e))
            }),
        }
    }

    fn flag_or(&self, key: &str, default: bool) -> Result<bool> {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => match raw.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => Ok(true),
                "0" | "false" | "no" => Ok(false),
                _ => Err(ExporterError::config(format!(
                    "Invalid {} '{}': expected true or false",
                    key, raw
                ))),
            },
        }
    }

    fn basic_auth(&self, prefix: &str) -> Option<BasicAuthSettings> {
        let url = self.get(&format!("{}_URL", prefix))?;
        Some(BasicAuthSettings {
            url,
            username: self.get(&format!("{}_USERNAME", prefix)).unwrap_or_default(),
            password: self.get(&format!("{}_PASSWORD", prefix)).unwrap_or_default().into(),
        })
    }
}
