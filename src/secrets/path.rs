//! Location of the credential record inside a KV v2 engine.

use std::fmt;

use super::error::{Result, SecretsError};

/// Mount plus secret path, e.g. mount `secret`, path `gitlab/token`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvPath {
    pub mount: String,
    pub path: String,
}

impl KvPath {
    pub fn new(mount: impl Into<String>, path: impl Into<String>) -> Self {
        Self { mount: mount.into(), path: path.into() }
    }

    /// Parse a configured secret path.
    ///
    /// Accepts the logical API form `secret/data/gitlab/token`, which carries
    /// its own mount, or a plain `gitlab/token` that is combined with
    /// `default_mount`.
    pub fn parse(raw: &str, default_mount: &str) -> Result<Self> {
        let trimmed = raw.trim().trim_matches('/');
        if trimmed.is_empty() {
            return Err(SecretsError::config_error("Vault secret path cannot be empty"));
        }

        let padded = format!("{}/", trimmed);
        if let Some((mount, path)) = padded.split_once("/data/") {
            let path = path.trim_matches('/');
            if mount.is_empty() || path.is_empty() {
                return Err(SecretsError::config_error(format!(
                    "Vault secret path '{}' must look like '<mount>/data/<path>'",
                    raw
                )));
            }
            return Ok(Self::new(mount, path));
        }

        let mount = default_mount.trim().trim_matches('/');
        if mount.is_empty() {
            return Err(SecretsError::config_error("Vault KV mount cannot be empty"));
        }
        Ok(Self::new(mount, trimmed))
    }
}

impl fmt::Display for KvPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/data/{}", self.mount, self.path)
    }
}

/// Extract the Kubernetes auth mount from either `auth/<mount>/login` or a bare
/// mount name.
pub fn parse_auth_mount(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_matches('/');
    let mount = trimmed
        .strip_prefix("auth/")
        .map(|rest| rest.strip_suffix("/login").unwrap_or(rest))
        .unwrap_or(trimmed);

    if mount.is_empty() {
        return Err(SecretsError::config_error(format!("Invalid Vault auth path '{}'", raw)));
    }
    Ok(mount.to_string())
}
