//! HashiCorp Vault credential store.
//!
//! Reads and writes the credential record in a KV v2 engine. Sessions come from
//! the Kubernetes auth method using the pod's service-account token, or from a
//! static `VAULT_TOKEN` outside a cluster.
//!
//! # Session lifetime
//!
//! A Kubernetes login returns a lease. Once 90% of it has elapsed the next
//! `read`/`write` logs in again before talking to KV, so a process that runs
//! for months does not fail every tick after its first session expires. A
//! 401/403 from KV drops the session so the following call starts fresh.
//!
//! # Security
//!
//! - The workload token, the session token and the credential value are held
//!   as [`SecretString`] and never logged
//! - TLS verification is on unless explicitly disabled in configuration

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;
use vaultrs::client::{VaultClient, VaultClientSettingsBuilder};
use vaultrs::error::ClientError;
use vaultrs::kv2;

use super::client::CredentialStore;
use super::error::{Result, SecretsError};
use super::path::KvPath;
use super::record::{credential_from_record, CredentialRecord, RawRecord};
use super::types::SecretString;
use crate::credential::Credential;

/// Default location of the projected service-account token.
pub const DEFAULT_WORKLOAD_TOKEN_PATH: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";

/// Fraction of a session lease after which the store logs in again.
const RENEWAL_FRACTION: f64 = 0.9;

/// How the store obtains a Vault session.
#[derive(Debug, Clone)]
pub enum VaultAuth {
    /// Exchange the workload identity token for a session via `auth/<mount>/login`.
    Kubernetes { mount: String, role: String, token_path: PathBuf },
    /// Use a pre-issued token as-is.
    Token(SecretString),
}

/// Configuration for the Vault credential store.
#[derive(Debug, Clone)]
pub struct VaultConfig {
    /// Vault server address (e.g., "https://vault.example.com:8200")
    pub address: String,

    /// Vault namespace (Enterprise only)
    pub namespace: Option<String>,

    pub auth: VaultAuth,

    /// Upper bound for every individual Vault call
    pub timeout: Duration,

    /// Verify the server certificate
    pub verify_tls: bool,
}

struct Session {
    client: Arc<VaultClient>,
    renew_at: Option<Instant>,
}

impl Session {
    fn needs_renewal(&self, now: Instant) -> bool {
        self.renew_at.is_some_and(|deadline| now >= deadline)
    }
}

/// [`CredentialStore`] backed by Vault KV v2.
pub struct VaultCredentialStore {
    config: VaultConfig,
    session: RwLock<Option<Session>>,
}

impl VaultCredentialStore {
    /// Create a store. No network traffic happens until
    /// [`authenticate`](CredentialStore::authenticate).
    pub fn new(config: VaultConfig) -> Result<Self> {
        if config.address.trim().is_empty() {
            return Err(SecretsError::config_error("Vault address cannot be empty"));
        }
        if let VaultAuth::Kubernetes { role, .. } = &config.auth {
            if role.trim().is_empty() {
                return Err(SecretsError::config_error(
                    "Vault Kubernetes auth requires a role",
                ));
            }
        }

        Ok(Self { config, session: RwLock::new(None) })
    }

    /// Exchange a workload identity token for a Vault session token.
    ///
    /// The resulting session is installed for subsequent reads and writes, and
    /// the session token is returned for callers that need it.
    pub async fn login_with_workload_token(
        &self,
        workload_token: &SecretString,
    ) -> Result<SecretString> {
        let VaultAuth::Kubernetes { mount, role, .. } = &self.config.auth else {
            return Err(SecretsError::config_error(
                "Workload identity login requires Kubernetes auth to be configured",
            ));
        };

        // Login ignores the caller's token, but the settings builder insists on one.
        let anonymous = self.build_client("unauthenticated")?;
        let auth = self
            .bounded(
                "kubernetes_login",
                vaultrs::auth::kubernetes::login(
                    &anonymous,
                    mount,
                    role,
                    workload_token.expose_secret(),
                ),
            )
            .await?
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    mount = %mount,
                    role = %role,
                    "Vault Kubernetes login failed"
                );
                SecretsError::authentication_failed(format!(
                    "Kubernetes login at auth/{}/login as role '{}' failed: {}",
                    mount, role, e
                ))
            })?;

        let session_token = SecretString::new(auth.client_token);
        let client = self.build_client(session_token.expose_secret())?;
        *self.session.write().await =
            Some(Session { client: Arc::new(client), renew_at: renewal_deadline(auth.lease_duration) });

        tracing::info!(
            mount = %mount,
            role = %role,
            lease_seconds = auth.lease_duration,
            "Authenticated to Vault with workload identity"
        );

        Ok(session_token)
    }

    fn build_client(&self, token: &str) -> Result<VaultClient> {
        let mut settings_builder = VaultClientSettingsBuilder::default();
        settings_builder.address(&self.config.address).token(token).verify(self.config.verify_tls);

        if let Some(namespace) = &self.config.namespace {
            settings_builder.namespace(Some(namespace.clone()));
        }

        let settings = settings_builder.build().map_err(|e| {
            SecretsError::config_error(format!("Invalid Vault configuration: {}", e))
        })?;

        VaultClient::new(settings).map_err(|e| {
            SecretsError::connection_failed(format!("Failed to create Vault client: {}", e))
        })
    }

    async fn bounded<T, E, F>(&self, operation: &str, fut: F) -> Result<std::result::Result<T, E>>
    where
        F: Future<Output = std::result::Result<T, E>>,
    {
        tokio::time::timeout(self.config.timeout, fut)
            .await
            .map_err(|_| SecretsError::timeout(operation, self.config.timeout.as_secs()))
    }

    /// Current session client, logging in again when the lease is close to
    /// running out.
    async fn session(&self) -> Result<Arc<VaultClient>> {
        {
            let guard = self.session.read().await;
            if let Some(session) = guard.as_ref() {
                if !session.needs_renewal(Instant::now()) {
                    return Ok(session.client.clone());
                }
            }
        }

        tracing::debug!("Vault session missing or near lease expiry, re-authenticating");
        self.authenticate().await?;

        self.session
            .read()
            .await
            .as_ref()
            .map(|session| session.client.clone())
            .ok_or_else(|| SecretsError::authentication_failed("No Vault session after login"))
    }

    async fn on_error(&self, path: &KvPath, error: ClientError) -> SecretsError {
        let mapped = map_client_error(path, error);
        if matches!(mapped, SecretsError::AuthenticationFailed { .. }) {
            *self.session.write().await = None;
        }
        mapped
    }
}

#[async_trait]
impl CredentialStore for VaultCredentialStore {
    async fn authenticate(&self) -> Result<()> {
        match &self.config.auth {
            VaultAuth::Kubernetes { token_path, .. } => {
                let workload_token = read_workload_token(token_path).await?;
                self.login_with_workload_token(&workload_token).await?;
            }
            VaultAuth::Token(token) => {
                let client = self.build_client(token.expose_secret())?;
                *self.session.write().await =
                    Some(Session { client: Arc::new(client), renew_at: None });
                tracing::info!(address = %self.config.address, "Using static Vault token");
            }
        }
        Ok(())
    }

    async fn read(&self, path: &KvPath) -> Result<Credential> {
        let client = self.session().await?;
        let key = path.to_string();

        let raw: RawRecord =
            match self.bounded("read", kv2::read(&*client, &path.mount, &path.path)).await? {
                Ok(raw) => raw,
                Err(e) => return Err(self.on_error(path, e).await),
            };

        let credential = credential_from_record(&key, &raw)?;
        tracing::debug!(
            path = %key,
            id = credential.id,
            expires_at = %credential.expires_at,
            "Read credential from Vault"
        );
        Ok(credential)
    }

    async fn write(&self, path: &KvPath, credential: &Credential) -> Result<()> {
        let client = self.session().await?;
        let record = CredentialRecord::from(credential);

        if let Err(e) =
            self.bounded("write", kv2::set(&*client, &path.mount, &path.path, &record)).await?
        {
            tracing::error!(error = %e, path = %path, "Failed to write credential to Vault");
            return Err(self.on_error(path, e).await);
        }

        tracing::info!(
            path = %path,
            id = credential.id,
            expires_at = %credential.expires_at,
            "Stored credential in Vault"
        );
        Ok(())
    }
}

/// Read the mounted workload identity token.
pub async fn read_workload_token(path: &Path) -> Result<SecretString> {
    let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
        SecretsError::authentication_failed(format!(
            "Cannot read workload token at {}: {}",
            path.display(),
            e
        ))
    })?;

    let token = raw.trim();
    if token.is_empty() {
        return Err(SecretsError::authentication_failed(format!(
            "Workload token at {} is empty",
            path.display()
        )));
    }
    Ok(SecretString::new(token))
}

fn renewal_deadline(lease_seconds: u64) -> Option<Instant> {
    if lease_seconds == 0 {
        return None;
    }
    let lifetime = Duration::from_secs_f64(lease_seconds as f64 * RENEWAL_FRACTION);
    Some(Instant::now() + lifetime)
}

fn map_client_error(path: &KvPath, error: ClientError) -> SecretsError {
    match error {
        ClientError::APIError { code: 404, .. } => SecretsError::not_found(path.to_string()),
        ClientError::APIError { code: code @ (401 | 403), errors } => {
            SecretsError::authentication_failed(format!(
                "Vault rejected the session for {} ({}): {}",
                path,
                code,
                errors.join("; ")
            ))
        }
        other => SecretsError::backend_error(format!("Vault request for {} failed: {}", path, other)),
    }
}
