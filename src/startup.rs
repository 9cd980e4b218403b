//! Startup sequence for the license exporter
//!
//! Authenticates to the secret store, loads the current credential, builds the
//! first GitLab client and hands everything to a [`RefreshScheduler`]. Any
//! failure here is fatal: the process must not run without a credential.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::errors::Result;
use crate::gitlab::GitLabAuthority;
use crate::http::HttpClientConfig;
use crate::licenses::{LicensePublisher, LicenseSource, NexusLicenseSource, SonarLicenseSource};
use crate::observability::MetricsRegistry;
use crate::rotation::{ClientSlot, RefreshScheduler, RotationPolicy, TokenAuthority};
use crate::secrets::{CredentialStore, KvPath, VaultCredentialStore};

/// The production scheduler: Vault-held GitLab token.
pub type ExporterScheduler = RefreshScheduler<VaultCredentialStore, GitLabAuthority>;

/// Authenticate, read the credential at `path` and build the scheduler.
pub async fn bootstrap<S, A>(
    store: Arc<S>,
    authority: Arc<A>,
    path: KvPath,
    policy: RotationPolicy,
    publisher: LicensePublisher,
) -> Result<RefreshScheduler<S, A>>
where
    S: CredentialStore,
    A: TokenAuthority,
    A::Client: LicenseSource,
{
    store.authenticate().await?;
    info!(path = %path, "Authenticated to secret store");

    let credential = store.read(&path).await?;
    let days_left = credential.expiry_distance(Utc::now());
    info!(
        id = credential.id,
        expires_at = %credential.expires_at_string(),
        days_left,
        "Loaded credential"
    );
    if !credential.active {
        warn!(id = credential.id, "Stored credential is flagged inactive");
    }
    publisher.metrics().set_credential_days_until_expiry(days_left);

    let slot = Arc::new(ClientSlot::new(authority.new_client(&credential)));
    Ok(RefreshScheduler::new(store, authority, slot, path, policy, credential, publisher))
}

/// Build the Vault store, GitLab authority and license sources described by
/// `config`, then [`bootstrap`].
pub async fn bootstrap_from_config(
    config: &AppConfig,
    metrics: Arc<MetricsRegistry>,
) -> Result<ExporterScheduler> {
    let http = config.http_client_config();
    let store = Arc::new(VaultCredentialStore::new(config.to_vault_config()?)?);
    let authority = Arc::new(GitLabAuthority::new(config.gitlab.url.clone(), &http)?);
    let publisher = build_publisher(config, &http, metrics)?;

    bootstrap(store, authority, config.kv_path()?, config.rotation_policy(), publisher).await
}

/// Publisher with every optional license source that is configured.
pub fn build_publisher(
    config: &AppConfig,
    http: &HttpClientConfig,
    metrics: Arc<MetricsRegistry>,
) -> Result<LicensePublisher> {
    let mut publisher = LicensePublisher::new(metrics);

    if let Some(nexus) = &config.nexus {
        publisher = publisher.with_source(Arc::new(NexusLicenseSource::new(nexus.endpoint(), http)?));
        info!(url = %nexus.url, "Nexus license source enabled");
    }
    if let Some(sonar) = &config.sonar {
        publisher = publisher.with_source(Arc::new(SonarLicenseSource::new(sonar.endpoint(), http)?));
        info!(url = %sonar.url, "Sonar license source enabled");
    }

    Ok(publisher)
}
