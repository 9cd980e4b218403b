//! Credential store trait.

use async_trait::async_trait;

use super::error::Result;
use super::path::KvPath;
use crate::credential::Credential;

/// Versioned storage for the rotating credential.
///
/// Implementations must not cache: every [`read`](CredentialStore::read) is a
/// round-trip to the backend, so a value written by another replica is seen on
/// the next read.
///
/// # Security Considerations
///
/// - Implementations MUST NOT log the credential value
/// - Network communication SHOULD use TLS
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Establish a session with the backend.
    ///
    /// Called once at startup, where a failure is fatal. Implementations with
    /// expiring sessions also re-authenticate transparently inside
    /// `read`/`write`.
    async fn authenticate(&self) -> Result<()>;

    /// Fetch and normalize the latest version of the record at `path`.
    async fn read(&self, path: &KvPath) -> Result<Credential>;

    /// Persist `credential` as a new version of the record at `path`.
    async fn write(&self, path: &KvPath, credential: &Credential) -> Result<()>;
}
