//! Secret store access for the rotating GitLab credential.
//!
//! The store is abstracted behind [`CredentialStore`] so the refresh scheduler
//! can be exercised against an in-memory fake. The production implementation
//! is [`VaultCredentialStore`], which talks to a KV v2 engine.
//!
//! # Example
//!
//! ```rust,ignore
//! use license_exporter::secrets::{CredentialStore, KvPath, VaultAuth, VaultConfig, VaultCredentialStore};
//!
//! let store = VaultCredentialStore::new(VaultConfig {
//!     address: "https://vault.example.com".to_string(),
//!     namespace: None,
//!     auth: VaultAuth::Token("s.token".into()),
//!     timeout: std::time::Duration::from_secs(30),
//!     verify_tls: true,
//! })?;
//! store.authenticate().await?;
//! let credential = store.read(&KvPath::parse("secret/data/gitlab", "secret")?).await?;
//! ```

pub mod client;
pub mod error;
pub mod path;
pub mod record;
pub mod types;
pub mod vault;

pub use client::CredentialStore;
pub use error::{Result, SecretsError};
pub use path::{parse_auth_mount, KvPath};
pub use types::SecretString;
pub use vault::{VaultAuth, VaultConfig, VaultCredentialStore, DEFAULT_WORKLOAD_TOKEN_PATH};
