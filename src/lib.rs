//! # License Exporter
//!
//! Polls license endpoints of GitLab, Nexus and SonarQube and republishes them
//! as Prometheus gauges. The GitLab personal access token used for this lives
//! in Vault and is rotated before it expires.
//!
//! ## Architecture
//!
//! ```text
//! Vault KV v2 ──read/write──▶ RefreshScheduler ──rotate──▶ GitLab
//!                                   │ swap
//!                                   ▼
//!                              ClientSlot ──▶ LicensePublisher ──▶ MetricsRegistry
//! ```
//!
//! - [`secrets`]: the credential store and its Vault implementation
//! - [`gitlab`]: the token-bound REST client and the rotation authority
//! - [`rotation`]: policy, client slot and the refresh scheduler
//! - [`licenses`]: per-platform license sources and the publisher
//! - [`startup`]: the fail-fast bootstrap sequence

pub mod cli;
pub mod config;
pub mod credential;
pub mod errors;
pub mod gitlab;
pub mod http;
pub mod licenses;
pub mod observability;
pub mod rotation;
pub mod secrets;
pub mod startup;

// Re-export commonly used types and traits
pub use config::AppConfig;
pub use credential::Credential;
pub use errors::{ExporterError, Result};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
