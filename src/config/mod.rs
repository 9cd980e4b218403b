//! # Configuration Management
//!
//! Environment-driven configuration for the exporter. `.env` files are loaded
//! by the binary before [`AppConfig::from_env`] runs.

pub mod settings;

pub use settings::{
    AppConfig, BasicAuthSettings, GitLabSettings, HttpSettings, ObservabilityConfig,
    RotationSettings, VaultSettings,
};
