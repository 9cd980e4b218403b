//! # Error Handling
//!
//! Module-local errors (`SecretsError`, `GitLabError`, `LicenseError`) convert
//! into [`ExporterError`], which is what startup and the scheduler deal in.

pub mod types;

pub use types::{ExporterError, Result};
