//! Error types for secret-store operations.

use thiserror::Error;

/// Result type for secret-store operations.
pub type Result<T> = std::result::Result<T, SecretsError>;

/// Errors that can occur while talking to the secret store.
#[derive(Error, Debug)]
pub enum SecretsError {
    /// No record exists at the configured path.
    #[error("Secret not found: {key}")]
    NotFound { key: String },

    /// Failed to reach the secret store.
    #[error("Backend connection failed: {message}")]
    ConnectionFailed { message: String },

    /// Login was rejected or the workload token could not be used.
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// A required field is absent from the stored record.
    #[error("Field '{field}' missing from secret '{key}'")]
    MissingField { key: String, field: String },

    /// A field is present but has a type or format that cannot be coerced.
    #[error("Field '{field}' in secret '{key}' is invalid: {reason}")]
    InvalidField { key: String, field: String, reason: String },

    /// Backend-specific error.
    #[error("Backend error: {message}")]
    BackendError { message: String },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// The call did not complete within the configured bound.
    #[error("Secret store operation '{operation}' timed out after {seconds}s")]
    Timeout { operation: String, seconds: u64 },

    /// I/O error (workload token file).
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl SecretsError {
    /// Create a not found error.
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create a connection failed error.
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::ConnectionFailed { message: message.into() }
    }

    /// Create an authentication failed error.
    pub fn authentication_failed(message: impl Into<String>) -> Self {
        Self::AuthenticationFailed { message: message.into() }
    }

    /// Create a missing field error.
    pub fn missing_field(key: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingField { key: key.into(), field: field.into() }
    }

    /// Create an invalid field error.
    pub fn invalid_field(
        key: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidField { key: key.into(), field: field.into(), reason: reason.into() }
    }

    /// Create a backend error.
    pub fn backend_error(message: impl Into<String>) -> Self {
        Self::BackendError { message: message.into() }
    }

    /// Create a config error.
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError { message: message.into() }
    }

    /// Create a timeout error.
    pub fn timeout(operation: impl Into<String>, seconds: u64) -> Self {
        Self::Timeout { operation: operation.into(), seconds }
    }

    /// True when the stored record itself is malformed, as opposed to the store
    /// being unreachable.
    pub fn is_data_shape(&self) -> bool {
        matches!(self, Self::MissingField { .. } | Self::InvalidField { .. })
    }
}
