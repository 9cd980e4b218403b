//! # Error Types
//!
//! Top-level error type for the exporter using `thiserror`.

use crate::gitlab::GitLabError;
use crate::licenses::LicenseError;
use crate::secrets::SecretsError;

/// Custom result type for exporter operations
pub type Result<T> = std::result::Result<T, ExporterError>;

/// Main error type for the exporter
#[derive(thiserror::Error, Debug)]
pub enum ExporterError {
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Validation errors
    #[error("Validation error: {message}")]
    Validation { message: String, field: Option<String> },

    /// Secret store errors
    #[error(transparent)]
    Secrets(#[from] SecretsError),

    /// GitLab API errors, including rotation
    #[error(transparent)]
    GitLab(#[from] GitLabError),

    /// License fetch errors
    #[error(transparent)]
    License(#[from] LicenseError),

    /// Metrics exporter setup errors
    #[error("Metrics error: {message}")]
    Metrics { message: String },

    /// I/O errors with additional context
    #[error("I/O error: {context}")]
    Io {
        #[source]
        source: std::io::Error,
        context: String,
    },

    /// Internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ExporterError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), source: None }
    }

    /// Create a configuration error with source
    pub fn config_with_source<S: Into<String>>(
        message: S,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Config { message: message.into(), source: Some(source) }
    }

    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation { message: message.into(), field: None }
    }

    /// Create a validation error with field information
    pub fn validation_field<S: Into<String>, F: Into<String>>(message: S, field: F) -> Self {
        Self::Validation { message: message.into(), field: Some(field.into()) }
    }

    /// Create a metrics error
    pub fn metrics<S: Into<String>>(message: S) -> Self {
        Self::Metrics { message: message.into() }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal { message: message.into() }
    }

    /// Whether the failure may clear up on its own by the next scheduler tick.
    pub fn is_transient(&self) -> bool {
        match self {
            ExporterError::Secrets(e) => !e.is_data_shape(),
            ExporterError::GitLab(GitLabError::Request { .. }) => true,
            ExporterError::GitLab(GitLabError::UnexpectedStatus { status, .. }) => *status >= 500,
            ExporterError::License(_) => true,
            ExporterError::Io { .. } => true,
            _ => false,
        }
    }
}

impl From<std::io::Error> for ExporterError {
    fn from(error: std::io::Error) -> Self {
        Self::Io { source: error, context: "I/O operation failed".to_string() }
    }
}

impl From<validator::ValidationErrors> for ExporterError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields = Vec::new();
        collect_validation_messages(&errors, "", &mut fields);
        fields.sort();

        Self::validation(format!("Validation failed: {}", fields.join("; ")))
    }
}

/// Flatten nested validation errors into `path.to.field: message` entries.
fn collect_validation_messages(
    errors: &validator::ValidationErrors,
    prefix: &str,
    out: &mut Vec<String>,
) {
    use validator::ValidationErrorsKind;

    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() { field.to_string() } else { format!("{}.{}", prefix, field) };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                let error_messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| e.message.as_ref().map_or("Invalid value".to_string(), |m| m.to_string()))
                    .collect();
                out.push(format!("{}: {}", path, error_messages.join(", ")));
            }
            ValidationErrorsKind::Struct(nested) => collect_validation_messages(nested, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_validation_messages(nested, &format!("{}[{}]", path, index), out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_error_creation() {
        let error = ExporterError::config("GITLAB_URL is required");
        assert!(matches!(error, ExporterError::Config { .. }));
        assert_eq!(error.to_string(), "Configuration error: GITLAB_URL is required");
    }

    #[test]
    fn test_validation_error_field() {
        let error = ExporterError::validation_field("must be positive", "threshold_days");
        if let ExporterError::Validation { field, .. } = error {
            assert_eq!(field, Some("threshold_days".to_string()));
        } else {
            panic!("expected validation error");
        }
    }

    #[test]
    fn test_secrets_error_is_transparent() {
        let error: ExporterError = SecretsError::not_found("secret/data/gitlab").into();
        assert_eq!(error.to_string(), "Secret not found: secret/data/gitlab");
    }

    #[test]
    fn test_transient_classification() {
        let shape: ExporterError = SecretsError::missing_field("k", "id").into();
        assert!(!shape.is_transient());

        let timeout: ExporterError = SecretsError::timeout("read", 30).into();
        assert!(timeout.is_transient());

        let unauthorized: ExporterError =
            GitLabError::unexpected_status("/api/v4/license", 401, "").into();
        assert!(!unauthorized.is_transient());

        let outage: ExporterError = GitLabError::unexpected_status("/api/v4/license", 502, "").into();
        assert!(outage.is_transient());
        assert!(!ExporterError::config("bad").is_transient());
    }

    #[test]
    fn test_validator_conversion() {
        #[derive(Validate)]
        struct Sample {
            #[validate(range(min = 1, message = "must be at least 1"))]
            value: u32,
        }

        let error: ExporterError = Sample { value: 0 }.validate().unwrap_err().into();
        assert_eq!(error.to_string(), "Validation error: Validation failed: value: must be at least 1");
    }

    #[test]
    fn test_validator_conversion_nested() {
        #[derive(Validate)]
        struct Inner {
            #[validate(range(min = 1, message = "must be at least 1"))]
            days: u32,
        }

        #[derive(Validate)]
        struct Outer {
            #[validate(nested)]
            rotation: Inner,
        }

        let error: ExporterError = Outer { rotation: Inner { days: 0 } }.validate().unwrap_err().into();
        assert!(error.to_string().ends_with("rotation.days: must be at least 1"));
    }
}
