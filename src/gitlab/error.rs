use thiserror::Error;

pub type Result<T> = std::result::Result<T, GitLabError>;

/// Errors from the GitLab REST API.
///
/// `endpoint` is always the request path only. Tokens never appear in these
/// messages.
#[derive(Error, Debug)]
pub enum GitLabError {
    #[error("Failed to build GitLab HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("GitLab request to {endpoint} failed: {source}")]
    Request {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("GitLab {endpoint} returned HTTP {status}: {body}")]
    UnexpectedStatus { endpoint: String, status: u16, body: String },

    #[error("Failed to decode GitLab response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },
}

impl GitLabError {
    pub fn unexpected_status(
        endpoint: impl Into<String>,
        status: u16,
        body: impl Into<String>,
    ) -> Self {
        Self::UnexpectedStatus { endpoint: endpoint.into(), status, body: body.into() }
    }

    pub fn decode(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode { endpoint: endpoint.into(), message: message.into() }
    }

    /// True when GitLab refused the token (expired or already revoked).
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::UnexpectedStatus { status: 401 | 403, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_classification() {
        assert!(GitLabError::unexpected_status("/api/v4/license", 401, "").is_unauthorized());
        assert!(!GitLabError::unexpected_status("/api/v4/license", 500, "").is_unauthorized());
        assert!(!GitLabError::decode("/api/v4/license", "eof").is_unauthorized());
    }
}
