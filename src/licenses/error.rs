use thiserror::Error;

use super::Platform;
use crate::gitlab::GitLabError;

pub type Result<T> = std::result::Result<T, LicenseError>;

/// Errors fetching or normalizing license data.
#[derive(Error, Debug)]
pub enum LicenseError {
    #[error("Failed to build {platform} HTTP client: {source}")]
    Client {
        platform: Platform,
        #[source]
        source: reqwest::Error,
    },

    #[error("{platform} license request failed: {source}")]
    Request {
        platform: Platform,
        #[source]
        source: reqwest::Error,
    },

    #[error("{platform} license endpoint returned HTTP {status}")]
    UnexpectedStatus { platform: Platform, status: u16 },

    #[error("Failed to decode {platform} license: {message}")]
    Decode { platform: Platform, message: String },

    #[error(transparent)]
    GitLab(#[from] GitLabError),
}

impl LicenseError {
    pub fn decode(platform: Platform, message: impl Into<String>) -> Self {
        Self::Decode { platform, message: message.into() }
    }
}
