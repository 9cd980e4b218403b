use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;

use super::client::GitLabClient;
use super::error::GitLabError;
use crate::credential::Credential;
use crate::errors::Result;
use crate::http::{build_http_client, HttpClientConfig};
use crate::rotation::TokenAuthority;

/// Issues [`GitLabClient`]s and rotates personal access tokens.
///
/// One reqwest connection pool is shared by every client this authority
/// creates, so swapping tokens does not tear down connections.
#[derive(Debug, Clone)]
pub struct GitLabAuthority {
    http: Client,
    base_url: String,
}

impl GitLabAuthority {
    pub fn new(base_url: impl Into<String>, http: &HttpClientConfig) -> super::error::Result<Self> {
        let http = build_http_client(http).map_err(GitLabError::Client)?;
        Ok(Self { http, base_url: base_url.into() })
    }
}

#[async_trait]
impl TokenAuthority for GitLabAuthority {
    type Client = GitLabClient;

    fn new_client(&self, credential: &Credential) -> GitLabClient {
        GitLabClient::new(self.http.clone(), self.base_url.clone(), credential.value.clone())
    }

    async fn rotate(
        &self,
        client: &GitLabClient,
        id: i64,
        new_expiry: NaiveDate,
    ) -> Result<Credential> {
        let rotated = client.rotate_personal_access_token(id, new_expiry).await?;
        tracing::info!(
            old_id = id,
            new_id = rotated.id,
            expires_at = %rotated.expires_at,
            "Rotated GitLab personal access token"
        );
        Ok(rotated)
    }
}
