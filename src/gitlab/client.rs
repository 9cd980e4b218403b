//! Token-bound GitLab REST client.

use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::error::{GitLabError, Result};
use crate::credential::{Credential, EXPIRY_DATE_FORMAT};
use crate::http::join_url;
use crate::secrets::SecretString;

const LICENSE_ENDPOINT: &str = "/api/v4/license";
const TOKEN_HEADER: &str = "PRIVATE-TOKEN";
const MAX_ERROR_BODY: usize = 512;

/// Instance license as reported by `GET /api/v4/license`.
#[derive(Debug, Clone, Deserialize)]
pub struct GitLabLicense {
    pub id: i64,
    #[serde(default)]
    pub plan: String,
    pub created_at: Option<String>,
    pub starts_at: Option<String>,
    pub expires_at: Option<NaiveDate>,
    #[serde(default)]
    pub historical_max: i64,
    #[serde(default)]
    pub maximum_user_count: i64,
    #[serde(default)]
    pub licensee: Licensee,
    #[serde(default)]
    pub add_ons: serde_json::Value,
    #[serde(default)]
    pub expired: bool,
    #[serde(default)]
    pub overage: i64,
    #[serde(default)]
    pub user_limit: i64,
    #[serde(default)]
    pub active_users: i64,
}

/// GitLab capitalizes these keys.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Licensee {
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Email", default)]
    pub email: String,
    #[serde(rename = "Company", default)]
    pub company: String,
}

#[derive(Debug, Serialize)]
struct RotateRequest {
    expires_at: String,
}

/// Subset of the personal access token returned by a rotation.
#[derive(Deserialize)]
struct RotatedToken {
    id: i64,
    token: String,
    expires_at: NaiveDate,
    #[serde(default = "default_active")]
    active: bool,
}

fn default_active() -> bool {
    true
}

impl From<RotatedToken> for Credential {
    fn from(rotated: RotatedToken) -> Self {
        Credential::new(rotated.id, rotated.token, rotated.expires_at, rotated.active)
    }
}

/// A GitLab API client bound to one personal access token.
///
/// Constructing one never contacts GitLab, so an invalid token only surfaces
/// on first use. Clients are replaced rather than mutated when the token
/// rotates.
#[derive(Clone)]
pub struct GitLabClient {
    http: Client,
    base_url: String,
    token: SecretString,
}

impl std::fmt::Debug for GitLabClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitLabClient")
            .field("base_url", &self.base_url)
            .field("token", &self.token)
            .finish()
    }
}

impl GitLabClient {
    pub fn new(http: Client, base_url: impl Into<String>, token: SecretString) -> Self {
        Self { http, base_url: base_url.into(), token }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The token this client authenticates with.
    pub fn token(&self) -> &SecretString {
        &self.token
    }

    /// Fetch the current instance license.
    pub async fn license(&self) -> Result<GitLabLicense> {
        let request = self.http.get(join_url(&self.base_url, LICENSE_ENDPOINT));
        self.send_json(request, LICENSE_ENDPOINT).await
    }

    /// Rotate the personal access token `id`.
    ///
    /// GitLab revokes the old token and returns a new one expiring on
    /// `expires_at`. Not safe to retry blindly: a retry after a rotation whose
    /// response was lost would revoke the token nobody has stored yet.
    pub async fn rotate_personal_access_token(
        &self,
        id: i64,
        expires_at: NaiveDate,
    ) -> Result<Credential> {
        let endpoint = format!("/api/v4/personal_access_tokens/{}/rotate", id);
        let body = RotateRequest { expires_at: expires_at.format(EXPIRY_DATE_FORMAT).to_string() };
        let request = self.http.post(join_url(&self.base_url, &endpoint)).json(&body);

        let rotated: RotatedToken = self.send_json(request, &endpoint).await?;
        Ok(rotated.into())
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        endpoint: &str,
    ) -> Result<T> {
        let response = request
            .header(TOKEN_HEADER, self.token.expose_secret())
            .send()
            .await
            .map_err(|source| GitLabError::Request { endpoint: endpoint.to_string(), source })?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            body.truncate(floor_char_boundary(&body, MAX_ERROR_BODY));
            return Err(GitLabError::unexpected_status(endpoint, status.as_u16(), body));
        }

        response.json::<T>().await.map_err(|e| GitLabError::decode(endpoint, e.to_string()))
    }
}

fn floor_char_boundary(s: &str, max: usize) -> usize {
    if s.len() <= max {
        return s.len();
    }
    (0..=max).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_license_deserializes_gitlab_payload() {
        let payload = json!({
            "id": 2,
            "plan": "ultimate",
            "created_at": "2024-02-01T10:00:00.000Z",
            "starts_at": "2024-02-01",
            "expires_at": "2027-02-01",
            "historical_max": 310,
            "maximum_user_count": 305,
            "licensee": {"Name": "Ops", "Email": "ops@example.com", "Company": "Example"},
            "add_ons": {},
            "expired": false,
            "overage": 0,
            "user_limit": 400,
            "active_users": 288
        });

        let license: GitLabLicense = serde_json::from_value(payload).unwrap();
        assert_eq!(license.plan, "ultimate");
        assert_eq!(license.expires_at, NaiveDate::from_ymd_opt(2027, 2, 1));
        assert_eq!(license.licensee.company, "Example");
        assert_eq!(license.user_limit - license.active_users, 112);
    }

    #[test]
    fn test_license_tolerates_missing_optional_fields() {
        let license: GitLabLicense =
            serde_json::from_value(json!({"id": 1, "expires_at": null})).unwrap();
        assert!(license.expires_at.is_none());
        assert_eq!(license.licensee.name, "");
    }

    #[test]
    fn test_rotated_token_into_credential() {
        let rotated: RotatedToken = serde_json::from_value(json!({
            "id": 77,
            "name": "license-exporter",
            "revoked": false,
            "scopes": ["read_api"],
            "active": true,
            "expires_at": "2026-09-01",
            "token": "glpat-rotated"
        }))
        .unwrap();

        let credential: Credential = rotated.into();
        assert_eq!(credential.id, 77);
        assert_eq!(credential.value.expose_secret(), "glpat-rotated");
        assert_eq!(credential.expires_at_string(), "2026-09-01");
    }

    #[test]
    fn test_debug_hides_token() {
        let client = GitLabClient::new(Client::new(), "https://gitlab.example.com", "glpat-x".into());
        let rendered = format!("{:?}", client);
        assert!(rendered.contains("gitlab.example.com"));
        assert!(!rendered.contains("glpat-x"));
    }

    #[test]
    fn test_floor_char_boundary() {
        assert_eq!(floor_char_boundary("abc", 10), 3);
        assert_eq!(floor_char_boundary("héllo", 2), 1);
    }
}
