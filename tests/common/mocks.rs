//! Mock external services for integration tests
//!
//! Provides wiremock-based mocks for:
//! - Vault KV v2 read/write and Kubernetes login
//! - GitLab license and token rotation endpoints

use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const VAULT_TOKEN: &str = "hvs.test-root";
pub const KV_MOUNT: &str = "secret";
pub const KV_PATH: &str = "gitlab/token";

/// Vault wraps every response in the same envelope.
pub fn vault_envelope(data: Value, auth: Value) -> Value {
    json!({
        "request_id": "6a4f2d1e-0000-4000-8000-000000000000",
        "lease_id": "",
        "lease_duration": 0,
        "renewable": false,
        "data": data,
        "wrap_info": null,
        "warnings": null,
        "auth": auth
    })
}

fn version_metadata(version: u64) -> Value {
    json!({
        "created_time": "2026-01-01T00:00:00.000000Z",
        "custom_metadata": null,
        "deletion_time": "",
        "destroyed": false,
        "version": version
    })
}

/// Body of a KV v2 read holding `record`.
pub fn kv2_read_body(record: Value) -> Value {
    vault_envelope(json!({ "data": record, "metadata": version_metadata(3) }), Value::Null)
}

/// Body of a KV v2 write.
pub fn kv2_write_body(version: u64) -> Value {
    vault_envelope(version_metadata(version), Value::Null)
}

/// Body of a successful auth login.
pub fn login_body(client_token: &str, lease_duration: u64) -> Value {
    vault_envelope(
        Value::Null,
        json!({
            "client_token": client_token,
            "accessor": "accessor-1",
            "policies": ["default", "license-exporter"],
            "token_policies": ["default", "license-exporter"],
            "metadata": { "role": "license-exporter" },
            "lease_duration": lease_duration,
            "renewable": true,
            "entity_id": "entity-1",
            "token_type": "service",
            "orphan": true
        }),
    )
}

/// Vault error body.
pub fn vault_errors(message: &str) -> Value {
    json!({ "errors": [message] })
}

pub fn kv2_data_path() -> String {
    format!("/v1/{}/data/{}", KV_MOUNT, KV_PATH)
}

/// A credential record as stored in KV.
pub fn record(id: i64, token: &str, expires_at: &str) -> Value {
    json!({ "id": id, "expires_at": expires_at, "active": true, "token": token })
}

/// Serve `record` on KV reads made with `token`.
pub async fn mount_kv_read(server: &MockServer, token: &str, record: Value) {
    Mock::given(method("GET"))
        .and(path(kv2_data_path()))
        .and(header("X-Vault-Token", token))
        .respond_with(ResponseTemplate::new(200).set_body_json(kv2_read_body(record)))
        .mount(server)
        .await;
}

/// Serve `record` on the next `times` KV reads only.
pub async fn mount_kv_read_times(server: &MockServer, token: &str, record: Value, times: u64) {
    Mock::given(method("GET"))
        .and(path(kv2_data_path()))
        .and(header("X-Vault-Token", token))
        .respond_with(ResponseTemplate::new(200).set_body_json(kv2_read_body(record)))
        .up_to_n_times(times)
        .mount(server)
        .await;
}

/// A GitLab personal access token as returned by the rotate endpoint.
pub fn rotated_token_body(id: i64, token: &str, expires_at: &str) -> Value {
    json!({
        "id": id,
        "name": "license-exporter",
        "revoked": false,
        "created_at": "2026-01-01T00:00:00.000Z",
        "scopes": ["read_api", "api"],
        "user_id": 12,
        "last_used_at": null,
        "active": true,
        "expires_at": expires_at,
        "token": token
    })
}

/// A GitLab `/api/v4/license` payload.
pub fn gitlab_license_body(expires_at: &str) -> Value {
    json!({
        "id": 3,
        "plan": "premium",
        "created_at": "2025-06-01T08:00:00.000Z",
        "starts_at": "2025-06-01",
        "expires_at": expires_at,
        "historical_max": 180,
        "maximum_user_count": 175,
        "licensee": { "Name": "Platform Team", "Email": "platform@example.com", "Company": "Example Corp" },
        "add_ons": { "GitLab_DeployBoard": 1 },
        "expired": false,
        "overage": 0,
        "user_limit": 200,
        "active_users": 150
    })
}
