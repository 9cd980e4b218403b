//! Conversion between the stored `{id, expires_at, active, token}` record and
//! [`Credential`].
//!
//! Records written by older tooling are not consistently typed: `id` shows up
//! as a string, an integer or a float, and `active` as a string or a bool.
//! Reads normalize all of these. Writes always emit the canonical shape.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

use super::error::{Result, SecretsError};
use crate::credential::{parse_expiry_date, Credential};

pub const FIELD_ID: &str = "id";
pub const FIELD_EXPIRES_AT: &str = "expires_at";
pub const FIELD_ACTIVE: &str = "active";
pub const FIELD_TOKEN: &str = "token";

/// Raw KV v2 payload as returned by the store.
pub type RawRecord = HashMap<String, Value>;

/// Canonical shape written back to the store.
#[derive(Debug, Serialize)]
pub struct CredentialRecord<'a> {
    pub id: i64,
    pub expires_at: String,
    pub active: bool,
    pub token: &'a str,
}

impl<'a> From<&'a Credential> for CredentialRecord<'a> {
    fn from(credential: &'a Credential) -> Self {
        Self {
            id: credential.id,
            expires_at: credential.expires_at_string(),
            active: credential.active,
            token: credential.value.expose_secret(),
        }
    }
}

/// Build a [`Credential`] from a raw record read at `key`.
pub fn credential_from_record(key: &str, record: &RawRecord) -> Result<Credential> {
    let id = coerce_id(key, field(key, record, FIELD_ID)?)?;

    let expires_raw = expect_str(key, FIELD_EXPIRES_AT, field(key, record, FIELD_EXPIRES_AT)?)?;
    let expires_at = parse_expiry_date(expires_raw).map_err(|e| {
        SecretsError::invalid_field(
            key,
            FIELD_EXPIRES_AT,
            format!("'{}' is not a YYYY-MM-DD date: {}", expires_raw, e),
        )
    })?;

    let active = coerce_bool(key, FIELD_ACTIVE, field(key, record, FIELD_ACTIVE)?)?;
    let token = expect_str(key, FIELD_TOKEN, field(key, record, FIELD_TOKEN)?)?;

    Ok(Credential::new(id, token, expires_at, active))
}

fn field<'r>(key: &str, record: &'r RawRecord, name: &str) -> Result<&'r Value> {
    record.get(name).ok_or_else(|| SecretsError::missing_field(key, name))
}

fn expect_str<'v>(key: &str, name: &str, value: &'v Value) -> Result<&'v str> {
    value.as_str().ok_or_else(|| {
        SecretsError::invalid_field(key, name, format!("expected a string, got {}", type_name(value)))
    })
}

/// Normalize `"42"`, `42` and `42.0` to `42`.
pub fn coerce_id(key: &str, value: &Value) -> Result<i64> {
    let invalid = |reason: String| SecretsError::invalid_field(key, FIELD_ID, reason);

    match value {
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|e| invalid(format!("'{}' is not an integer: {}", s, e))),
        Value::Number(n) => {
            if let Some(id) = n.as_i64() {
                return Ok(id);
            }
            match n.as_f64() {
                // i64::MAX as f64 rounds up to 2^63, which is out of range.
                Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
                    Ok(f as i64)
                }
                _ => Err(invalid(format!("{} is not an integral id", n))),
            }
        }
        other => Err(invalid(format!("unexpected type {}", type_name(other)))),
    }
}

/// Accept a bool or any of the conventional boolean spellings.
pub fn coerce_bool(key: &str, name: &str, value: &Value) -> Result<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::String(s) => match s.as_str() {
            "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
            "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
            _ => Err(SecretsError::invalid_field(key, name, format!("'{}' is not a boolean", s))),
        },
        other => Err(SecretsError::invalid_field(
            key,
            name,
            format!("unexpected type {}", type_name(other)),
        )),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
