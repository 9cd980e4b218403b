//! Redacting wrapper for bearer tokens and passwords.

use serde::{Serialize, Serializer};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

const REDACTED: &str = "[REDACTED]";

/// A string whose contents never reach logs, metrics labels or serialized output.
///
/// `Debug`, `Display` and `Serialize` all print `[REDACTED]`. The buffer is
/// zeroed when the value is dropped. Callers that need the raw value (an HTTP
/// header, a Vault payload) must go through [`SecretString::expose_secret`].
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Borrow the raw value. Never log the result.
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for SecretString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(REDACTED)
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretString({})", REDACTED)
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl PartialEq for SecretString {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for SecretString {}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_and_display_redact() {
        let secret = SecretString::new("glpat-abcdef");
        assert_eq!(format!("{:?}", secret), "SecretString([REDACTED])");
        assert_eq!(secret.to_string(), "[REDACTED]");
    }

    #[test]
    fn test_serialization_redacts_inside_structs() {
        #[derive(Serialize)]
        struct Record {
            id: i64,
            token: SecretString,
        }

        let json = serde_json::to_string(&Record { id: 7, token: "glpat-abcdef".into() }).unwrap();
        assert_eq!(json, r#"{"id":7,"token":"[REDACTED]"}"#);
    }

    #[test]
    fn test_expose_secret() {
        let secret = SecretString::from("glpat-abcdef".to_string());
        assert_eq!(secret.expose_secret(), "glpat-abcdef");
        assert!(!secret.is_empty());
        assert!(SecretString::new("").is_empty());
    }
}
