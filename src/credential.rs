//! The active GitLab personal access token as held in memory.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::secrets::SecretString;

/// Format used for `expires_at` in the stored record and the GitLab API.
pub const EXPIRY_DATE_FORMAT: &str = "%Y-%m-%d";

const SECONDS_PER_DAY: i64 = 86_400;

/// A personal access token and its metadata.
///
/// Instances are never mutated. A rotation produces a new `Credential`, and the
/// old one is dropped (and its token zeroed) once the replacement client is
/// installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    /// Identifier assigned by GitLab. Changes on every rotation.
    pub id: i64,
    /// The bearer token itself.
    pub value: SecretString,
    /// Calendar date on which GitLab stops accepting the token.
    pub expires_at: NaiveDate,
    /// Informational flag carried through from the store.
    pub active: bool,
}

impl Credential {
    pub fn new(id: i64, value: impl Into<SecretString>, expires_at: NaiveDate, active: bool) -> Self {
        Self { id, value: value.into(), expires_at, active }
    }

    /// Whole days until expiry, rounded toward negative infinity.
    ///
    /// `expires_at` is read as 00:00:00 UTC of that date, so a token expiring
    /// tomorrow reports 0 for any time after midnight today, and an expired
    /// token reports a negative distance.
    pub fn expiry_distance(&self, now: DateTime<Utc>) -> i64 {
        let expires = self.expires_at.and_time(NaiveTime::MIN).and_utc();
        (expires - now).num_seconds().div_euclid(SECONDS_PER_DAY)
    }

    /// `expires_at` rendered as `YYYY-MM-DD`.
    pub fn expires_at_string(&self) -> String {
        self.expires_at.format(EXPIRY_DATE_FORMAT).to_string()
    }
}

/// Parse a `YYYY-MM-DD` expiry date.
pub fn parse_expiry_date(raw: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(raw.trim(), EXPIRY_DATE_FORMAT)
}
