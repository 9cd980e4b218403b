//! In-memory fakes for exercising the scheduler without Vault or GitLab.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Days, NaiveDate, Utc};

use super::TokenAuthority;
use crate::credential::Credential;
use crate::errors::{ExporterError, Result};
use crate::gitlab::GitLabError;
use crate::licenses::{LicenseSnapshot, LicenseSource, Platform};
use crate::secrets::{self, CredentialStore, KvPath, SecretsError};

pub(crate) fn days_from_today(days: i64) -> NaiveDate {
    let today = Utc::now().date_naive();
    if days >= 0 {
        today.checked_add_days(Days::new(days as u64)).unwrap()
    } else {
        today.checked_sub_days(Days::new(days.unsigned_abs())).unwrap()
    }
}

/// Consume one unit of an injected failure budget.
fn take_failure(budget: &AtomicUsize) -> bool {
    budget.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1)).is_ok()
}

#[derive(Default)]
pub(crate) struct MemoryStore {
    records: Mutex<HashMap<String, Credential>>,
    pub reads: AtomicUsize,
    pub writes: AtomicUsize,
    pub fail_reads: AtomicUsize,
    pub fail_writes: AtomicUsize,
    pub malformed_reads: AtomicUsize,
    /// When set, reads return this instead of the stored record.
    frozen: Mutex<Option<Credential>>,
}

impl MemoryStore {
    pub fn with_record(path: &KvPath, credential: Credential) -> Self {
        let store = Self::default();
        store.records.lock().unwrap().insert(path.to_string(), credential);
        store
    }

    pub fn record(&self, path: &KvPath) -> Option<Credential> {
        self.records.lock().unwrap().get(&path.to_string()).cloned()
    }

    pub fn fail_next_reads(&self, n: usize) {
        self.fail_reads.store(n, Ordering::SeqCst);
    }

    pub fn fail_next_writes(&self, n: usize) {
        self.fail_writes.store(n, Ordering::SeqCst);
    }

    /// The next `n` reads fail as if the record lacked its token.
    pub fn malform_next_reads(&self, n: usize) {
        self.malformed_reads.store(n, Ordering::SeqCst);
    }

    /// Keep serving the record currently at `path`, ignoring later writes.
    pub fn freeze_reads(&self, path: &KvPath) {
        *self.frozen.lock().unwrap() = self.record(path);
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn authenticate(&self) -> secrets::Result<()> {
        Ok(())
    }

    async fn read(&self, path: &KvPath) -> secrets::Result<Credential> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if take_failure(&self.fail_reads) {
            return Err(SecretsError::connection_failed("injected read failure"));
        }
        if take_failure(&self.malformed_reads) {
            return Err(SecretsError::missing_field(path.to_string(), "token"));
        }
        if let Some(frozen) = self.frozen.lock().unwrap().clone() {
            return Ok(frozen);
        }
        self.record(path).ok_or_else(|| SecretsError::not_found(path.to_string()))
    }

    async fn write(&self, path: &KvPath, credential: &Credential) -> secrets::Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if take_failure(&self.fail_writes) {
            return Err(SecretsError::connection_failed("injected write failure"));
        }
        self.records.lock().unwrap().insert(path.to_string(), credential.clone());
        Ok(())
    }
}

/// Client bound to one credential; reports the token id as a license label
/// so tests can tell which client published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FakeClient {
    pub credential_id: i64,
    pub token: String,
}

#[async_trait]
impl LicenseSource for FakeClient {
    fn platform(&self) -> Platform {
        Platform::GitLab
    }

    async fn fetch(&self) -> crate::licenses::Result<LicenseSnapshot> {
        Ok(LicenseSnapshot {
            platform: Platform::GitLab,
            labels: vec![("token_id", self.credential_id.to_string())],
            days_until_expiry: 100,
        })
    }
}

pub(crate) struct FakeAuthority {
    pub rotations: AtomicUsize,
    pub fail_rotations: AtomicUsize,
    next_id: AtomicI64,
    /// Ids rotated, in order, with the token of the client used.
    pub calls: Mutex<Vec<(i64, String)>>,
}

impl FakeAuthority {
    pub fn new(next_id: i64) -> Self {
        Self {
            rotations: AtomicUsize::new(0),
            fail_rotations: AtomicUsize::new(0),
            next_id: AtomicI64::new(next_id),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_next_rotations(&self, n: usize) {
        self.fail_rotations.store(n, Ordering::SeqCst);
    }

    pub fn rotation_count(&self) -> usize {
        self.rotations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenAuthority for FakeAuthority {
    type Client = FakeClient;

    fn new_client(&self, credential: &Credential) -> FakeClient {
        FakeClient {
            credential_id: credential.id,
            token: credential.value.expose_secret().to_string(),
        }
    }

    async fn rotate(&self, client: &FakeClient, id: i64, new_expiry: NaiveDate) -> Result<Credential> {
        self.rotations.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push((id, client.token.clone()));
        if take_failure(&self.fail_rotations) {
            return Err(ExporterError::GitLab(GitLabError::unexpected_status(
                format!("/api/v4/personal_access_tokens/{}/rotate", id),
                503,
                "unavailable",
            )));
        }

        let new_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(Credential::new(new_id, format!("glpat-{}", new_id), new_expiry, true))
    }
}
