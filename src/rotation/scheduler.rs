//! The refresh loop: check expiry, rotate when due, swap the shared client,
//! then publish licenses with whichever client is current.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use futures::future::join_all;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use super::{ClientSlot, RotationPolicy, TokenAuthority};
use crate::credential::Credential;
use crate::licenses::{LicensePublisher, LicenseSource};
use crate::observability::{MetricsRegistry, RotationStatus};
use crate::secrets::{CredentialStore, KvPath};

/// Where the scheduler is within a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Checking,
    Rotating,
    Swapping,
}

/// What one tick did about the credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Outside the rotation window.
    Fresh { days_left: i64 },
    /// A new client is installed.
    Rotated { id: i64, expires_at: NaiveDate },
    /// The rotate call failed; the old credential is still current.
    RotationFailed,
    /// GitLab rotated the token but it is not yet stored or re-read.
    ReconcilePending,
}

/// Work left over from a rotation that did not finish.
#[derive(Debug)]
enum Pending {
    /// Rotated but not written. Retrying the rotation would revoke this token
    /// before anyone stored it, so the write is retried instead.
    Write(Credential),
    /// Written but not read back. Holds the rotate response in case the
    /// store keeps serving an older record.
    Reload(Credential),
}

/// Result of [`RefreshScheduler::tick`].
#[derive(Debug)]
pub struct TickReport {
    pub outcome: TickOutcome,
    /// License refreshes started by the tick. Dropping them detaches the tasks.
    pub dispatched: Vec<JoinHandle<()>>,
}

impl TickReport {
    /// Wait for every dispatched refresh.
    pub async fn join(self) -> TickOutcome {
        for result in join_all(self.dispatched).await {
            if let Err(e) = result {
                warn!(error = %e, "License refresh task failed");
            }
        }
        self.outcome
    }
}

/// Owns the current credential and is the only writer of the client slot.
pub struct RefreshScheduler<S, A>
where
    S: CredentialStore,
    A: TokenAuthority,
{
    store: Arc<S>,
    authority: Arc<A>,
    slot: Arc<ClientSlot<A::Client>>,
    path: KvPath,
    policy: RotationPolicy,
    publisher: LicensePublisher,
    credential: Credential,
    pending: Option<Pending>,
    state: SchedulerState,
}

impl<S, A> RefreshScheduler<S, A>
where
    S: CredentialStore,
    A: TokenAuthority,
    A::Client: LicenseSource,
{
    /// `slot` must already hold a client built from `credential`.
    pub fn new(
        store: Arc<S>,
        authority: Arc<A>,
        slot: Arc<ClientSlot<A::Client>>,
        path: KvPath,
        policy: RotationPolicy,
        credential: Credential,
        publisher: LicensePublisher,
    ) -> Self {
        Self {
            store,
            authority,
            slot,
            path,
            policy,
            publisher,
            credential,
            pending: None,
            state: SchedulerState::Idle,
        }
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn slot(&self) -> &Arc<ClientSlot<A::Client>> {
        &self.slot
    }

    pub fn policy(&self) -> &RotationPolicy {
        &self.policy
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    fn metrics(&self) -> &MetricsRegistry {
        self.publisher.metrics()
    }

    fn transition(&mut self, next: SchedulerState) {
        debug!(from = ?self.state, to = ?next, "Scheduler state change");
        self.state = next;
    }

    /// Run one tick: settle the credential, then dispatch license refreshes
    /// using the client that is current afterwards.
    pub async fn tick(&mut self) -> TickReport {
        let outcome = self.evaluate(Utc::now()).await;
        let primary: Arc<dyn LicenseSource> = self.slot.current().await;
        let dispatched = self.publisher.dispatch(primary);
        TickReport { outcome, dispatched }
    }

    /// Decide on and carry out rotation as of `now`. Never fails; problems
    /// are logged and retried on the next tick.
    pub async fn evaluate(&mut self, now: DateTime<Utc>) -> TickOutcome {
        self.transition(SchedulerState::Checking);

        let outcome = match self.pending.take() {
            Some(Pending::Write(rotated)) => {
                info!(id = rotated.id, path = %self.path, "Retrying write of rotated credential");
                self.persist(rotated, now).await
            }
            Some(Pending::Reload(rotated)) => {
                info!(id = rotated.id, path = %self.path, "Retrying read of rotated credential");
                self.reload(rotated, now).await
            }
            None => self.check(now).await,
        };

        self.transition(SchedulerState::Idle);
        outcome
    }

    async fn check(&mut self, now: DateTime<Utc>) -> TickOutcome {
        let days_left = self.credential.expiry_distance(now);
        self.metrics().set_credential_days_until_expiry(days_left);

        if !self.policy.is_due(days_left) {
            debug!(
                id = self.credential.id,
                days_left,
                threshold_days = self.policy.threshold_days,
                "Credential outside rotation window"
            );
            return TickOutcome::Fresh { days_left };
        }

        self.transition(SchedulerState::Rotating);
        let new_expiry = self.policy.new_expiry(now);
        info!(
            id = self.credential.id,
            days_left,
            new_expiry = %new_expiry,
            "Credential within rotation window, rotating"
        );

        let client = self.slot.current().await;
        let result = self.authority.rotate(&client, self.credential.id, new_expiry).await;
        match result {
            Ok(rotated) => self.persist(rotated, now).await,
            Err(e) => {
                error!(
                    id = self.credential.id,
                    error = %e,
                    "Credential rotation failed, keeping current client"
                );
                self.metrics().record_rotation(RotationStatus::RotateFailed);
                TickOutcome::RotationFailed
            }
        }
    }

    async fn persist(&mut self, rotated: Credential, now: DateTime<Utc>) -> TickOutcome {
        if let Err(e) = self.store.write(&self.path, &rotated).await {
            error!(
                id = rotated.id,
                path = %self.path,
                error = %e,
                "Failed to store rotated credential, will retry the write next tick"
            );
            self.metrics().record_rotation(RotationStatus::PersistFailed);
            self.pending = Some(Pending::Write(rotated));
            return TickOutcome::ReconcilePending;
        }

        info!(id = rotated.id, path = %self.path, "Rotated credential stored");
        self.reload(rotated, now).await
    }

    /// Read back what was written. A matching record is authoritative; a
    /// record with any other id predates the rotation and its token is
    /// already revoked, so the rotate response is installed instead.
    async fn reload(&mut self, rotated: Credential, now: DateTime<Utc>) -> TickOutcome {
        let result = self.store.read(&self.path).await;
        match result {
            Ok(canonical) if canonical.id == rotated.id => self.install(canonical, now).await,
            Ok(stale) => {
                warn!(
                    expected_id = rotated.id,
                    stored_id = stale.id,
                    path = %self.path,
                    "Stored credential predates the rotation, installing the rotation result"
                );
                self.install(rotated, now).await
            }
            Err(e) => {
                warn!(
                    id = rotated.id,
                    path = %self.path,
                    error = %e,
                    "Failed to read back rotated credential, keeping current client"
                );
                self.metrics().record_rotation(RotationStatus::ReloadFailed);
                self.pending = Some(Pending::Reload(rotated));
                TickOutcome::ReconcilePending
            }
        }
    }

    async fn install(&mut self, credential: Credential, now: DateTime<Utc>) -> TickOutcome {
        self.transition(SchedulerState::Swapping);

        let client = Arc::new(self.authority.new_client(&credential));
        self.slot.swap(client).await;

        let outcome = TickOutcome::Rotated { id: credential.id, expires_at: credential.expires_at };
        info!(
            id = credential.id,
            expires_at = %credential.expires_at_string(),
            "Installed client for rotated credential"
        );
        self.metrics().record_rotation(RotationStatus::Success);
        self.metrics().set_credential_days_until_expiry(credential.expiry_distance(now));
        self.credential = credential;
        outcome
    }

    /// Tick every `check_interval` until `shutdown` resolves. The first tick
    /// runs immediately. License refreshes are left to finish on their own.
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(self.policy.check_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!(
            interval_secs = self.policy.check_interval.as_secs(),
            threshold_days = self.policy.threshold_days,
            "Refresh scheduler started"
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown signal received, stopping refresh scheduler");
                    break;
                }
                _ = ticker.tick() => {
                    let report = self.tick().await;
                    debug!(
                        outcome = ?report.outcome,
                        refreshes = report.dispatched.len(),
                        "Tick complete"
                    );
                }
            }
        }
    }
}
