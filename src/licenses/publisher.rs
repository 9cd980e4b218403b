use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::LicenseSource;
use crate::observability::MetricsRegistry;

/// Publishes every configured license source into the metrics registry.
///
/// Each tick spawns one task per source so a slow or failing platform never
/// delays the others or the credential check. A failed fetch leaves the
/// previous gauge values in place.
#[derive(Clone)]
pub struct LicensePublisher {
    sources: Vec<Arc<dyn LicenseSource>>,
    metrics: Arc<MetricsRegistry>,
}

impl LicensePublisher {
    pub fn new(metrics: Arc<MetricsRegistry>) -> Self {
        Self { sources: Vec::new(), metrics }
    }

    /// Add a source polled with static credentials.
    pub fn with_source(mut self, source: Arc<dyn LicenseSource>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    /// Spawn one refresh per source, plus `primary`, which is the client
    /// bound to the current rotating credential.
    pub fn dispatch(&self, primary: Arc<dyn LicenseSource>) -> Vec<JoinHandle<()>> {
        std::iter::once(primary)
            .chain(self.sources.iter().cloned())
            .map(|source| {
                let metrics = Arc::clone(&self.metrics);
                tokio::spawn(async move { refresh(source.as_ref(), &metrics).await })
            })
            .collect()
    }
}

impl std::fmt::Debug for LicensePublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let platforms: Vec<_> = self.sources.iter().map(|s| s.platform()).collect();
        f.debug_struct("LicensePublisher").field("sources", &platforms).finish()
    }
}

async fn refresh(source: &dyn LicenseSource, metrics: &MetricsRegistry) {
    let platform = source.platform();
    match source.fetch().await {
        Ok(snapshot) => {
            debug!(%platform, days_until_expiry = snapshot.days_until_expiry, "License refreshed");
            metrics.record_license(&snapshot);
            metrics.record_license_refresh(platform, true);
        }
        Err(e) => {
            warn!(%platform, error = %e, "Failed to refresh license");
            metrics.record_license_refresh(platform, false);
        }
    }
}
