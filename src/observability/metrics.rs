//! # Metrics Collection
//!
//! Prometheus metrics for license state and credential rotation. The registry
//! is created once at startup and handed to everything that records, instead
//! of living in a process-wide global.

use std::net::SocketAddr;
use std::sync::Arc;

use ::tracing::{error, info};
use metrics::{counter, describe_counter, describe_gauge, gauge, Unit};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusRecorder};

use crate::config::ObservabilityConfig;
use crate::errors::{ExporterError, Result};
use crate::licenses::{LicenseSnapshot, Platform};

const ROTATIONS_TOTAL: &str = "credential_rotations_total";
const CREDENTIAL_DAYS: &str = "credential_days_until_expiry";
const LICENSE_REFRESH_TOTAL: &str = "license_refresh_total";

/// Outcome label for `credential_rotations_total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationStatus {
    Success,
    RotateFailed,
    PersistFailed,
    ReloadFailed,
}

impl RotationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RotationStatus::Success => "success",
            RotationStatus::RotateFailed => "rotate_failed",
            RotationStatus::PersistFailed => "persist_failed",
            RotationStatus::ReloadFailed => "reload_failed",
        }
    }
}

/// Registry that owns the Prometheus recorder.
pub struct MetricsRegistry {
    recorder: PrometheusRecorder,
}

impl std::fmt::Debug for MetricsRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsRegistry").finish_non_exhaustive()
    }
}

impl MetricsRegistry {
    pub fn new(recorder: PrometheusRecorder) -> Self {
        let registry = Self { recorder };
        registry.describe();
        registry
    }

    /// A registry with no HTTP listener. Used when the port is 0 and in tests.
    pub fn detached() -> Self {
        Self::new(PrometheusBuilder::new().build_recorder())
    }

    /// Render the current exposition text.
    pub fn render(&self) -> String {
        self.recorder.handle().render()
    }

    fn describe(&self) {
        metrics::with_local_recorder(&self.recorder, || {
            describe_counter!(
                ROTATIONS_TOTAL,
                Unit::Count,
                "Credential rotation attempts by outcome"
            );
            describe_gauge!(
                CREDENTIAL_DAYS,
                "Whole days until the rotating credential expires"
            );
            describe_counter!(
                LICENSE_REFRESH_TOTAL,
                Unit::Count,
                "License refresh attempts by platform and outcome"
            );
            for platform in [Platform::GitLab, Platform::Nexus, Platform::Sonar] {
                describe_gauge!(platform.info_metric(), "License metadata, always 1");
                describe_gauge!(
                    platform.days_until_expiry_metric(),
                    "Days until the platform license expires"
                );
            }
        });
    }

    /// Publish a license snapshot: the info gauge set to 1 with every label,
    /// and the unlabelled days-until-expiry gauge.
    pub fn record_license(&self, snapshot: &LicenseSnapshot) {
        let platform = snapshot.platform;
        metrics::with_local_recorder(&self.recorder, || {
            gauge!(platform.info_metric(), &snapshot.labels).set(1.0);
            gauge!(platform.days_until_expiry_metric()).set(snapshot.days_until_expiry as f64);
        });
    }

    /// Count a license refresh attempt
    pub fn record_license_refresh(&self, platform: Platform, success: bool) {
        let status = if success { "success" } else { "error" };
        let labels = [("platform", platform.as_str().to_string()), ("status", status.to_string())];
        metrics::with_local_recorder(&self.recorder, || {
            counter!(LICENSE_REFRESH_TOTAL, &labels).increment(1);
        });
    }

    /// Count a credential rotation attempt
    pub fn record_rotation(&self, status: RotationStatus) {
        let labels = [("status", status.as_str().to_string())];
        metrics::with_local_recorder(&self.recorder, || {
            counter!(ROTATIONS_TOTAL, &labels).increment(1);
        });
    }

    /// Update the credential expiry gauge
    pub fn set_credential_days_until_expiry(&self, days: i64) {
        metrics::with_local_recorder(&self.recorder, || {
            gauge!(CREDENTIAL_DAYS).set(days as f64);
        });
    }
}

/// Build the metrics registry and, when a port is configured, start the
/// Prometheus scrape endpoint on it.
pub async fn init_metrics(config: &ObservabilityConfig) -> Result<Arc<MetricsRegistry>> {
    let Some(metrics_addr) = config.metrics_bind_address() else {
        info!("Metrics endpoint disabled; recording without a listener");
        return Ok(Arc::new(MetricsRegistry::detached()));
    };

    let socket_addr: SocketAddr = metrics_addr.parse().map_err(|e| {
        ExporterError::config(format!("Invalid metrics bind address '{}': {}", metrics_addr, e))
    })?;

    let (recorder, exporter) = PrometheusBuilder::new()
        .with_http_listener(socket_addr)
        .build()
        .map_err(|e| ExporterError::metrics(format!("Failed to initialize metrics exporter: {}", e)))?;

    tokio::spawn(async move {
        // The exporter's error type implements neither Debug nor Display.
        if exporter.await.is_err() {
            error!(%socket_addr, "Metrics exporter stopped");
        }
    });

    info!(
        metrics_addr = %metrics_addr,
        service_name = %config.service_name,
        "Metrics collection initialized"
    );

    Ok(Arc::new(MetricsRegistry::new(recorder)))
}
