//! # Observability Infrastructure
//!
//! Structured logging and the Prometheus metrics registry.

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, log_config_info};
pub use metrics::{init_metrics, MetricsRegistry, RotationStatus};
