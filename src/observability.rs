//! Observability module for centralized metrics, tracing, and logging setup.
//!
//! This module provides:
//! - Structured logging with configurable levels and formats
//! - Metrics collection and Prometheus export
//! - Liveness and readiness endpoints

pub mod health_checks;
pub mod metrics;
pub mod tracing_mod;

use std::sync::Arc;

use anyhow::Result;

use crate::observability_config::ObservabilityConfig;
use crate::vote_store::VoteStore;

pub use self::metrics::{
    record_error_metrics, record_request_metrics, record_session_created, record_startup_metrics,
    record_sweep_metrics, record_telegram_update, record_vote_metrics,
};
pub use self::tracing_mod::{store_span, telegram_span};

/// Validate the configuration and install the log subscriber
///
/// Runs before anything else so startup failures are logged.
pub fn init_logging(config: &ObservabilityConfig) -> Result<()> {
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid observability configuration: {}", e))?;

    tracing_mod::init_tracing_with_config(config)
}

/// Install the Prometheus recorder and serve metrics and health endpoints
pub async fn init_metrics_export(config: &ObservabilityConfig, store: Arc<VoteStore>) -> Result<()> {
    if !config.enable_metrics_export {
        tracing::info!("Metrics export disabled");
        return Ok(());
    }

    let metrics_handle = metrics::init_metrics_with_config(config)?;
    metrics::start_metrics_server(metrics_handle, config.metrics_port, store).await?;

    tracing::info!(
        environment = %config.environment,
        metrics_port = %config.metrics_port,
        "Observability stack initialized successfully"
    );
    Ok(())
}
