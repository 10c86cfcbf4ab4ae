//! Tracing and logging setup module.
//!
//! This module provides:
//! - Structured logging configuration
//! - Tracing span creation utilities

use anyhow::Result;
use tracing_subscriber::prelude::*;

use crate::observability_config::ObservabilityConfig;

/// Build the log filter for the bot's targets
pub fn build_env_filter(config: &ObservabilityConfig) -> Result<tracing_subscriber::EnvFilter> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("vote_bot={}", config.log_level).parse()?)
        .add_directive("teloxide=warn".parse()?)
        .add_directive("hyper=warn".parse()?);
    Ok(filter)
}

/// Initialize structured logging with tracing and configuration
pub fn init_tracing_with_config(config: &ObservabilityConfig) -> Result<()> {
    let filter = build_env_filter(config)?;

    if config.use_pretty_logs() {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_thread_names(false),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true),
            )
            .try_init()?;
    }

    tracing::info!(
        environment = %config.environment,
        log_level = %config.log_level,
        "Tracing initialized with structured logging"
    );
    Ok(())
}

/// Create a span for Telegram bot operations
pub fn telegram_span(operation: &str, user_id: Option<u64>) -> tracing::Span {
    tracing::info_span!(
        "telegram_operation",
        operation = operation,
        user_id = user_id,
        component = "telegram"
    )
}

/// Create a span for vote store operations
pub fn store_span(operation: &str, session_id: &str) -> tracing::Span {
    tracing::debug_span!(
        "store_operation",
        operation = operation,
        session_id = session_id,
        component = "vote_store"
    )
}
