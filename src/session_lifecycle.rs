//! Session expiry sweep
//!
//! A background task that periodically removes voting sessions older than
//! the retention threshold. It shares the store handle with the update
//! handlers and only ever touches it through the store's own lock.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::config::SweepConfig;
use crate::observability;
use crate::vote_store::VoteStore;

/// Run a single sweep and return how many sessions were removed
pub fn run_expiry_sweep(store: &VoteStore, retention: chrono::Duration) -> usize {
    let expired = store.drain_expired(retention, Utc::now());

    for session in &expired {
        info!(
            session_id = %session.id,
            title = %session.title,
            voters = session.voter_count(),
            "Removed old voting session"
        );
    }

    observability::record_sweep_metrics(expired.len(), store.len());
    expired.len()
}

/// Spawn the periodic sweep task
///
/// The first sweep runs immediately, then once per `config.interval()`.
pub fn start_expiry_sweeper(
    store: Arc<VoteStore>,
    config: SweepConfig,
) -> tokio::task::JoinHandle<()> {
    let period = config.interval();
    let retention = config.retention();

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);

        loop {
            interval.tick().await;

            let removed = run_expiry_sweep(&store, retention);
            info!(
                removed = removed,
                remaining = store.len(),
                retention_hours = retention.num_hours(),
                "Expiry sweep completed"
            );
        }
    })
}

