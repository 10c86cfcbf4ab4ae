//! Health check functionality module.
//!
//! Readiness here only means the in-memory store answers; there are no
//! external dependencies to probe.

use serde::Serialize;

use crate::vote_store::VoteStore;

/// Body of the `/health/ready` response
#[derive(Debug, Clone, Serialize)]
pub struct ReadinessReport {
    pub status: &'static str,
    pub active_sessions: usize,
}

/// Build the readiness report for the current store
pub fn readiness_report(store: &VoteStore) -> ReadinessReport {
    ReadinessReport {
        status: "ready",
        active_sessions: store.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_readiness_counts_sessions() {
        let store = VoteStore::new();
        assert_eq!(readiness_report(&store).active_sessions, 0);

        store.create_session("a", "A");
        store.create_session("b", "B");
        let report = readiness_report(&store);
        assert_eq!(report.status, "ready");
        assert_eq!(report.active_sessions, 2);
    }
}
