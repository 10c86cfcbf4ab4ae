//! # Observability Tests Module
//!
//! Metrics recording and span helpers must be safe to call without a
//! recorder or subscriber installed.

#[cfg(test)]
mod tests {
    use std::time::Duration;
    use vote_bot::errors::{error_logging, AppError};
    use vote_bot::observability;
    use vote_bot::vote_store::ChoiceLabel;

    #[test]
    fn test_metrics_recording_without_recorder() {
        observability::record_telegram_update("inline_query");
        observability::record_telegram_update("callback_query");
        observability::record_vote_metrics(&ChoiceLabel::Red, true);
        observability::record_vote_metrics(&ChoiceLabel::from("vote_green"), false);
        observability::record_session_created(3);
        observability::record_sweep_metrics(2, 1);
        observability::record_request_metrics("telegram_callback", 200, Duration::from_millis(25));
        observability::record_error_metrics("session_not_found", "callback_query");
        observability::record_startup_metrics(Duration::from_millis(120));
    }

    #[test]
    fn test_span_creation() {
        let telegram_span = observability::telegram_span("callback_query", Some(12345));
        let _enter = telegram_span.enter();
        let store_span = observability::store_span("register_vote", "q1");
        let _enter_store = store_span.enter();
    }

    #[test]
    fn test_error_logging_helpers() {
        error_logging::log_dropped_update(
            &AppError::SessionNotFound("q1".to_string()),
            "callback_query",
            Some(1),
            Some("cb-1"),
        );
        error_logging::log_network_error(&"timeout", "edit_vote_message", None);
        error_logging::log_config_error(
            &AppError::MissingCredential("no token".to_string()),
            "TELEGRAM_BOT_TOKEN",
            "load_config",
        );
    }
}
