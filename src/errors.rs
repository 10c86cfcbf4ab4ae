//! # Application Error Types
//!
//! This module defines the error types used throughout the vote bot.
//! Only `MissingCredential` is fatal; every other variant is logged and the
//! triggering update is left unanswered.

use std::fmt;

/// General application error type for consistent error handling
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// A callback referenced a session that does not exist or has expired
    SessionNotFound(String),
    /// Callback data did not parse as `<label>|<session_id>`
    MalformedPayload(String),
    /// Callback carried neither an inline message id nor a chat message
    MissingTargetMessage(String),
    /// The bot token could not be found at startup
    MissingCredential(String),
    /// Inline query text was empty or whitespace
    BlankQuery,
    /// Configuration validation errors
    Config(String),
    /// A Telegram request failed
    Network(String),
}

impl AppError {
    /// Short, stable name used as a metrics label
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::SessionNotFound(_) => "session_not_found",
            AppError::MalformedPayload(_) => "malformed_payload",
            AppError::MissingTargetMessage(_) => "missing_target_message",
            AppError::MissingCredential(_) => "missing_credential",
            AppError::BlankQuery => "blank_query",
            AppError::Config(_) => "config",
            AppError::Network(_) => "network",
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::SessionNotFound(id) => write!(f, "[SESSION] No voting session found for id {}", id),
            AppError::MalformedPayload(data) => write!(f, "[PAYLOAD] Malformed callback data: {:?}", data),
            AppError::MissingTargetMessage(msg) => write!(f, "[TARGET] {}", msg),
            AppError::MissingCredential(msg) => write!(f, "[CREDENTIAL] {}", msg),
            AppError::BlankQuery => write!(f, "[QUERY] Inline query text is empty"),
            AppError::Config(msg) => write!(f, "[CONFIG] {}", msg),
            AppError::Network(msg) => write!(f, "[NETWORK] {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<teloxide::RequestError> for AppError {
    fn from(err: teloxide::RequestError) -> Self {
        AppError::Network(err.to_string())
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// Standardized error logging utilities for consistent error reporting across the application
pub mod error_logging {
    use tracing::error;

    /// Log an update that was dropped because of a recoverable error
    pub fn log_dropped_update(
        error: &super::AppError,
        operation: &str,
        user_id: Option<u64>,
        update_id: Option<&str>,
    ) {
        crate::observability::record_error_metrics(error.kind(), operation);
        error!(
            error = %error,
            error_kind = error.kind(),
            operation = %operation,
            user_id = ?user_id,
            update_id = ?update_id,
            "Update dropped without reply"
        );
    }

    /// Log network/communication errors with connection context
    pub fn log_network_error(
        error: &impl std::fmt::Display,
        operation: &str,
        user_id: Option<u64>,
    ) {
        crate::observability::record_error_metrics("network", operation);
        error!(
            error = %error,
            operation = %operation,
            user_id = ?user_id,
            "Telegram request failed"
        );
    }

    /// Log configuration errors during startup/initialization
    pub fn log_config_error(
        error: &impl std::fmt::Display,
        config_key: &str,
        operation: &str,
    ) {
        error!(
            error = %error,
            config_key = %config_key,
            operation = %operation,
            "Configuration error"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_carries_category() {
        let err = AppError::SessionNotFound("q1".to_string());
        assert_eq!(err.to_string(), "[SESSION] No voting session found for id q1");

        let err = AppError::MalformedPayload("vote_red".to_string());
        assert_eq!(err.to_string(), "[PAYLOAD] Malformed callback data: \"vote_red\"");

        assert_eq!(AppError::BlankQuery.to_string(), "[QUERY] Inline query text is empty");
    }

    #[test]
    fn test_error_kinds_are_distinct() {
        let errors = [
            AppError::SessionNotFound(String::new()),
            AppError::MalformedPayload(String::new()),
            AppError::MissingTargetMessage(String::new()),
            AppError::MissingCredential(String::new()),
            AppError::BlankQuery,
            AppError::Config(String::new()),
            AppError::Network(String::new()),
        ];
        let kinds: std::collections::HashSet<_> = errors.iter().map(|e| e.kind()).collect();
        assert_eq!(kinds.len(), errors.len());
    }

    #[test]
    fn test_request_error_conversion_is_network() {
        let err: AppError = teloxide::RequestError::Api(teloxide::ApiError::BotBlocked).into();
        assert!(matches!(err, AppError::Network(_)));
        assert_eq!(err.kind(), "network");
        assert!(err.to_string().starts_with("[NETWORK]"));
    }
}
