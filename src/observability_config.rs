//! # Observability Configuration
//!
//! Environment-specific settings for logging and metrics export.

use std::env;

/// Observability configuration for different environments
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Environment name (development, staging, production)
    pub environment: String,
    /// Prometheus metrics endpoint port
    pub metrics_port: u16,
    /// Log level for the bot's own targets
    pub log_level: String,
    /// `json` or `pretty`
    pub log_format: String,
    /// Whether to serve metrics over HTTP
    pub enable_metrics_export: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            metrics_port: 9090,
            log_level: "info".to_string(),
            log_format: "json".to_string(),
            enable_metrics_export: true,
        }
    }
}

impl ObservabilityConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            metrics_port: env::var("METRICS_PORT")
                .unwrap_or_else(|_| "9090".to_string())
                .parse()
                .unwrap_or(9090),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string()),
            enable_metrics_export: env::var("ENABLE_METRICS_EXPORT")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
        }
    }

    /// Check if running in development environment
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Pretty logs in development or when asked for explicitly
    pub fn use_pretty_logs(&self) -> bool {
        self.is_development() || self.log_format == "pretty"
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!("Invalid log level: {}", self.log_level));
        }

        if !["json", "pretty"].contains(&self.log_format.as_str()) {
            return Err(format!("Invalid log format: {}", self.log_format));
        }

        if self.metrics_port == 0 {
            return Err("Metrics port cannot be 0".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ObservabilityConfig::default();
        assert!(config.is_development());
        assert!(config.use_pretty_logs());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_production_uses_json_logs() {
        let config = ObservabilityConfig {
            environment: "production".to_string(),
            ..Default::default()
        };
        assert!(!config.is_development());
        assert!(!config.use_pretty_logs());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ObservabilityConfig::default();

        config.log_level = "verbose".to_string();
        assert!(config.validate().is_err());
        config.log_level = "debug".to_string();

        config.log_format = "xml".to_string();
        assert!(config.validate().is_err());
        config.log_format = "pretty".to_string();

        config.metrics_port = 0;
        assert!(config.validate().is_err());
    }
}
