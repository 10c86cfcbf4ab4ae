//! # Unified Application Configuration
//!
//! All settings are read from environment variables at startup. The bot
//! token may also come from a local settings file in `.env` format, named by
//! `BOT_SETTINGS_FILE` (default `.env`). A missing token is fatal.

use crate::errors::{AppError, AppResult};
use crate::observability_config::ObservabilityConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

/// Environment / settings key holding the bot token
pub const BOT_TOKEN_KEY: &str = "TELEGRAM_BOT_TOKEN";

/// Default location of the local settings file
pub const DEFAULT_SETTINGS_FILE: &str = ".env";

/// Sessions older than this are removed by the expiry sweep
pub const SESSION_RETENTION_SECS: u64 = 7 * 24 * 60 * 60;

/// Bot-specific configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Telegram bot token
    pub token: String,
    /// HTTP client timeout in seconds
    pub http_timeout_secs: u64,
    /// Public bot username, used only for logging
    pub bot_username: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            http_timeout_secs: 30,
            bot_username: "PoGoVoteBot".to_string(),
        }
    }
}

impl BotConfig {
    /// Validate bot configuration
    pub fn validate(&self) -> AppResult<()> {
        if self.token.trim().is_empty() {
            return Err(AppError::MissingCredential(
                "Bot token cannot be empty".to_string(),
            ));
        }

        let Some((bot_id, secret)) = self.token.split_once(':') else {
            return Err(AppError::Config(
                "Bot token format is invalid. Expected format: 'bot_id:bot_token'".to_string(),
            ));
        };

        if bot_id.parse::<u64>().is_err() {
            return Err(AppError::Config("Bot token bot ID must be numeric".to_string()));
        }

        if secret.len() < 20 || secret.contains(':') {
            return Err(AppError::Config(
                "Bot token secret looks invalid. Please verify it's a valid token".to_string(),
            ));
        }

        if self.http_timeout_secs == 0 {
            return Err(AppError::Config("HTTP timeout cannot be 0".to_string()));
        }

        if self.http_timeout_secs > 300 {
            return Err(AppError::Config(
                "HTTP timeout cannot be greater than 300 seconds".to_string(),
            ));
        }

        Ok(())
    }
}

/// Expiry sweep settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Seconds between two sweeps
    pub interval_secs: u64,
    /// Sessions older than this many seconds are removed. Always
    /// [`SESSION_RETENTION_SECS`] outside tests.
    pub retention_secs: u64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval_secs: 24 * 60 * 60,       // daily
            retention_secs: SESSION_RETENTION_SECS,
        }
    }
}

impl SweepConfig {
    pub fn validate(&self) -> AppResult<()> {
        if self.interval_secs == 0 {
            return Err(AppError::Config("Sweep interval cannot be 0".to_string()));
        }
        if self.retention_secs == 0 {
            return Err(AppError::Config("Session retention cannot be 0".to_string()));
        }
        if self.retention_secs > i64::MAX as u64 / 1000 {
            return Err(AppError::Config("Session retention is too large".to_string()));
        }
        Ok(())
    }

    pub fn interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.interval_secs.max(1))
    }

    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.retention_secs as i64)
    }
}

/// Server configuration for health checks and metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Metrics and health server port
    pub metrics_port: u16,
    /// Whether to allow privileged ports (< 1024)
    pub allow_privileged_ports: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            metrics_port: 9090,
            allow_privileged_ports: false,
        }
    }
}

impl ServerConfig {
    /// Validate server configuration
    pub fn validate(&self) -> AppResult<()> {
        if !self.allow_privileged_ports && self.metrics_port < 1024 {
            return Err(AppError::Config(format!(
                "Metrics port {} is privileged. Set ALLOW_PRIVILEGED_PORTS=true or use port >= 1024",
                self.metrics_port
            )));
        }
        Ok(())
    }
}

/// Unified application configuration
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Bot configuration
    pub bot: BotConfig,
    /// Expiry sweep configuration
    pub sweep: SweepConfig,
    /// Server configuration
    pub server: ServerConfig,
    /// Observability configuration
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Load configuration from environment variables and the settings file
    pub fn from_env() -> AppResult<Self> {
        let mut config = Self::default();

        config.bot.token = resolve_bot_token(env::var(BOT_TOKEN_KEY).ok(), &settings_file_path())?;
        config.bot.http_timeout_secs = parse_env("HTTP_CLIENT_TIMEOUT_SECS", 30)?;
        if let Ok(username) = env::var("BOT_USERNAME") {
            config.bot.bot_username = username;
        }

        config.sweep.interval_secs =
            parse_env("SWEEP_INTERVAL_SECS", SweepConfig::default().interval_secs)?;

        config.server.metrics_port = parse_env("METRICS_PORT", 9090)?;
        config.server.allow_privileged_ports = env::var("ALLOW_PRIVILEGED_PORTS")
            .unwrap_or_else(|_| "false".to_string())
            .to_lowercase()
            == "true";

        config.observability = ObservabilityConfig::from_env();
        config.observability.metrics_port = config.server.metrics_port;

        Ok(config)
    }

    /// Validate all configuration sections
    pub fn validate(&self) -> AppResult<()> {
        self.bot.validate()?;
        self.sweep.validate()?;
        self.server.validate()?;
        self.observability.validate().map_err(AppError::Config)?;
        Ok(())
    }

    /// Get a summary of the current configuration for logging
    pub fn summary(&self) -> String {
        format!(
            "Configuration: bot_token=[REDACTED], bot_username={}, sweep_interval_secs={}, retention_secs={}, metrics_port={}",
            self.bot.bot_username,
            self.sweep.interval_secs,
            self.sweep.retention_secs,
            self.server.metrics_port
        )
    }
}

/// Path of the local settings file
pub fn settings_file_path() -> PathBuf {
    env::var("BOT_SETTINGS_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_SETTINGS_FILE))
}

/// Pick the bot token from the environment value or, failing that, the settings file
pub fn resolve_bot_token(env_value: Option<String>, settings_path: &Path) -> AppResult<String> {
    if let Some(token) = env_value.filter(|t| !t.trim().is_empty()) {
        return Ok(token.trim().to_string());
    }

    match token_from_settings_file(settings_path)? {
        Some(token) => Ok(token),
        None => Err(AppError::MissingCredential(format!(
            "{} is not set in the environment or in {}",
            BOT_TOKEN_KEY,
            settings_path.display()
        ))),
    }
}

/// Read the bot token from a `.env`-style settings file
///
/// A missing file is not an error; a file that cannot be parsed is.
pub fn token_from_settings_file(path: &Path) -> AppResult<Option<String>> {
    let entries = match dotenvy::from_path_iter(path) {
        Ok(entries) => entries,
        Err(e) if e.not_found() => return Ok(None),
        Err(e) => {
            return Err(AppError::Config(format!(
                "Failed to read settings file {}: {}",
                path.display(),
                e
            )))
        }
    };

    for entry in entries {
        let (key, value) = entry.map_err(|e| {
            AppError::Config(format!("Invalid settings file {}: {}", path.display(), e))
        })?;
        if key == BOT_TOKEN_KEY && !value.trim().is_empty() {
            return Ok(Some(value.trim().to_string()));
        }
    }

    Ok(None)
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> AppResult<T> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{} must be a valid number", key))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_TOKEN: &str = "123456789:AAFakeTokenForTestingPurposes1234567890";

    #[test]
    fn test_bot_config_validation() {
        let mut config = BotConfig::default();

        // Invalid: empty token
        assert!(matches!(config.validate(), Err(AppError::MissingCredential(_))));

        // Invalid: malformed token
        config.token = "invalid-token".to_string();
        assert!(config.validate().is_err());

        // Invalid: short token
        config.token = "123:short".to_string();
        assert!(config.validate().is_err());

        // Invalid: non-numeric bot id
        config.token = "abc:AAFakeTokenForTestingPurposes1234567890".to_string();
        assert!(config.validate().is_err());

        config.token = VALID_TOKEN.to_string();
        assert!(config.validate().is_ok());

        // Invalid: zero timeout
        config.http_timeout_secs = 0;
        assert!(config.validate().is_err());
        config.http_timeout_secs = 301;
        assert!(config.validate().is_err());
        config.http_timeout_secs = 30;

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sweep_config_defaults() {
        let config = SweepConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.retention(), chrono::Duration::days(7));
        assert_eq!(config.retention_secs, SESSION_RETENTION_SECS);
        assert_eq!(config.interval(), std::time::Duration::from_secs(86_400));
    }

    #[test]
    fn test_sweep_config_rejects_zero() {
        let config = SweepConfig {
            interval_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = SweepConfig {
            retention_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_retention_is_not_read_from_environment() {
        env::set_var(BOT_TOKEN_KEY, VALID_TOKEN);
        env::set_var("SESSION_RETENTION_SECS", "60");

        let config = AppConfig::from_env();

        env::remove_var("SESSION_RETENTION_SECS");
        env::remove_var(BOT_TOKEN_KEY);

        let config = config.unwrap();
        assert_eq!(config.sweep.retention(), chrono::Duration::days(7));
    }

    #[test]
    fn test_server_config_validation() {
        let mut config = ServerConfig::default();
        assert!(config.validate().is_ok());

        config.metrics_port = 80;
        assert!(config.validate().is_err());

        config.allow_privileged_ports = true;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_environment_token_wins() {
        let token = resolve_bot_token(
            Some(format!("  {}  ", VALID_TOKEN)),
            Path::new("/nonexistent/settings.env"),
        )
        .unwrap();
        assert_eq!(token, VALID_TOKEN);
    }

    #[test]
    fn test_missing_token_everywhere_is_credential_error() {
        let result = resolve_bot_token(None, Path::new("/nonexistent/settings.env"));
        assert!(matches!(result, Err(AppError::MissingCredential(_))));

        let result = resolve_bot_token(Some("   ".to_string()), Path::new("/nonexistent/settings.env"));
        assert!(matches!(result, Err(AppError::MissingCredential(_))));
    }

    #[test]
    fn test_summary_redacts_token() {
        let mut config = AppConfig::default();
        config.bot.token = VALID_TOKEN.to_string();
        assert!(!config.summary().contains(VALID_TOKEN));
        assert!(config.summary().contains("[REDACTED]"));
    }
}
