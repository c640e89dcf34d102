//! Application settings loaded from `config.toml`.
//!
//! Every section has defaults, so a missing file is not an error: the bot runs
//! with UTC day boundaries, the log-only notifier and the built-in username
//! suggestion lists. A file that exists but does not parse is reported as
//! [`Error::Config`].

use crate::errors::{Error, Result};
use chrono::{FixedOffset, NaiveDate, Offset, Utc};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// Environment variable naming an alternative config file.
pub const CONFIG_PATH_ENV: &str = "JUNKPUNK_CONFIG";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Day-boundary settings
    pub time: TimeConfig,
    /// Ledger maintenance settings
    pub ledger: LedgerConfig,
    /// Username suggestion settings
    pub usernames: UsernameConfig,
    /// Friend-request notification settings
    pub notifications: NotificationConfig,
}

/// Which clock decides what "today" is.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TimeConfig {
    /// Offset from UTC in minutes for the community's local day (e.g. `-300`)
    pub utc_offset_minutes: i32,
}

impl TimeConfig {
    /// The configured offset, or UTC when out of range.
    #[must_use]
    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes.saturating_mul(60))
            .unwrap_or_else(|| Utc.fix())
    }

    /// Today's calendar date in the configured offset.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.offset()).date_naive()
    }
}

/// Ledger maintenance settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Recompute every profile's `total_points` on start-up
    pub reconcile_on_startup: bool,
}

/// Username suggestion settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UsernameConfig {
    /// Prefixes combined as `adjective_base`
    pub adjectives: Vec<String>,
    /// Suffixes appended as `base` + number
    pub numbers: Vec<String>,
    /// Upper bound on generated candidates checked for availability
    pub max_candidates: usize,
    /// Upper bound on suggestions returned
    pub max_suggestions: usize,
}

impl Default for UsernameConfig {
    fn default() -> Self {
        Self {
            adjectives: [
                "fit", "clean", "green", "healthy", "fresh", "active", "vital", "zen", "smart",
                "bold",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            numbers: ["", "1", "7", "10", "21", "42", "77", "99"]
                .into_iter()
                .map(String::from)
                .collect(),
            max_candidates: 40,
            max_suggestions: 5,
        }
    }
}

/// Friend-request notification settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Endpoint receiving friend-request notifications; log-only when absent
    pub webhook_url: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            timeout_secs: 10,
        }
    }
}

/// Parses configuration from TOML text.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads configuration from a TOML file.
///
/// # Errors
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path = path.as_ref();
    if !path.exists() {
        info!("No config file at {}, using defaults", path.display());
        return Ok(AppConfig::default());
    }

    let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path.display()),
    })?;
    parse_config(&contents)
}

/// Loads configuration from `$JUNKPUNK_CONFIG` or `./config.toml`.
pub fn load_default_config() -> Result<AppConfig> {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "config.toml".to_string());
    load_config(path)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            [time]
            utc_offset_minutes = -300

            [ledger]
            reconcile_on_startup = true

            [usernames]
            adjectives = ["fit"]
            numbers = ["", "7"]
            max_candidates = 10
            max_suggestions = 3

            [notifications]
            webhook_url = "https://example.invalid/notify"
            timeout_secs = 5
        "#;

        let config = parse_config(toml_str).unwrap();
        assert_eq!(config.time.utc_offset_minutes, -300);
        assert_eq!(config.time.offset().local_minus_utc(), -300 * 60);
        assert!(config.ledger.reconcile_on_startup);
        assert_eq!(config.usernames.adjectives, vec!["fit".to_string()]);
        assert_eq!(config.usernames.max_suggestions, 3);
        assert_eq!(
            config.notifications.webhook_url.as_deref(),
            Some("https://example.invalid/notify")
        );
        assert_eq!(config.notifications.timeout_secs, 5);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.time.utc_offset_minutes, 0);
        assert!(!config.ledger.reconcile_on_startup);
        assert_eq!(config.usernames.adjectives.len(), 10);
        assert_eq!(config.usernames.max_candidates, 40);
        assert!(config.notifications.webhook_url.is_none());
    }

    #[test]
    fn test_invalid_config_is_error() {
        let result = parse_config("[time]\nutc_offset_minutes = \"soon\"");
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_out_of_range_offset_falls_back_to_utc() {
        let time = TimeConfig {
            utc_offset_minutes: 100_000,
        };
        assert_eq!(time.offset().local_minus_utc(), 0);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = load_config("definitely/not/here.toml").unwrap();
        assert_eq!(config.notifications.timeout_secs, 10);
    }
}
