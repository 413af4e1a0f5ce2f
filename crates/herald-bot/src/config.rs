//! Application configuration loaded from environment variables.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Bot identity and parsing configuration
    #[serde(default)]
    pub bot: BotConfig,

    /// Dialog/collector limits
    #[serde(default)]
    pub dialog: DialogConfig,

    /// Ignore lists applied by the middleware chain
    #[serde(default)]
    pub ignore: IgnoreConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Command prefix
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Secondary prefix honored alongside the main one
    #[serde(default)]
    pub admin_prefix: Option<String>,

    /// Language for engine notices
    #[serde(default = "default_lang")]
    pub lang: String,

    /// Comma-separated identities that bypass permission and cooldown gates
    #[serde(default)]
    pub admins: String,

    /// Platform message length limit, replies are chunked over it
    #[serde(default = "default_max_message_len")]
    pub max_message_len: usize,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DialogConfig {
    /// How long a dialog step waits for an answer
    #[serde(default = "default_dialog_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    /// Answers (valid or not) allowed per dialog step
    #[serde(default = "default_dialog_tries")]
    pub tries: usize,

    /// Literal word that aborts a running dialog
    #[serde(default = "default_cancel_keyword")]
    pub cancel_keyword: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IgnoreConfig {
    /// Comma-separated user ids to drop silently
    #[serde(default)]
    pub users: String,

    /// Comma-separated channel ids to drop silently
    #[serde(default)]
    pub channels: String,

    /// Comma-separated triggers to drop silently
    #[serde(default)]
    pub commands: String,
}

// Default implementations
impl Default for BotConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            admin_prefix: None,
            lang: default_lang(),
            admins: String::new(),
            max_message_len: default_max_message_len(),
            log_level: default_log_level(),
        }
    }
}

impl Default for DialogConfig {
    fn default() -> Self {
        Self {
            timeout: default_dialog_timeout(),
            tries: default_dialog_tries(),
            cancel_keyword: default_cancel_keyword(),
        }
    }
}

impl Default for IgnoreConfig {
    fn default() -> Self {
        Self {
            users: String::new(),
            channels: String::new(),
            commands: String::new(),
        }
    }
}

// Default value functions
fn default_prefix() -> String {
    "!".into()
}

fn default_lang() -> String {
    "en".into()
}

fn default_max_message_len() -> usize {
    2000
}

fn default_log_level() -> String {
    "info".into()
}

fn default_dialog_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_dialog_tries() -> usize {
    5
}

fn default_cancel_keyword() -> String {
    "cancel".into()
}

/// Split a comma-separated env value into a set, dropping blanks.
pub fn csv_set(value: &str) -> HashSet<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    // Keep strings as strings; lists come in comma-separated
                    // and are split by csv_set.
                    .try_parsing(false),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.bot.prefix, "!");
        assert_eq!(config.bot.lang, "en");
        assert_eq!(config.dialog.tries, 5);
        assert_eq!(config.dialog.cancel_keyword, "cancel");
        assert_eq!(config.dialog.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_csv_set() {
        let set = csv_set("alice, bob,,carol ");
        assert_eq!(set.len(), 3);
        assert!(set.contains("bob"));
        assert!(set.contains("carol"));

        assert!(csv_set("").is_empty());
    }
}
