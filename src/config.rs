//! Configuration loading for certnotify.
//!
//! The host list and bot credentials are packaged with the binary
//! (`config/hosts.txt` and `config/bot.json`). They can be overridden by a
//! TOML file and by command-line flags.
//!
//! # Configuration Precedence
//!
//! 1. Packaged values (lowest priority)
//! 2. Configuration file (specified with --config)
//! 3. Command-line arguments (highest priority)
//!
//! # Example Configuration File
//!
//! ```toml
//! hosts = ["example.com", "www.rust-lang.org"]
//! proxy = "http://127.0.0.1:7890"
//! verify_certificates = true
//!
//! [bot]
//! botToken = "123456:ABC"
//! chatId = "-100123456"
//! ```

use crate::hosts::{normalize, split_hosts};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const PACKAGED_HOSTS: &str = include_str!("../config/hosts.txt");
const PACKAGED_BOT: &str = include_str!("../config/bot.json");

/// Telegram bot token and target chat.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BotCredentials {
    pub bot_token: String,
    pub chat_id: String,
}

/// Partial configuration from one source.
///
/// All fields are optional so sources can be merged.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct Config {
    /// Hosts to check, in report order
    pub hosts: Option<Vec<String>>,
    /// Proxy for the Telegram request
    pub proxy: Option<String>,
    /// Verify peer certificates while checking hosts
    pub verify_certificates: Option<bool>,
    /// Bot credentials
    pub bot: Option<BotCredentials>,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub hosts: Vec<String>,
    pub bot: BotCredentials,
    pub proxy: Option<String>,
    pub verify_certificates: bool,
}

impl Config {
    /// Configuration packaged into the binary at build time.
    pub fn packaged() -> Result<Self, ConfigError> {
        Config::from_packaged(PACKAGED_HOSTS, PACKAGED_BOT)
    }

    /// Builds a configuration from a comma-separated host list and a bot
    /// credentials JSON document.
    pub fn from_packaged(hosts: &str, bot: &str) -> Result<Self, ConfigError> {
        let bot: BotCredentials = serde_json::from_str(bot)
            .map_err(|e| ConfigError::Parse(format!("bot credentials: {}", e)))?;
        Ok(Config {
            hosts: Some(split_hosts(hosts)),
            proxy: None,
            verify_certificates: Some(true),
            bot: Some(bot),
        })
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Returns
    ///
    /// * `Err(ConfigError::Io)` - File could not be read
    /// * `Err(ConfigError::Parse)` - File contains invalid TOML
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io(e.to_string()))?;

        let mut config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        if let Some(hosts) = config.hosts.as_mut() {
            for host in hosts.iter_mut() {
                *host = normalize(host);
            }
        }

        Ok(config)
    }

    /// Converts command-line arguments into a Config for merging.
    ///
    /// An empty proxy means "not given" rather than an override.
    pub fn from_cli_args(proxy: Option<String>, insecure: bool) -> Self {
        Config {
            hosts: None,
            proxy: proxy.filter(|p| !p.is_empty()),
            verify_certificates: if insecure { Some(false) } else { None },
            bot: None,
        }
    }

    /// Merges this configuration with another, prioritizing the other's values.
    pub fn merge_with(mut self, other: Config) -> Self {
        if other.hosts.is_some() {
            self.hosts = other.hosts;
        }
        if other.proxy.is_some() {
            self.proxy = other.proxy;
        }
        if other.verify_certificates.is_some() {
            self.verify_certificates = other.verify_certificates;
        }
        if other.bot.is_some() {
            self.bot = other.bot;
        }
        self
    }

    /// Validates the merged configuration.
    pub fn resolve(self) -> Result<Settings, ConfigError> {
        let bot = self
            .bot
            .ok_or_else(|| ConfigError::Validation("bot credentials are missing".to_string()))?;
        if bot.bot_token.trim().is_empty() {
            return Err(ConfigError::Validation("botToken is empty".to_string()));
        }
        if bot.chat_id.trim().is_empty() {
            return Err(ConfigError::Validation("chatId is empty".to_string()));
        }

        Ok(Settings {
            hosts: self.hosts.unwrap_or_default(),
            bot,
            proxy: self.proxy.filter(|p| !p.is_empty()),
            verify_certificates: self.verify_certificates.unwrap_or(true),
        })
    }

    /// Generates an example configuration file in TOML format.
    pub fn example_toml() -> String {
        let example = Config {
            hosts: Some(vec![
                "example.com".to_string(),
                "www.rust-lang.org".to_string(),
            ]),
            proxy: Some("http://127.0.0.1:7890".to_string()),
            verify_certificates: Some(true),
            bot: Some(BotCredentials {
                bot_token: "123456:ABC-DEF".to_string(),
                chat_id: "-100123456".to_string(),
            }),
        };

        toml::to_string_pretty(&example)
            .unwrap_or_else(|_| "# Error generating example".to_string())
    }
}

/// Errors that can occur during configuration loading and parsing.
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error (file not found, permission denied, etc.)
    Io(String),
    /// TOML or JSON parsing error
    Parse(String),
    /// Missing or empty required values
    Validation(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "IO Error: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Parse Error: {}", msg),
            ConfigError::Validation(msg) => write!(f, "Validation Error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
