//! Configuration for the bot server.

use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::Deserialize;
use slack_client::DEFAULT_API_URL;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Bot configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Slack credentials and API settings
    pub slack: SlackConfig,

    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// User and group storage
    #[serde(default)]
    pub store: StoreConfig,

    /// Users seeded into the global admins group
    #[serde(default)]
    pub admins: AdminsConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlackConfig {
    /// Web API token (xoxb-...)
    pub bot_token: SecretString,

    /// Request signing secret
    pub signing_secret: SecretString,

    /// Web API base URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Maximum age of a signed request
    #[serde(default = "default_timestamp_tolerance", with = "humantime_serde")]
    pub timestamp_tolerance: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreConfig {
    /// JSON file holding users and groups; in-memory when unset
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminsConfig {
    /// Comma-separated user ids
    #[serde(default)]
    pub global: String,
}

impl AdminsConfig {
    pub fn global_ids(&self) -> Vec<String> {
        self.global
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(String::from)
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Log filter, overridden by RUST_LOG
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            port: default_port(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.into()
}

fn default_timestamp_tolerance() -> Duration {
    Duration::from_secs(5 * 60)
}

fn default_listen_addr() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// An explicit `env_file` must exist; otherwise a `.env` in the working
    /// directory is loaded if present.
    pub fn load(env_file: Option<&Path>) -> Result<Self> {
        match env_file {
            Some(path) => {
                dotenvy::from_path(path)
                    .with_context(|| format!("Failed to load {}", path.display()))?;
            }
            None => {
                dotenvy::dotenv().ok();
            }
        }

        Self::from_environment(None)
    }

    /// Build from the process environment, or from `vars` when given.
    pub fn from_environment(vars: Option<HashMap<String, String>>) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(false)
                    .source(vars),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}
