//! Server configuration loading from file and environment variables.

use chama_announce::{AnnouncementConfig, AnnouncementSource, SpeechBackend};
use chama_types::{DISPLAY_FEED_LIMIT, PANEL_FEED_LIMIT};
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Database settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Feed sizes for the display and the staff panel.
    #[serde(default)]
    pub feed: FeedConfig,

    /// Announcement text and speech settings.
    #[serde(default)]
    pub announcement: AnnouncementConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory with the built display and panel client, served as static
    /// files when it contains an `index.html`.
    #[serde(default)]
    pub client_dir: Option<String>,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,

    /// SQLite busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Maximum number of pooled connections.
    #[serde(default = "default_pool_max_size")]
    pub pool_max_size: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "chama_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

/// How many calls each view subscribes to.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// Calls on the television display: one current plus history.
    #[serde(default = "default_display_limit")]
    pub display_limit: u32,

    /// Calls in the staff panel's recent list.
    #[serde(default = "default_panel_limit")]
    pub panel_limit: u32,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    3000
}

fn default_db_path() -> String {
    "chama.db".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

fn default_pool_max_size() -> u32 {
    8
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_display_limit() -> u32 {
    DISPLAY_FEED_LIMIT
}

fn default_panel_limit() -> u32 {
    PANEL_FEED_LIMIT
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            client_dir: None,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            pool_max_size: default_pool_max_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            display_limit: default_display_limit(),
            panel_limit: default_panel_limit(),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is present but unusable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `CHAMA_HOST` overrides `server.host`
/// - `CHAMA_PORT` overrides `server.port`
/// - `CHAMA_CLIENT_DIR` overrides `server.client_dir`
/// - `CHAMA_DB_PATH` overrides `database.path`
/// - `CHAMA_LOG_LEVEL` overrides `logging.level`
/// - `CHAMA_LOG_JSON` overrides `logging.json` (set to "true" to enable)
/// - `CHAMA_ANNOUNCEMENT_SOURCE` overrides `announcement.source`
///   (`template` or `remote-generated`)
/// - `CHAMA_SPEECH` overrides `announcement.speech` (`client`, `system` or `remote`)
/// - `CHAMA_GENERATION_API_KEY` overrides `announcement.generation.api_key`
/// - `CHAMA_SPEECH_API_KEY` overrides `announcement.remote_speech.api_key`
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed,
/// or if the resulting configuration is invalid.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate(&config)?;

    Ok(config)
}

/// Applies `CHAMA_*` overrides read through `lookup`.
fn apply_env_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(host) = lookup("CHAMA_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Some(port) = lookup("CHAMA_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Some(dir) = lookup("CHAMA_CLIENT_DIR") {
        config.server.client_dir = Some(dir).filter(|d| !d.trim().is_empty());
    }
    if let Some(db_path) = lookup("CHAMA_DB_PATH") {
        config.database.path = db_path;
    }
    if let Some(level) = lookup("CHAMA_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = lookup("CHAMA_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
    if let Some(source) = lookup("CHAMA_ANNOUNCEMENT_SOURCE") {
        match source.trim() {
            "template" => config.announcement.source = AnnouncementSource::Template,
            "remote-generated" => {
                config.announcement.source = AnnouncementSource::RemoteGenerated
            }
            other => tracing::warn!(value = other, "ignoring unknown CHAMA_ANNOUNCEMENT_SOURCE"),
        }
    }
    if let Some(speech) = lookup("CHAMA_SPEECH") {
        match speech.trim() {
            "client" => config.announcement.speech = SpeechBackend::Client,
            "system" => config.announcement.speech = SpeechBackend::System,
            "remote" => config.announcement.speech = SpeechBackend::Remote,
            other => tracing::warn!(value = other, "ignoring unknown CHAMA_SPEECH"),
        }
    }
    if let Some(key) = lookup("CHAMA_GENERATION_API_KEY") {
        config.announcement.generation.api_key = key;
    }
    if let Some(key) = lookup("CHAMA_SPEECH_API_KEY") {
        config.announcement.remote_speech.api_key = key;
    }
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.feed.display_limit == 0 || config.feed.panel_limit == 0 {
        return Err(ConfigError::Invalid(
            "feed limits must be at least 1".to_string(),
        ));
    }
    if config.database.pool_max_size == 0 {
        return Err(ConfigError::Invalid(
            "database.pool_max_size must be at least 1".to_string(),
        ));
    }
    Ok(())
}
