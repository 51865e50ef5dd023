//! Configuration management for linkpage
//!
//! Settings come from a TOML file (`linkpage.toml` by default), then `LP_*`
//! environment variables, then command line flags. Every section has defaults
//! so a partial file is enough.

use crate::types::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default config file looked up by [`Config::load`]
pub const DEFAULT_CONFIG_FILE: &str = "linkpage.toml";

/// Longest accepted session lifetime (one year)
pub const MAX_SESSION_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,

    /// Storage configuration
    pub storage: StorageConfig,

    /// Session configuration
    pub auth: AuthConfig,

    /// External scrape service
    pub scraper: ScraperConfig,

    /// Metrics and monitoring
    pub metrics: MetricsConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// HTTP server bind address
    pub http_addr: SocketAddr,

    /// Request timeout
    #[serde(with = "duration_str")]
    pub request_timeout: Duration,
}

/// Storage backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageType {
    /// Everything in process memory, lost on restart
    Memory,
    /// In-memory tables snapshotted to a JSON file in `data_dir`
    File,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Backend type
    pub storage_type: StorageType,

    /// Data directory path, used by the file backend
    pub data_dir: PathBuf,
}

/// Session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// How long an issued session token stays valid
    #[serde(with = "duration_str")]
    pub session_ttl: Duration,
}

/// Scrape service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Endpoint that accepts `{"url": ..}` and answers with link metadata.
    /// Without one, post creation reports the service as unavailable.
    pub endpoint: Option<String>,

    /// Per-request timeout
    #[serde(with = "duration_str")]
    pub timeout: Duration,
}

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics at `/metrics`
    pub enable_prometheus: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (pretty, compact, json)
    pub format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            storage_type: StorageType::Memory,
            data_dir: PathBuf::from("./data"),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl: Duration::from_secs(7 * 24 * 3600),
        }
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout: Duration::from_secs(10),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enable_prometheus: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl std::str::FromStr for StorageType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "memory" => Ok(StorageType::Memory),
            "file" => Ok(StorageType::File),
            _ => Err(Error::config(format!(
                "Invalid storage type: {}. Valid options: memory, file",
                s
            ))),
        }
    }
}

impl Config {
    /// Load configuration from `linkpage.toml` (if present) and environment variables
    pub fn load() -> Result<Self> {
        let mut config = if Path::new(DEFAULT_CONFIG_FILE).exists() {
            Self::from_file(DEFAULT_CONFIG_FILE)?
        } else {
            Config::default()
        };

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml(&contents)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| Error::config(format!("Failed to parse config file: {}", e)))
    }

    /// Apply `LP_*` environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(addr) = var("LP_HTTP_ADDR") {
            self.server.http_addr = addr
                .parse()
                .map_err(|e| Error::config(format!("Invalid HTTP address: {}", e)))?;
        }

        if let Some(storage_type) = var("LP_STORAGE_TYPE") {
            self.storage.storage_type = storage_type.parse()?;
        }

        if let Some(data_dir) = var("LP_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(data_dir);
        }

        if let Some(endpoint) = var("LP_SCRAPER_ENDPOINT") {
            self.scraper.endpoint = Some(endpoint).filter(|e| !e.is_empty());
        }

        if let Some(ttl) = var("LP_SESSION_TTL") {
            self.auth.session_ttl = parse_duration(&ttl).map_err(Error::config)?;
        }

        if let Some(level) = var("LP_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Some(format) = var("LP_LOG_FORMAT") {
            self.logging.format = format;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => return Err(Error::config(format!("Invalid log level: {}", other))),
        }

        match self.logging.format.as_str() {
            "pretty" | "compact" | "json" => {}
            other => return Err(Error::config(format!("Invalid log format: {}", other))),
        }

        if self.server.request_timeout.is_zero() {
            return Err(Error::config("Request timeout must be greater than zero"));
        }

        if self.auth.session_ttl < Duration::from_secs(60) {
            return Err(Error::config("Session TTL too small (minimum 1m)"));
        }
        if self.auth.session_ttl > MAX_SESSION_TTL {
            return Err(Error::config("Session TTL too large (maximum 365d)"));
        }

        if let Some(endpoint) = &self.scraper.endpoint {
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                return Err(Error::config(format!(
                    "Scraper endpoint must be an http(s) URL: {}",
                    endpoint
                )));
            }
        }

        if self.storage.storage_type == StorageType::File
            && self.storage.data_dir.as_os_str().is_empty()
        {
            return Err(Error::config("File storage needs a data directory"));
        }

        Ok(())
    }
}

/// Load a config file if given, otherwise `linkpage.toml`, otherwise defaults
pub fn load_config_or_default(path: Option<&str>) -> Result<Config> {
    match path {
        Some(path) => {
            let mut config = Config::from_file(path)?;
            config.apply_env_overrides()?;
            config.validate()?;
            Ok(config)
        }
        None => Config::load(),
    }
}

/// Durations written as `"30s"`, `"5m"`, `"250ms"`, `"12h"` or plain seconds
mod duration_str {
    use serde::de::{self, Deserializer, Visitor};
    use serde::Serializer;
    use std::fmt;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        if value.subsec_millis() != 0 {
            serializer.serialize_str(&format!("{}ms", value.as_millis()))
        } else {
            serializer.serialize_str(&format!("{}s", value.as_secs()))
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        struct DurationVisitor;

        impl<'de> Visitor<'de> for DurationVisitor {
            type Value = Duration;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a duration string like '30s' or '5m'")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Duration, E> {
                super::parse_duration(value).map_err(E::custom)
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<Duration, E> {
                Ok(Duration::from_secs(value))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<Duration, E> {
                u64::try_from(value)
                    .map(Duration::from_secs)
                    .map_err(|_| E::custom("duration cannot be negative"))
            }
        }

        deserializer.deserialize_any(DurationVisitor)
    }
}

/// Parse a duration string such as `"30s"` or `"5m"`
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    let seconds = |digits: &str, scale: u64| {
        digits
            .parse::<u64>()
            .ok()
            .and_then(|n| n.checked_mul(scale))
            .map(Duration::from_secs)
            .ok_or_else(|| format!("Invalid duration: {}", s))
    };

    if let Some(ms) = s.strip_suffix("ms") {
        ms.parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|_| format!("Invalid duration: {}", s))
    } else if let Some(secs) = s.strip_suffix('s') {
        seconds(secs, 1)
    } else if let Some(mins) = s.strip_suffix('m') {
        seconds(mins, 60)
    } else if let Some(hours) = s.strip_suffix('h') {
        seconds(hours, 3600)
    } else {
        seconds(s, 1)
    }
}
