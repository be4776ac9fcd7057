//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and `SEARCHLENS_*` environment variable overrides.
//! The store connection settings are validated before any fetch is attempted.

use crate::analytics::{LatencyAveraging, ViewerZone};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Largest page the search store accepts per request
pub const MAX_PAGE_SIZE: u32 = 250;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub analytics: AnalyticsConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Connection settings for the search-log store
#[derive(Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub host: String,

    #[serde(default = "default_store_port")]
    pub port: u16,

    #[serde(default = "default_protocol")]
    pub protocol: String,

    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_collection")]
    pub collection: String,

    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_secs: u64,
}

fn default_store_port() -> u16 {
    443
}

fn default_protocol() -> String {
    "https".to_string()
}

fn default_collection() -> String {
    "search_logs".to_string()
}

fn default_connection_timeout() -> u64 {
    10
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_store_port(),
            protocol: default_protocol(),
            api_key: String::new(),
            collection: default_collection(),
            connection_timeout_secs: default_connection_timeout(),
        }
    }
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("protocol", &self.protocol)
            .field("api_key", &if self.api_key.is_empty() { "MISSING" } else { "***" })
            .field("collection", &self.collection)
            .field("connection_timeout_secs", &self.connection_timeout_secs)
            .finish()
    }
}

impl StoreConfig {
    /// Base URL of the store, e.g. `https://search.example.com:443`
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.host.trim(), self.port)
    }

    /// Check that the store can be contacted at all
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::MissingHost);
        }
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if self.protocol != "http" && self.protocol != "https" {
            return Err(ConfigError::InvalidValue {
                field: "store.protocol",
                reason: format!("expected http or https, got {:?}", self.protocol),
            });
        }
        if self.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "store.port",
                reason: "port must be non-zero".to_string(),
            });
        }
        if self.collection.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "store.collection",
                reason: "collection name cannot be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Analysis behavior
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyticsConfig {
    /// Records requested per page
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Hard upper bound on records retrieved per window
    #[serde(default = "default_safety_cap")]
    pub safety_cap: usize,

    #[serde(default = "default_max_window_days")]
    pub max_window_days: u32,

    #[serde(default = "default_window_days")]
    pub default_window_days: u32,

    #[serde(default)]
    pub latency_averaging: LatencyAveraging,

    /// "local", "utc", or a fixed offset such as "+05:30"
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_page_size() -> u32 {
    MAX_PAGE_SIZE
}

fn default_safety_cap() -> usize {
    10_000
}

fn default_max_window_days() -> u32 {
    365
}

fn default_window_days() -> u32 {
    7
}

fn default_timezone() -> String {
    "local".to_string()
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            safety_cap: default_safety_cap(),
            max_window_days: default_max_window_days(),
            default_window_days: default_window_days(),
            latency_averaging: LatencyAveraging::default(),
            timezone: default_timezone(),
        }
    }
}

impl AnalyticsConfig {
    /// Parse the configured viewer time zone
    pub fn zone(&self) -> Result<ViewerZone, ConfigError> {
        ViewerZone::parse(&self.timezone).map_err(|reason| ConfigError::InvalidValue {
            field: "analytics.timezone",
            reason,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::InvalidValue {
                field: "analytics.page_size",
                reason: format!("must be between 1 and {}", MAX_PAGE_SIZE),
            });
        }
        if self.safety_cap == 0 {
            return Err(ConfigError::InvalidValue {
                field: "analytics.safety_cap",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.max_window_days == 0 {
            return Err(ConfigError::InvalidValue {
                field: "analytics.max_window_days",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.default_window_days == 0 || self.default_window_days > self.max_window_days {
            return Err(ConfigError::InvalidValue {
                field: "analytics.default_window_days",
                reason: format!("must be between 1 and {}", self.max_window_days),
            });
        }
        self.zone()?;
        Ok(())
    }
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_host")]
    pub host: String,

    #[serde(default = "default_api_port")]
    pub port: u16,
}

fn default_api_host() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    8090
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_api_host(),
            port: default_api_port(),
        }
    }
}

impl ApiConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Output format for log lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable (for development)
    #[default]
    Pretty,
    /// One JSON object per line (for production)
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("searchlens").join("config.toml")),
            Some(PathBuf::from("/etc/searchlens/config.toml")),
            Some(PathBuf::from("./searchlens.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Load an explicit file if given, otherwise search the default locations
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load_with_env(path),
            None => Ok(Self::load_default()),
        }
    }

    /// Validate everything needed before the first fetch
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.store.validate()?;
        self.analytics.validate()?;
        Ok(())
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        // Store overrides
        if let Some(host) = lookup("SEARCHLENS_STORE_HOST") {
            self.store.host = host;
        }
        if let Some(port) = lookup("SEARCHLENS_STORE_PORT") {
            if let Ok(p) = port.parse() {
                self.store.port = p;
            }
        }
        if let Some(protocol) = lookup("SEARCHLENS_STORE_PROTOCOL") {
            self.store.protocol = protocol;
        }
        if let Some(api_key) = lookup("SEARCHLENS_STORE_API_KEY") {
            self.store.api_key = api_key;
        }
        if let Some(collection) = lookup("SEARCHLENS_STORE_COLLECTION") {
            self.store.collection = collection;
        }

        // Analytics overrides
        if let Some(cap) = lookup("SEARCHLENS_SAFETY_CAP") {
            if let Ok(c) = cap.parse() {
                self.analytics.safety_cap = c;
            }
        }
        if let Some(timezone) = lookup("SEARCHLENS_TIMEZONE") {
            self.analytics.timezone = timezone;
        }

        // API overrides
        if let Some(host) = lookup("SEARCHLENS_API_HOST") {
            self.api.host = host;
        }
        if let Some(port) = lookup("SEARCHLENS_API_PORT") {
            if let Ok(p) = port.parse() {
                self.api.port = p;
            }
        }

        // Logging overrides
        if let Some(level) = lookup("SEARCHLENS_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("SEARCHLENS_LOG_FORMAT") {
            match format.to_lowercase().as_str() {
                "json" => self.logging.format = LogFormat::Json,
                "pretty" => self.logging.format = LogFormat::Pretty,
                other => tracing::warn!("Ignoring unknown SEARCHLENS_LOG_FORMAT {:?}", other),
            }
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Search store host is not configured (set store.host or SEARCHLENS_STORE_HOST)")]
    MissingHost,

    #[error("Search store API key is not configured (set store.api_key or SEARCHLENS_STORE_API_KEY)")]
    MissingApiKey,

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Searchlens Configuration
#
# Environment variables override these settings:
# - SEARCHLENS_STORE_HOST, SEARCHLENS_STORE_PORT, SEARCHLENS_STORE_PROTOCOL
# - SEARCHLENS_STORE_API_KEY, SEARCHLENS_STORE_COLLECTION
# - SEARCHLENS_SAFETY_CAP, SEARCHLENS_TIMEZONE
# - SEARCHLENS_API_HOST, SEARCHLENS_API_PORT
# - SEARCHLENS_LOG_LEVEL, SEARCHLENS_LOG_FORMAT

[store]
# Search store host (required)
host = ""

# Search store port
port = 443

# http or https
protocol = "https"

# API key with search and write access (required)
api_key = ""

# Collection holding the search-event log
collection = "search_logs"

# Per-request timeout in seconds
connection_timeout_secs = 10

[analytics]
# Records per page request (the store accepts at most 250)
page_size = 250

# Hard upper bound on records retrieved per window
safety_cap = 10000

# Longest window an analysis may cover
max_window_days = 365

# Window used when none is given
default_window_days = 7

# Average latency over all_records (absent latency counts as 0)
# or with_latency (only records that reported a latency)
latency_averaging = "with_latency"

# Viewer time zone for day/hour buckets: local, utc, or +HH:MM
timezone = "local"

[api]
# API server host
host = "0.0.0.0"

# API server port
port = 8090

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn valid_store() -> StoreConfig {
        StoreConfig {
            host: "search.example.com".to_string(),
            api_key: "secret".to_string(),
            ..StoreConfig::default()
        }
    }

    #[test]
    fn test_default_config_template_parses() {
        let config: Config = toml::from_str(&generate_default_config()).unwrap();

        assert_eq!(config.store.port, 443);
        assert_eq!(config.store.collection, "search_logs");
        assert_eq!(config.analytics.page_size, 250);
        assert_eq!(config.analytics.safety_cap, 10_000);
        assert_eq!(config.analytics.latency_averaging, LatencyAveraging::WithLatency);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.api.addr(), "0.0.0.0:8090");
    }

    #[test]
    fn test_missing_host_and_key() {
        let mut config = Config::default();
        assert!(matches!(config.validate(), Err(ConfigError::MissingHost)));

        config.store.host = "search.example.com".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::MissingApiKey)));

        config.store.api_key = "secret".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_protocol_and_page_size() {
        let mut store = valid_store();
        store.protocol = "ftp".to_string();
        assert!(matches!(
            store.validate(),
            Err(ConfigError::InvalidValue { field: "store.protocol", .. })
        ));

        let analytics = AnalyticsConfig {
            page_size: 251,
            ..AnalyticsConfig::default()
        };
        assert!(matches!(
            analytics.validate(),
            Err(ConfigError::InvalidValue { field: "analytics.page_size", .. })
        ));
    }

    #[test]
    fn test_invalid_timezone() {
        let analytics = AnalyticsConfig {
            timezone: "mars/olympus".to_string(),
            ..AnalyticsConfig::default()
        };
        assert!(matches!(
            analytics.validate(),
            Err(ConfigError::InvalidValue { field: "analytics.timezone", .. })
        ));
    }

    #[test]
    fn test_base_url() {
        let store = StoreConfig {
            protocol: "http".to_string(),
            port: 8108,
            ..valid_store()
        };
        assert_eq!(store.base_url(), "http://search.example.com:8108");
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let rendered = format!("{:?}", valid_store());
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("***"));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("SEARCHLENS_STORE_HOST", "typesense.internal"),
            ("SEARCHLENS_STORE_PORT", "8108"),
            ("SEARCHLENS_STORE_API_KEY", "k"),
            ("SEARCHLENS_SAFETY_CAP", "500"),
            ("SEARCHLENS_LOG_FORMAT", "JSON"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.store.host, "typesense.internal");
        assert_eq!(config.store.port, 8108);
        assert_eq!(config.store.api_key, "k");
        assert_eq!(config.analytics.safety_cap, 500);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[store]\nhost = \"localhost\"\napi_key = \"xyz\"\nprotocol = \"http\"\n\n[analytics]\nsafety_cap = 42\ntimezone = \"+05:30\""
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.store.host, "localhost");
        assert_eq!(config.analytics.safety_cap, 42);
        assert_eq!(config.analytics.page_size, 250);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Path::new("/nonexistent/searchlens.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
