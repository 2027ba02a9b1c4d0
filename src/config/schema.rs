//! Configuration schema types
//!
//! This module defines the configuration structure that maps to the TOML file.

use crate::config::SecretString;
use crate::core::scheduler::SyncInterval;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main connector configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Source database (e-SUS PEC PostgreSQL)
    pub source: SourceConfig,

    /// Remote ingestion endpoint
    pub ingestion: IngestionConfig,

    /// Scheduling and windowing
    #[serde(default)]
    pub sync: SyncConfig,

    /// Watermark and run history persistence
    #[serde(default)]
    pub state: StateConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ConnectorConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.source.validate()?;
        self.ingestion.validate()?;
        self.sync.validate()?;
        self.state.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

/// Source database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_db_host")]
    pub host: String,

    #[serde(default = "default_db_port")]
    pub port: u16,

    #[serde(default = "default_db_name")]
    pub database: String,

    #[serde(default = "default_db_user")]
    pub user: String,

    /// Stored securely in memory and automatically zeroized on drop
    pub password: SecretString,

    /// TLS mode (disable, prefer, require)
    #[serde(default = "default_ssl_mode")]
    pub ssl_mode: String,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout_seconds")]
    pub connect_timeout_seconds: u64,

    /// Statement timeout in seconds (0 disables it)
    #[serde(default = "default_statement_timeout_seconds")]
    pub statement_timeout_seconds: u64,

    /// Maximum number of pooled connections
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

impl SourceConfig {
    fn validate(&self) -> Result<(), String> {
        if self.host.trim().is_empty() {
            return Err("source.host cannot be empty".to_string());
        }

        if self.database.trim().is_empty() {
            return Err("source.database cannot be empty".to_string());
        }

        if self.user.trim().is_empty() {
            return Err("source.user cannot be empty".to_string());
        }

        let valid_ssl_modes = ["disable", "prefer", "require"];
        if !valid_ssl_modes.contains(&self.ssl_mode.as_str()) {
            return Err(format!(
                "source.ssl_mode must be one of: {}, got '{}'",
                valid_ssl_modes.join(", "),
                self.ssl_mode
            ));
        }

        if !(1..=120).contains(&self.connect_timeout_seconds) {
            return Err(format!(
                "source.connect_timeout_seconds must be between 1 and 120, got {}",
                self.connect_timeout_seconds
            ));
        }

        if self.max_connections == 0 || self.max_connections > 16 {
            return Err(format!(
                "source.max_connections must be between 1 and 16, got {}",
                self.max_connections
            ));
        }

        Ok(())
    }
}

/// Remote ingestion endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    /// Endpoint URL receiving `POST {"records": [...]}`
    pub endpoint: String,

    /// Long-lived bearer credential
    /// Stored securely in memory and automatically zeroized on drop
    pub api_key: SecretString,

    /// Tenant (municipality) identifier
    pub tenant_id: String,

    /// Header carrying the tenant identifier
    #[serde(default = "default_tenant_header")]
    pub tenant_header: String,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl IngestionConfig {
    fn validate(&self) -> Result<(), String> {
        let url = url::Url::parse(&self.endpoint)
            .map_err(|e| format!("ingestion.endpoint is not a valid URL: {e}"))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err("ingestion.endpoint must start with http:// or https://".to_string());
        }

        if self.api_key.expose_secret().is_empty() {
            return Err("ingestion.api_key cannot be empty".to_string());
        }

        if self.tenant_id.trim().is_empty() {
            return Err("ingestion.tenant_id cannot be empty".to_string());
        }

        if reqwest::header::HeaderName::from_bytes(self.tenant_header.as_bytes()).is_err() {
            return Err(format!(
                "ingestion.tenant_header '{}' is not a valid HTTP header name",
                self.tenant_header
            ));
        }

        if !(1..=300).contains(&self.timeout_seconds) {
            return Err(format!(
                "ingestion.timeout_seconds must be between 1 and 300, got {}",
                self.timeout_seconds
            ));
        }

        Ok(())
    }
}

/// Scheduling and windowing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Interval setting: minutes ("15"), "12 hours", or "Manual Only"
    #[serde(default = "default_interval")]
    pub interval: String,

    /// Days covered by a full (non-incremental) window
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,

    /// Records per ingestion call
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Scheduler wake-up period in seconds
    #[serde(default = "default_tick_seconds")]
    pub tick_seconds: u64,

    /// Delay before the first cycle after startup, in seconds
    #[serde(default = "default_startup_delay_seconds")]
    pub startup_delay_seconds: u64,

    /// Capacity of the progress event channel
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            lookback_days: default_lookback_days(),
            batch_size: default_batch_size(),
            tick_seconds: default_tick_seconds(),
            startup_delay_seconds: default_startup_delay_seconds(),
            event_buffer: default_event_buffer(),
        }
    }
}

impl SyncConfig {
    fn validate(&self) -> Result<(), String> {
        if let SyncInterval::Unparsable(raw) = SyncInterval::parse(&self.interval) {
            return Err(format!(
                "Invalid sync.interval '{raw}'. Use minutes (\"15\"), \"<n> hours\" or \"Manual Only\""
            ));
        }

        if self.lookback_days == 0 || self.lookback_days > 3650 {
            return Err(format!(
                "sync.lookback_days must be between 1 and 3650, got {}",
                self.lookback_days
            ));
        }

        if !(1..=1000).contains(&self.batch_size) {
            return Err(format!(
                "sync.batch_size must be between 1 and 1000, got {}",
                self.batch_size
            ));
        }

        if self.tick_seconds == 0 {
            return Err("sync.tick_seconds must be > 0".to_string());
        }

        if self.event_buffer == 0 {
            return Err("sync.event_buffer must be > 0".to_string());
        }

        Ok(())
    }
}

/// Watermark and history persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    /// Directory holding `state.json` and `history.json`
    #[serde(default = "default_state_dir")]
    pub directory: PathBuf,

    /// Number of run history entries kept
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            directory: default_state_dir(),
            history_limit: default_history_limit(),
        }
    }
}

impl StateConfig {
    fn validate(&self) -> Result<(), String> {
        if self.directory.as_os_str().is_empty() {
            return Err("state.directory cannot be empty".to_string());
        }
        if self.history_limit == 0 {
            return Err("state.history_limit must be > 0".to_string());
        }
        Ok(())
    }

    /// Path of the watermark file
    pub fn state_file(&self) -> PathBuf {
        self.directory.join("state.json")
    }

    /// Path of the run history file
    pub fn history_file(&self) -> PathBuf {
        self.directory.join("history.json")
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy (daily, hourly)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }
        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local_enabled".to_string());
        }
        Ok(())
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_db_host() -> String {
    "localhost".to_string()
}

fn default_db_port() -> u16 {
    5432
}

fn default_db_name() -> String {
    "esus".to_string()
}

fn default_db_user() -> String {
    "postgres".to_string()
}

fn default_ssl_mode() -> String {
    "disable".to_string()
}

fn default_connect_timeout_seconds() -> u64 {
    10
}

fn default_statement_timeout_seconds() -> u64 {
    300
}

fn default_max_connections() -> usize {
    2
}

fn default_tenant_header() -> String {
    "X-Municipality-Id".to_string()
}

fn default_request_timeout_seconds() -> u64 {
    10
}

fn default_interval() -> String {
    "15".to_string()
}

fn default_lookback_days() -> u32 {
    30
}

fn default_batch_size() -> usize {
    100
}

fn default_tick_seconds() -> u64 {
    60
}

fn default_startup_delay_seconds() -> u64 {
    5
}

fn default_event_buffer() -> usize {
    256
}

fn default_state_dir() -> PathBuf {
    PathBuf::from(".pec-connector")
}

fn default_history_limit() -> usize {
    50
}

fn default_local_path() -> String {
    "logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;

    pub(crate) fn sample_config() -> ConnectorConfig {
        ConnectorConfig {
            application: ApplicationConfig::default(),
            source: SourceConfig {
                host: "localhost".to_string(),
                port: 5432,
                database: "esus".to_string(),
                user: "postgres".to_string(),
                password: secret_string("postgres".to_string()),
                ssl_mode: "disable".to_string(),
                connect_timeout_seconds: 10,
                statement_timeout_seconds: 300,
                max_connections: 2,
            },
            ingestion: IngestionConfig {
                endpoint: "https://ingest.example.com/ingestPecData".to_string(),
                api_key: secret_string("key-123".to_string()),
                tenant_id: "3550308".to_string(),
                tenant_header: "X-Municipality-Id".to_string(),
                timeout_seconds: 10,
            },
            sync: SyncConfig::default(),
            state: StateConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    #[test]
    fn test_sample_config_is_valid() {
        assert!(sample_config().validate().is_ok());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = sample_config();
        config.application.log_level = "verbose".to_string();
        assert!(config.validate().unwrap_err().contains("log_level"));
    }

    #[test]
    fn test_invalid_endpoint() {
        let mut config = sample_config();
        config.ingestion.endpoint = "not a url".to_string();
        assert!(config.validate().unwrap_err().contains("ingestion.endpoint"));

        config.ingestion.endpoint = "ftp://ingest.example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_api_key() {
        let mut config = sample_config();
        config.ingestion.api_key = secret_string(String::new());
        assert!(config.validate().unwrap_err().contains("api_key"));
    }

    #[test]
    fn test_invalid_interval() {
        let mut config = sample_config();
        config.sync.interval = "every now and then".to_string();
        assert!(config.validate().unwrap_err().contains("sync.interval"));

        config.sync.interval = "Manual Only".to_string();
        assert!(config.validate().is_ok());

        config.sync.interval = "12 hours".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_batch_size() {
        let mut config = sample_config();
        config.sync.batch_size = 0;
        assert!(config.validate().is_err());

        config.sync.batch_size = 1001;
        assert!(config.validate().unwrap_err().contains("sync.batch_size"));

        config.sync.batch_size = 1000;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_batch_size_defaults_to_100() {
        assert_eq!(SyncConfig::default().batch_size, 100);
    }

    #[test]
    fn test_invalid_ssl_mode() {
        let mut config = sample_config();
        config.source.ssl_mode = "verify-full".to_string();
        assert!(config.validate().unwrap_err().contains("ssl_mode"));
    }

    #[test]
    fn test_state_paths() {
        let state = StateConfig {
            directory: PathBuf::from("/var/lib/pec"),
            history_limit: 50,
        };
        assert_eq!(state.state_file(), PathBuf::from("/var/lib/pec/state.json"));
        assert_eq!(
            state.history_file(),
            PathBuf::from("/var/lib/pec/history.json")
        );
    }
}
