//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::ConnectorConfig;
use super::secret::secret_string;
use crate::domain::errors::ConnectorError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into ConnectorConfig
/// 4. Applies environment variable overrides (PEC_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - A referenced environment variable is not set
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use pec_connector::config::loader::load_config;
///
/// let config = load_config("pec-connector.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<ConnectorConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ConnectorError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        ConnectorError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: ConnectorConfig = toml::from_str(&contents)
        .map_err(|e| ConnectorError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config);

    config.validate().map_err(|e| {
        ConnectorError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched.
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| ConnectorError::Other(format!("invalid placeholder pattern: {e}")))?;
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    processed_line = processed_line.replace(&format!("${{{var_name}}}"), &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(ConnectorError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using the PEC_* prefix
///
/// Environment variables follow the pattern: PEC_<SECTION>_<KEY>
/// For example: PEC_SOURCE_HOST, PEC_SYNC_INTERVAL
fn apply_env_overrides(config: &mut ConnectorConfig) {
    // Application overrides
    if let Ok(val) = std::env::var("PEC_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Source overrides
    if let Ok(val) = std::env::var("PEC_SOURCE_HOST") {
        config.source.host = val;
    }
    if let Some(port) = parsed_var("PEC_SOURCE_PORT") {
        config.source.port = port;
    }
    if let Ok(val) = std::env::var("PEC_SOURCE_DATABASE") {
        config.source.database = val;
    }
    if let Ok(val) = std::env::var("PEC_SOURCE_USER") {
        config.source.user = val;
    }
    if let Ok(val) = std::env::var("PEC_SOURCE_PASSWORD") {
        config.source.password = secret_string(val);
    }
    if let Ok(val) = std::env::var("PEC_SOURCE_SSL_MODE") {
        config.source.ssl_mode = val;
    }

    // Ingestion overrides
    if let Ok(val) = std::env::var("PEC_INGESTION_ENDPOINT") {
        config.ingestion.endpoint = val;
    }
    if let Ok(val) = std::env::var("PEC_INGESTION_API_KEY") {
        config.ingestion.api_key = secret_string(val);
    }
    if let Ok(val) = std::env::var("PEC_INGESTION_TENANT_ID") {
        config.ingestion.tenant_id = val;
    }
    if let Some(timeout) = parsed_var("PEC_INGESTION_TIMEOUT_SECONDS") {
        config.ingestion.timeout_seconds = timeout;
    }

    // Sync overrides
    if let Ok(val) = std::env::var("PEC_SYNC_INTERVAL") {
        config.sync.interval = val;
    }
    if let Some(days) = parsed_var("PEC_SYNC_LOOKBACK_DAYS") {
        config.sync.lookback_days = days;
    }
    if let Some(size) = parsed_var("PEC_SYNC_BATCH_SIZE") {
        config.sync.batch_size = size;
    }

    // State overrides
    if let Ok(val) = std::env::var("PEC_STATE_DIRECTORY") {
        config.state.directory = PathBuf::from(val);
    }

    // Logging overrides
    if let Ok(val) = std::env::var("PEC_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(true);
    }
    if let Ok(val) = std::env::var("PEC_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
}

fn parsed_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}
