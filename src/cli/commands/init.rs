//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "pec-connector.toml")]
    pub output: String,

    /// Include example values and comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing PEC Connector configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2); // Configuration error exit code
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your settings", self.output);
                println!("  2. Create a .env file with your credentials:");
                println!("     - Set PEC_DB_PASSWORD (e-SUS PEC database password)");
                println!("     - Set PEC_API_KEY (ingestion endpoint credential)");
                println!("  3. Validate configuration: pec-connector validate-config");
                println!("  4. Check connectivity: pec-connector check");
                println!("  5. Run one cycle: pec-connector sync");
                println!("  6. Keep synchronizing on schedule: pec-connector run");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(5) // Fatal error exit code
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# PEC Connector Configuration File
# Incremental sync of e-SUS PEC production to a remote ingestion endpoint

[application]
log_level = "info"

[source]
host = "localhost"
port = 5432
database = "esus"
user = "postgres"
password = "${PEC_DB_PASSWORD}"
ssl_mode = "prefer"

[ingestion]
endpoint = "https://ingest.example.com/ingestPecData"
api_key = "${PEC_API_KEY}"
tenant_id = "3550308"

[sync]
interval = "15"
lookback_days = 30
batch_size = 100

[state]
directory = ".pec-connector"

[logging]
local_enabled = false
local_path = "logs"
local_rotation = "daily"
"#
        .to_string()
    }

    /// Generate configuration with examples and comments
    fn generate_config_with_examples() -> String {
        r#"# PEC Connector Configuration File
#
# This file contains all configuration options with examples and explanations.
# Any value may reference an environment variable with ${VAR}; every key can
# also be overridden with PEC_<SECTION>_<KEY> (e.g. PEC_SYNC_INTERVAL).

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# ============================================================================
# Source Database (e-SUS PEC PostgreSQL, read-only access)
# ============================================================================
[source]
host = "localhost"
port = 5432
database = "esus"
user = "postgres"

# Password (use environment variable)
password = "${PEC_DB_PASSWORD}"

# TLS mode: disable | prefer | require
ssl_mode = "prefer"

# Connection timeout in seconds
connect_timeout_seconds = 10

# Statement timeout in seconds for each domain query (0 disables it)
statement_timeout_seconds = 300

# Pooled connections (one cycle uses one at a time)
max_connections = 2

# ============================================================================
# Ingestion Endpoint
# ============================================================================
[ingestion]
# Endpoint receiving POST {"records": [...]}
endpoint = "https://ingest.example.com/ingestPecData"

# Bearer credential (use environment variable)
api_key = "${PEC_API_KEY}"

# Municipality (IBGE code) sent in the tenant header
tenant_id = "3550308"
tenant_header = "X-Municipality-Id"

# Request timeout in seconds
timeout_seconds = 10

# ============================================================================
# Scheduling
# ============================================================================
[sync]
# Interval between cycles: minutes ("15", "30", "60"), "12 hours",
# "24 hours" or "Manual Only". Intervals up to 24 hours resume from the
# last successful cycle; anything else reloads the lookback window.
interval = "15"

# Days covered by a full load
lookback_days = 30

# Records per ingestion request
batch_size = 100

# Scheduler wake-up period and first-run delay, in seconds
tick_seconds = 60
startup_delay_seconds = 5

# Progress events buffered between the engine and the terminal
event_buffer = 256

# ============================================================================
# State
# ============================================================================
[state]
# Directory holding state.json (watermark) and history.json (run history)
directory = ".pec-connector"

# Run history entries kept
history_limit = 50

# ============================================================================
# Logging
# ============================================================================
[logging]
# Enable local JSON file logging
local_enabled = false

# Log directory
local_path = "logs"

# Log rotation (daily or hourly)
local_rotation = "daily"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConnectorConfig;

    #[test]
    fn test_init_args_defaults() {
        let args = InitArgs {
            output: "pec-connector.toml".to_string(),
            with_examples: false,
            force: false,
        };

        assert_eq!(args.output, "pec-connector.toml");
        assert!(!args.with_examples);
        assert!(!args.force);
    }

    #[test]
    fn test_generated_configs_parse() {
        for content in [
            InitArgs::generate_minimal_config(),
            InitArgs::generate_config_with_examples(),
        ] {
            let config: ConnectorConfig = toml::from_str(&content).unwrap();
            assert_eq!(config.sync.batch_size, 100);
            assert_eq!(config.source.database, "esus");
        }
    }

    #[tokio::test]
    async fn test_refuses_to_overwrite() {
        let dir = tempfile::TempDir::new().unwrap();
        let output = dir.path().join("pec-connector.toml");
        std::fs::write(&output, "existing").unwrap();

        let args = InitArgs {
            output: output.to_string_lossy().to_string(),
            with_examples: false,
            force: false,
        };
        assert_eq!(args.execute().await.unwrap(), 2);
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "existing");
    }
}
