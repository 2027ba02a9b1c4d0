//! Configuration management for the connector.
//!
//! This module provides TOML-based configuration loading, parsing, and validation.
//!
//! # Overview
//!
//! The connector uses a TOML configuration file with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `PEC_<SECTION>_<KEY>` environment overrides
//! - Default values for optional settings
//! - Validation on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use pec_connector::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("pec-connector.toml")?;
//!
//! println!("Source: {}:{}", config.source.host, config.source.port);
//! println!("Endpoint: {}", config.ingestion.endpoint);
//! println!("Interval: {}", config.sync.interval);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level
//! - [`SourceConfig`] - PEC PostgreSQL connection
//! - [`IngestionConfig`] - Endpoint, credential and tenant
//! - [`SyncConfig`] - Interval, lookback window and batching
//! - [`StateConfig`] - Watermark and history files
//! - [`LoggingConfig`] - Local file logging
//!
//! # Example Configuration
//!
//! ```toml
//! [source]
//! host = "localhost"
//! port = 5432
//! database = "esus"
//! user = "postgres"
//! password = "${PEC_DB_PASSWORD}"
//!
//! [ingestion]
//! endpoint = "https://southamerica-east1-example.cloudfunctions.net/ingestPecData"
//! api_key = "${PEC_API_KEY}"
//! tenant_id = "3550308"
//!
//! [sync]
//! interval = "15"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

pub use loader::load_config;
pub use schema::{
    ApplicationConfig, ConnectorConfig, IngestionConfig, LoggingConfig, SourceConfig,
    StateConfig, SyncConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
