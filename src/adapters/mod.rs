//! External system integrations for the connector.
//!
//! This module provides adapters for the two systems a sync cycle touches:
//!
//! - [`database`] - Source database abstraction (trait-based)
//! - [`postgresql`] - PostgreSQL implementation for the e-SUS PEC schema
//! - [`ingestion`] - Remote ingestion endpoint (trait plus HTTPS client)
//!
//! # Design Pattern
//!
//! Adapters follow the **Adapter Pattern** to isolate external dependencies and
//! enable testing with fake implementations.
//!
//! ```rust,no_run
//! use pec_connector::adapters::database::create_source_database;
//! use pec_connector::adapters::ingestion::{IngestionClient, IngestionSink};
//! use pec_connector::config::load_config;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("pec-connector.toml")?;
//!
//! let source = create_source_database(&config.source)?;
//! source.test_connection().await?;
//!
//! let sink = IngestionClient::new(&config.ingestion)?;
//! sink.probe().await?;
//! # Ok(())
//! # }
//! ```

pub mod database;
pub mod ingestion;
pub mod postgresql;
