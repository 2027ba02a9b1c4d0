// PEC Connector - e-SUS PEC production sync
// Copyright (c) 2025 PEC Connector Contributors
// Licensed under the MIT License

//! # PEC Connector - e-SUS PEC production sync
//!
//! PEC Connector reads clinical production recorded in a municipal e-SUS PEC
//! PostgreSQL database and pushes it, normalized, to a remote ingestion
//! endpoint on a schedule.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Discovering** which optional tables and columns the installed PEC schema has
//! - **Extracting** seven clinical domains with schema-adaptive SQL
//! - **Normalizing** rows into one canonical record shape
//! - **Dispatching** records to the endpoint in fixed-size batches
//! - **Tracking** a high-watermark so periodic cycles only read new production
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (schema, query, transform, cycle, scheduler, state)
//! - [`adapters`] - External integrations (PostgreSQL source, ingestion HTTP client)
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pec_connector::adapters::database::create_source_database;
//! use pec_connector::adapters::ingestion::IngestionClient;
//! use pec_connector::config::load_config;
//! use pec_connector::core::cycle::CycleOrchestrator;
//! use pec_connector::core::state::FileSettingsStore;
//! use std::sync::Arc;
//! use tokio::sync::watch;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("pec-connector.toml")?;
//!
//!     let db = create_source_database(&config.source)?;
//!     let sink = Arc::new(IngestionClient::new(&config.ingestion)?);
//!     let settings = Arc::new(FileSettingsStore::from_config(&config));
//!
//!     let orchestrator = CycleOrchestrator::new(db, sink, settings);
//!     let (_abort_tx, abort_rx) = watch::channel(false);
//!     let result = orchestrator.run_cycle(None, abort_rx).await;
//!
//!     println!("{} ({} records sent)", result.status(), result.records_sent);
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Fallible operations return [`domain::ConnectorError`]. Inside a cycle,
//! failures of one clinical domain are isolated and reported as progress
//! events instead of aborting the whole run.
//!
//! ## Logging
//!
//! Structured logging goes through the `tracing` crate; progress events
//! emitted during a cycle are mirrored into it.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
