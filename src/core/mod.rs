//! Core sync engine.
//!
//! # Modules
//!
//! - [`schema`] - Catalog probe producing a per-cycle [`schema::SchemaProfile`]
//! - [`query`] - Domain catalogue, optional fragments and query composition
//! - [`extract`] - Per-domain extraction behind isolated failure boundaries
//! - [`transform`] - Row to canonical record mapping and identity rules
//! - [`dispatch`] - Fixed-size batch delivery to the ingestion endpoint
//! - [`state`] - Watermark, settings collaborator and run history
//! - [`cycle`] - Cycle orchestrator, phases, progress stream and results
//! - [`scheduler`] - Interval parsing and the single-flight tick loop
//! - [`check`] - Connectivity check for both collaborators
//!
//! # Cycle Workflow
//!
//! 1. **Window**: start from the stored watermark, or from the lookback window
//! 2. **Connect**: verify the source database answers
//! 3. **Probe**: snapshot optional tables and columns once
//! 4. **Extract**: run the seven domains in fixed order, each isolated
//! 5. **Normalize**: map rows to canonical records with stable external ids
//! 6. **Dispatch**: post batches of 100, continuing past failed batches
//! 7. **Finalize**: advance the watermark to the cycle start only on success
//!
//! # Example
//!
//! ```rust,no_run
//! use pec_connector::adapters::database::create_source_database;
//! use pec_connector::adapters::ingestion::IngestionClient;
//! use pec_connector::config::load_config;
//! use pec_connector::core::cycle::CycleOrchestrator;
//! use pec_connector::core::state::FileSettingsStore;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("pec-connector.toml")?;
//!
//! let db = create_source_database(&config.source)?;
//! let sink = Arc::new(IngestionClient::new(&config.ingestion)?);
//! let settings = Arc::new(FileSettingsStore::from_config(&config));
//!
//! let orchestrator = CycleOrchestrator::new(db, sink, settings);
//! let (_abort_tx, abort_rx) = tokio::sync::watch::channel(false);
//! let result = orchestrator.run_cycle(None, abort_rx).await;
//!
//! println!("{}: sent {}", result.status(), result.records_sent);
//! # Ok(())
//! # }
//! ```

pub mod check;
pub mod cycle;
pub mod dispatch;
pub mod extract;
pub mod query;
pub mod scheduler;
pub mod schema;
pub mod state;
pub mod transform;

#[cfg(test)]
pub(crate) mod testing;
