//! CLI command implementations
//!
//! This module contains all CLI command implementations and the wiring they
//! share.

pub mod check;
pub mod init;
pub mod run;
pub mod status;
pub mod sync;
pub mod validate;

use crate::adapters::database::{create_source_database, SourceDatabase};
use crate::adapters::ingestion::IngestionClient;
use crate::config::ConnectorConfig;
use crate::core::cycle::{CycleOrchestrator, ProgressEvent, ProgressLevel};
use crate::core::state::{FileSettingsStore, JsonHistoryStore};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Collaborators built from configuration
pub(crate) struct Engine {
    pub db: Arc<dyn SourceDatabase>,
    pub sink: Arc<IngestionClient>,
    pub orchestrator: Arc<CycleOrchestrator>,
}

/// Build the engine, printing the failure and returning its exit code on error
pub(crate) fn build_engine(config: &ConnectorConfig, settings: FileSettingsStore) -> Result<Engine, i32> {
    let db = create_source_database(&config.source).map_err(|e| {
        tracing::error!(error = %e, "Failed to create source database client");
        eprintln!("Failed to initialize source database: {e}");
        4 // Connection error exit code
    })?;

    let sink = IngestionClient::new(&config.ingestion).map(Arc::new).map_err(|e| {
        tracing::error!(error = %e, "Failed to create ingestion client");
        eprintln!("Failed to initialize ingestion client: {e}");
        2 // Configuration error exit code
    })?;

    let history = Arc::new(JsonHistoryStore::from_config(&config.state));
    let orchestrator = Arc::new(
        CycleOrchestrator::new(db.clone(), sink.clone(), Arc::new(settings)).with_history(history),
    );

    Ok(Engine {
        db,
        sink,
        orchestrator,
    })
}

/// Print progress events to the terminal until the channel closes
pub(crate) fn spawn_progress_printer(mut rx: mpsc::Receiver<ProgressEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let time = event.timestamp.with_timezone(&chrono::Local).format("%H:%M:%S");
            match event.level {
                ProgressLevel::Info => println!("[{time}] {}", event.message),
                ProgressLevel::Success => println!("[{time}] ✅ {}", event.message),
                ProgressLevel::Warning => println!("[{time}] ⚠️  {}", event.message),
                ProgressLevel::Error => eprintln!("[{time}] ❌ {}", event.message),
            }
        }
    })
}
