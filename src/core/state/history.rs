//! Run history collaborator
//!
//! Finished cycles are appended newest-first to a bounded JSON file that the
//! `status` command reads back.

use crate::config::StateConfig;
use crate::core::cycle::result::{CycleResult, CycleStatus};
use crate::core::state::settings::write_atomic;
use crate::domain::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Receiver of finalized cycle results
#[async_trait]
pub trait HistorySink: Send + Sync {
    /// Record a finished cycle
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be persisted. Callers log it and
    /// carry on; history never fails a cycle.
    async fn record(&self, result: &CycleResult) -> Result<()>;
}

/// One line of run history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub status: CycleStatus,
    pub message: String,
    pub records: usize,
}

impl HistoryEntry {
    pub fn from_result(result: &CycleResult) -> Self {
        Self {
            timestamp: result.started_at,
            status: result.status(),
            message: result.history_message(),
            records: result.records_sent,
        }
    }
}

/// History kept in `history.json`
pub struct JsonHistoryStore {
    path: PathBuf,
    limit: usize,
    write_lock: Mutex<()>,
}

impl JsonHistoryStore {
    pub fn new(path: impl Into<PathBuf>, limit: usize) -> Self {
        Self {
            path: path.into(),
            limit: limit.max(1),
            write_lock: Mutex::new(()),
        }
    }

    pub fn from_config(config: &StateConfig) -> Self {
        Self::new(config.history_file(), config.history_limit)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored entries, newest first
    ///
    /// A missing or unreadable file yields an empty history.
    pub async fn entries(&self) -> Vec<HistoryEntry> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to read history");
                return Vec::new();
            }
        };

        serde_json::from_str(&contents).unwrap_or_else(|e| {
            tracing::warn!(path = %self.path.display(), error = %e, "Ignoring corrupt history file");
            Vec::new()
        })
    }

    /// Insert `entry` at the front and trim to the limit
    pub async fn append(&self, entry: HistoryEntry) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut entries = self.entries().await;
        entries.insert(0, entry);
        entries.truncate(self.limit);

        write_atomic(&self.path, &serde_json::to_vec_pretty(&entries)?).await
    }
}

#[async_trait]
impl HistorySink for JsonHistoryStore {
    async fn record(&self, result: &CycleResult) -> Result<()> {
        self.append(HistoryEntry::from_result(result)).await
    }
}
