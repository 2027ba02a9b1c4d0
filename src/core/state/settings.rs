//! Settings collaborator
//!
//! The engine reads its per-cycle parameters and the last-success timestamp
//! through [`SettingsStore`] and never touches the on-disk format.

use crate::config::ConnectorConfig;
use crate::domain::{ConnectorError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Interval setting (`"15"`, `"12 hours"`, `"Manual Only"`)
pub const KEY_SCHEDULER_INTERVAL: &str = "scheduler_interval";
/// Days covered by a full window
pub const KEY_LOOKBACK_DAYS: &str = "lookback_days";
/// Records per ingestion call
pub const KEY_BATCH_SIZE: &str = "batch_size";
/// Source database host, for progress messages
pub const KEY_DB_HOST: &str = "db_host";

/// Key/value settings plus the persisted last-success timestamp
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Setting value, or `default` when unset
    fn get(&self, key: &str, default: &str) -> String;

    /// Last successful cycle start as an ISO-8601 string
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted state cannot be read.
    async fn last_run_success(&self) -> Result<Option<String>>;

    /// Persist the last successful cycle start
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be written.
    async fn set_last_run_success(&self, iso_timestamp: &str) -> Result<()>;
}

/// On-disk content of `state.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PersistedState {
    last_run_success: Option<String>,
    updated_at: Option<DateTime<Utc>>,
}

/// Settings backed by the loaded configuration and a JSON state file
#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    values: BTreeMap<String, String>,
    state_path: PathBuf,
}

impl FileSettingsStore {
    pub fn new(values: BTreeMap<String, String>, state_path: impl Into<PathBuf>) -> Self {
        Self {
            values,
            state_path: state_path.into(),
        }
    }

    /// Settings derived from the configuration file
    pub fn from_config(config: &ConnectorConfig) -> Self {
        let values = BTreeMap::from([
            (KEY_SCHEDULER_INTERVAL.to_string(), config.sync.interval.clone()),
            (KEY_LOOKBACK_DAYS.to_string(), config.sync.lookback_days.to_string()),
            (KEY_BATCH_SIZE.to_string(), config.sync.batch_size.to_string()),
            (KEY_DB_HOST.to_string(), config.source.host.clone()),
        ]);
        Self::new(values, config.state.state_file())
    }

    /// Override one setting for this process only
    pub fn with_value(mut self, key: &str, value: impl Into<String>) -> Self {
        self.values.insert(key.to_string(), value.into());
        self
    }

    /// Path of the state file
    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    async fn read_state(&self) -> Result<PersistedState> {
        match tokio::fs::read_to_string(&self.state_path).await {
            Ok(contents) => serde_json::from_str(&contents).map_err(|e| {
                ConnectorError::State(format!(
                    "Corrupt state file {}: {e}",
                    self.state_path.display()
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(PersistedState::default()),
            Err(e) => Err(ConnectorError::State(format!(
                "Failed to read state file {}: {e}",
                self.state_path.display()
            ))),
        }
    }
}

#[async_trait]
impl SettingsStore for FileSettingsStore {
    fn get(&self, key: &str, default: &str) -> String {
        self.values
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }

    async fn last_run_success(&self) -> Result<Option<String>> {
        Ok(self.read_state().await?.last_run_success)
    }

    async fn set_last_run_success(&self, iso_timestamp: &str) -> Result<()> {
        let state = PersistedState {
            last_run_success: Some(iso_timestamp.to_string()),
            updated_at: Some(Utc::now()),
        };
        write_atomic(&self.state_path, &serde_json::to_vec_pretty(&state)?).await?;

        tracing::debug!(path = %self.state_path.display(), watermark = %iso_timestamp, "Persisted watermark");
        Ok(())
    }
}

/// Write through a sibling temp file and rename over the target
pub(crate) async fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, contents).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
