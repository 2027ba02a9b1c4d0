//! State manager for watermark persistence
//!
//! Wraps the settings collaborator with watermark parsing and the
//! forward-only update rule.

use crate::core::state::settings::SettingsStore;
use crate::core::state::watermark::Watermark;
use crate::domain::Result;
use std::sync::Arc;

/// Stored watermark as found at cycle start
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredWatermark {
    /// No successful cycle recorded yet
    Missing,
    /// Parsed watermark
    Valid(Watermark),
    /// Present but unparsable; kept raw for diagnostics
    Malformed(String),
}

impl StoredWatermark {
    /// Raw value to feed window computation
    pub fn raw(&self) -> Option<String> {
        match self {
            StoredWatermark::Missing => None,
            StoredWatermark::Valid(wm) => Some(wm.to_iso()),
            StoredWatermark::Malformed(raw) => Some(raw.clone()),
        }
    }

    pub fn valid(&self) -> Option<Watermark> {
        match self {
            StoredWatermark::Valid(wm) => Some(*wm),
            _ => None,
        }
    }
}

/// State manager for watermark persistence
pub struct StateManager {
    settings: Arc<dyn SettingsStore>,
}

impl StateManager {
    pub fn new(settings: Arc<dyn SettingsStore>) -> Self {
        Self { settings }
    }

    /// Load the watermark
    ///
    /// # Errors
    ///
    /// Returns an error if the settings collaborator cannot be read.
    pub async fn load_watermark(&self) -> Result<StoredWatermark> {
        let stored = match self.settings.last_run_success().await? {
            None => StoredWatermark::Missing,
            Some(raw) if raw.trim().is_empty() => StoredWatermark::Missing,
            Some(raw) => match Watermark::parse(&raw) {
                Ok(wm) => StoredWatermark::Valid(wm),
                Err(_) => StoredWatermark::Malformed(raw),
            },
        };
        Ok(stored)
    }

    /// Persist `candidate` unless it would move the watermark backward
    ///
    /// Returns the watermark written, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings collaborator rejects the write.
    pub async fn advance_watermark(
        &self,
        previous: &StoredWatermark,
        candidate: Watermark,
    ) -> Result<Option<Watermark>> {
        let Some(next) = Watermark::advance(previous.valid(), candidate) else {
            tracing::warn!(
                previous = ?previous.valid().map(|w| w.to_iso()),
                candidate = %candidate,
                "Refusing to move watermark backward"
            );
            return Ok(None);
        };

        self.settings.set_last_run_success(&next.to_iso()).await?;
        tracing::info!(watermark = %next, "Watermark advanced");
        Ok(Some(next))
    }
}
