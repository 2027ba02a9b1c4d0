//! Cycle orchestrator - runs one sync cycle end to end
//!
//! This module coordinates window computation, schema probing, per-domain
//! extraction, normalization, dispatch and the watermark decision. Nothing
//! escapes a cycle as an error: every failure becomes a progress event and
//! shapes the final [`CycleResult`].

use crate::adapters::database::SourceDatabase;
use crate::adapters::ingestion::IngestionSink;
use crate::core::cycle::phase::CyclePhase;
use crate::core::cycle::progress::{ProgressEvent, ProgressReporter};
use crate::core::cycle::result::{CycleResult, DomainOutcome, DomainReport};
use crate::core::dispatch::BatchDispatcher;
use crate::core::extract::{DomainError, DomainExtractor};
use crate::core::query::probed_tables;
use crate::core::scheduler::SyncInterval;
use crate::core::schema::SchemaInspector;
use crate::core::state::history::HistorySink;
use crate::core::state::manager::{StateManager, StoredWatermark};
use crate::core::state::settings::{
    SettingsStore, KEY_BATCH_SIZE, KEY_DB_HOST, KEY_LOOKBACK_DAYS, KEY_SCHEDULER_INTERVAL,
};
use crate::core::state::watermark::{compute_window, SyncWindow, Watermark};
use crate::core::transform::normalize_rows;
use crate::domain::{DomainTag, RawRow};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, watch};

const DEFAULT_INTERVAL: &str = "15";
const DEFAULT_LOOKBACK_DAYS: u32 = 30;
const DEFAULT_BATCH_SIZE: usize = 100;

/// How the cycle body stopped before finalization
enum Halt {
    Aborted,
    Fatal(String),
}

/// Cycle orchestrator
pub struct CycleOrchestrator {
    db: Arc<dyn SourceDatabase>,
    sink: Arc<dyn IngestionSink>,
    settings: Arc<dyn SettingsStore>,
    state: StateManager,
    history: Option<Arc<dyn HistorySink>>,
    phase: watch::Sender<CyclePhase>,
}

impl CycleOrchestrator {
    pub fn new(
        db: Arc<dyn SourceDatabase>,
        sink: Arc<dyn IngestionSink>,
        settings: Arc<dyn SettingsStore>,
    ) -> Self {
        let (phase, _) = watch::channel(CyclePhase::Idle);
        Self {
            db,
            sink,
            state: StateManager::new(settings.clone()),
            settings,
            history: None,
            phase,
        }
    }

    /// Hand every finished cycle to `history`
    pub fn with_history(mut self, history: Arc<dyn HistorySink>) -> Self {
        self.history = Some(history);
        self
    }

    /// Observe the current phase
    pub fn phase(&self) -> watch::Receiver<CyclePhase> {
        self.phase.subscribe()
    }

    pub fn current_phase(&self) -> CyclePhase {
        *self.phase.borrow()
    }

    /// Interval currently configured
    pub fn interval(&self) -> SyncInterval {
        SyncInterval::parse(&self.settings.get(KEY_SCHEDULER_INTERVAL, DEFAULT_INTERVAL))
    }

    /// Run one cycle starting now
    pub async fn run_cycle(
        &self,
        progress: Option<mpsc::Sender<ProgressEvent>>,
        abort: watch::Receiver<bool>,
    ) -> CycleResult {
        self.run_cycle_at(Utc::now(), progress, abort).await
    }

    /// Run one cycle whose start instant is `started_at`
    ///
    /// `started_at` is the watermark written if the cycle succeeds.
    pub async fn run_cycle_at(
        &self,
        started_at: DateTime<Utc>,
        progress: Option<mpsc::Sender<ProgressEvent>>,
        abort: watch::Receiver<bool>,
    ) -> CycleResult {
        let clock = Instant::now();
        let mut result = CycleResult::new(started_at);
        let mut progress = ProgressReporter::new(progress);

        tracing::info!(started_at = %started_at, "Starting sync cycle");

        let final_phase = match self.execute(&mut result, &mut progress, &abort).await {
            Ok(()) => self.finalize(&mut result, &mut progress).await,
            Err(Halt::Aborted) => {
                result.aborted = true;
                progress.warning("Sync aborted. Watermark not advanced.").await;
                CyclePhase::Aborted
            }
            Err(Halt::Fatal(message)) => {
                progress.error(message.clone()).await;
                result.fatal = Some(message);
                CyclePhase::Errored
            }
        };

        self.enter(final_phase);
        result.final_phase = final_phase;
        result.warnings = progress.warning_count();
        result.errors = progress.error_count();
        result.duration = clock.elapsed();

        if let Some(history) = &self.history {
            if let Err(e) = history.record(&result).await {
                tracing::warn!(error = %e, "Failed to record run history");
            }
        }

        result.log_summary();
        result
    }

    async fn execute(
        &self,
        result: &mut CycleResult,
        progress: &mut ProgressReporter,
        abort: &watch::Receiver<bool>,
    ) -> Result<(), Halt> {
        self.enter(CyclePhase::ComputingWindow);
        let window = self.compute_window(result.started_at, progress).await;
        result.window = Some(window);
        progress.info(window.describe()).await;
        checkpoint(abort)?;

        self.enter(CyclePhase::Connecting);
        let host = self.settings.get(KEY_DB_HOST, "");
        if host.is_empty() {
            progress.info("Connecting to DB...").await;
        } else {
            progress.info(format!("Connecting to DB {host}...")).await;
        }
        if let Err(e) = self.db.test_connection().await {
            return Err(Halt::Fatal(format!("Database connection failed: {e}")));
        }

        let profile = SchemaInspector::new(self.db.as_ref())
            .snapshot(probed_tables())
            .await;
        let extractor = DomainExtractor::new(self.db.as_ref(), &profile);

        let mut rows: Vec<RawRow> = Vec::new();
        for domain in DomainTag::ALL {
            checkpoint(abort)?;
            self.enter(CyclePhase::Extracting(domain));
            progress
                .info(format!(
                    "[{}/{}] Querying {}...",
                    domain.position(),
                    DomainTag::ALL.len(),
                    domain.label()
                ))
                .await;

            let extraction = extractor.extract(domain, window.start_date()).await;
            for warning in extraction.warnings {
                progress.warning(warning).await;
            }

            let outcome = match extraction.outcome {
                Ok(found) => {
                    progress.info(format!("   -> Found {} records.", found.len())).await;
                    let outcome = DomainOutcome::Extracted { rows: found.len() };
                    rows.extend(found);
                    outcome
                }
                Err(e) if e.is_connection_level() => {
                    return Err(Halt::Fatal(format!(
                        "Database connection lost while querying {}: {e}",
                        domain.label()
                    )));
                }
                Err(DomainError::Skipped { reason }) => {
                    progress.warning(format!("Skipping {}: {reason}", domain.label())).await;
                    DomainOutcome::Skipped { reason }
                }
                Err(e @ DomainError::Failed { .. }) => {
                    progress
                        .warning(format!("Skipping {} (Error): {e}", domain.label()))
                        .await;
                    DomainOutcome::Failed {
                        reason: e.to_string(),
                    }
                }
            };
            result.domains.push(DomainReport::new(domain, outcome));
        }

        self.enter(CyclePhase::Normalizing);
        let normalized = normalize_rows(rows);
        for (domain, count) in &normalized.skipped {
            progress
                .warning(format!("{}: skipped {count} row(s) without a ficha", domain.label()))
                .await;
        }
        for record in &normalized.records {
            if let Some(report) = result.report_mut(record.procedure.domain) {
                report.records += 1;
            }
        }
        result.rows_skipped = normalized.skipped_total();
        result.records_total = normalized.records.len();
        progress
            .info(format!("[TOTAL] Processing {} records...", normalized.records.len()))
            .await;

        checkpoint(abort)?;
        self.enter(CyclePhase::Dispatching);
        let dispatcher = BatchDispatcher::new(self.sink.clone(), self.batch_size());
        let summary = dispatcher.send(&normalized.records, progress, abort).await;
        result.batches_sent = summary.batches_sent;
        result.batches_failed = summary.batches_failed;
        result.records_sent = summary.records_sent;
        if summary.aborted {
            return Err(Halt::Aborted);
        }

        Ok(())
    }

    /// Classify the cycle and advance the watermark on success
    async fn finalize(&self, result: &mut CycleResult, progress: &mut ProgressReporter) -> CyclePhase {
        self.enter(CyclePhase::Finalizing);

        if progress.error_count() > 0 {
            progress
                .info("Cycle finished with errors. Watermark not advanced.")
                .await;
            return CyclePhase::Idle;
        }

        let previous = match self.state.load_watermark().await {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(error = %e, "Could not re-read watermark before advancing");
                StoredWatermark::Missing
            }
        };

        match self
            .state
            .advance_watermark(&previous, Watermark::new(result.started_at))
            .await
        {
            Ok(written) => {
                result.watermark = written;
                progress.success("Cycle Complete.").await;
            }
            Err(e) => {
                progress.error(format!("Failed to persist watermark: {e}")).await;
            }
        }
        CyclePhase::Idle
    }

    async fn compute_window(&self, now: DateTime<Utc>, progress: &mut ProgressReporter) -> SyncWindow {
        let interval = self.interval();
        let lookback_days = self.lookback_days();

        let stored = match self.state.load_watermark().await {
            Ok(stored) => stored,
            Err(e) => {
                progress
                    .warning(format!(
                        "Failed to read last run time ({e}). Defaulting to {lookback_days} days back."
                    ))
                    .await;
                StoredWatermark::Missing
            }
        };

        let decision = compute_window(&interval, stored.raw().as_deref(), lookback_days, now);
        if let Some(warning) = decision.warning {
            progress.warning(warning).await;
        }
        tracing::debug!(interval = %interval, window = ?decision.window, "Computed sync window");
        decision.window
    }

    fn lookback_days(&self) -> u32 {
        let raw = self
            .settings
            .get(KEY_LOOKBACK_DAYS, &DEFAULT_LOOKBACK_DAYS.to_string());
        raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(value = %raw, "Invalid lookback_days, using {DEFAULT_LOOKBACK_DAYS}");
            DEFAULT_LOOKBACK_DAYS
        })
    }

    fn batch_size(&self) -> usize {
        let raw = self.settings.get(KEY_BATCH_SIZE, &DEFAULT_BATCH_SIZE.to_string());
        match raw.trim().parse() {
            Ok(size) if size > 0 => size,
            _ => {
                tracing::warn!(value = %raw, "Invalid batch_size, using {DEFAULT_BATCH_SIZE}");
                DEFAULT_BATCH_SIZE
            }
        }
    }

    fn enter(&self, phase: CyclePhase) {
        tracing::trace!(phase = %phase, "Cycle phase");
        self.phase.send_replace(phase);
    }
}

fn checkpoint(abort: &watch::Receiver<bool>) -> Result<(), Halt> {
    if *abort.borrow() {
        Err(Halt::Aborted)
    } else {
        Ok(())
    }
}
