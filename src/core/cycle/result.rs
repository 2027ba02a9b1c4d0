//! Cycle result and reporting
//!
//! This module defines structures for tracking and reporting the outcome of
//! one sync cycle.

use crate::core::cycle::phase::CyclePhase;
use crate::core::state::watermark::{SyncWindow, Watermark};
use crate::domain::DomainTag;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Overall classification of a finished cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CycleStatus {
    /// No error events and not aborted; the watermark advanced
    Success,
    /// Aborted before finishing; nothing failed
    Warning,
    /// A connection failed or a batch was not delivered
    Error,
}

impl fmt::Display for CycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CycleStatus::Success => "SUCCESS",
            CycleStatus::Warning => "WARNING",
            CycleStatus::Error => "ERROR",
        })
    }
}

/// What happened to one domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainOutcome {
    /// Query ran; `rows` raw rows came back
    Extracted { rows: usize },
    /// Query not composed because the schema lacks required tables
    Skipped { reason: String },
    /// Query failed; the domain contributed nothing
    Failed { reason: String },
}

/// Per-domain counters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainReport {
    pub domain: DomainTag,
    pub outcome: DomainOutcome,
    /// Canonical records produced after normalization
    pub records: usize,
}

impl DomainReport {
    pub fn new(domain: DomainTag, outcome: DomainOutcome) -> Self {
        Self {
            domain,
            outcome,
            records: 0,
        }
    }

    pub fn rows(&self) -> usize {
        match self.outcome {
            DomainOutcome::Extracted { rows } => rows,
            _ => 0,
        }
    }
}

/// Aggregate outcome of one cycle
#[derive(Debug, Clone)]
pub struct CycleResult {
    /// Cycle start; becomes the watermark on success
    pub started_at: DateTime<Utc>,

    /// Window extracted, once computed
    pub window: Option<SyncWindow>,

    /// Domains in extraction order
    pub domains: Vec<DomainReport>,

    /// Rows dropped by normalization (no ficha)
    pub rows_skipped: usize,

    /// Canonical records handed to the dispatcher
    pub records_total: usize,

    /// Records the endpoint acknowledged
    pub records_sent: usize,

    pub batches_sent: usize,
    pub batches_failed: usize,

    pub warnings: usize,
    pub errors: usize,

    pub aborted: bool,

    /// Phase the cycle ended in
    pub final_phase: CyclePhase,

    /// Watermark written at finalization
    pub watermark: Option<Watermark>,

    /// Failure that ended the cycle early, if any
    pub fatal: Option<String>,

    pub duration: Duration,
}

impl CycleResult {
    /// Create an empty result for a cycle starting at `started_at`
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            window: None,
            domains: Vec::new(),
            rows_skipped: 0,
            records_total: 0,
            records_sent: 0,
            batches_sent: 0,
            batches_failed: 0,
            warnings: 0,
            errors: 0,
            aborted: false,
            final_phase: CyclePhase::Idle,
            watermark: None,
            fatal: None,
            duration: Duration::from_secs(0),
        }
    }

    /// Classification used for the watermark decision and the history entry
    pub fn status(&self) -> CycleStatus {
        if self.errors > 0 || self.fatal.is_some() {
            CycleStatus::Error
        } else if self.aborted {
            CycleStatus::Warning
        } else {
            CycleStatus::Success
        }
    }

    pub fn is_success(&self) -> bool {
        self.status() == CycleStatus::Success
    }

    pub fn report(&self, domain: DomainTag) -> Option<&DomainReport> {
        self.domains.iter().find(|r| r.domain == domain)
    }

    pub fn report_mut(&mut self, domain: DomainTag) -> Option<&mut DomainReport> {
        self.domains.iter_mut().find(|r| r.domain == domain)
    }

    /// One-line message stored in the run history
    pub fn history_message(&self) -> String {
        if let Some(fatal) = &self.fatal {
            return fatal.clone();
        }
        match self.status() {
            CycleStatus::Success if self.warnings > 0 => format!(
                "Sync completed with {} warning(s). Sent {} records.",
                self.warnings, self.records_sent
            ),
            CycleStatus::Success => format!("Sync completed. Sent {} records.", self.records_sent),
            CycleStatus::Warning => format!(
                "Sync aborted. Sent {} of {} records.",
                self.records_sent, self.records_total
            ),
            CycleStatus::Error => format!(
                "Sync finished with errors: {} of {} batches failed.",
                self.batches_failed,
                self.batches_sent + self.batches_failed
            ),
        }
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            status = %self.status(),
            phase = %self.final_phase,
            records_total = self.records_total,
            records_sent = self.records_sent,
            batches_sent = self.batches_sent,
            batches_failed = self.batches_failed,
            rows_skipped = self.rows_skipped,
            warnings = self.warnings,
            errors = self.errors,
            duration_secs = self.duration.as_secs(),
            "Sync cycle finished"
        );

        for report in &self.domains {
            match &report.outcome {
                DomainOutcome::Extracted { rows } => tracing::debug!(
                    domain = %report.domain,
                    rows = rows,
                    records = report.records,
                    "Domain extracted"
                ),
                DomainOutcome::Skipped { reason } | DomainOutcome::Failed { reason } => {
                    tracing::warn!(domain = %report.domain, reason = %reason, "Domain not synchronized")
                }
            }
        }
    }
}
