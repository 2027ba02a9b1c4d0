//! Progress event stream
//!
//! A cycle reports what it does as an ordered sequence of leveled messages on
//! a bounded channel. Every event is mirrored to `tracing`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc;

/// Severity of a progress event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgressLevel {
    Info,
    Warning,
    Error,
    Success,
}

impl fmt::Display for ProgressLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProgressLevel::Info => "INFO",
            ProgressLevel::Warning => "WARNING",
            ProgressLevel::Error => "ERROR",
            ProgressLevel::Success => "SUCCESS",
        })
    }
}

/// One progress message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub level: ProgressLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.level, self.message)
    }
}

/// Create a bounded progress channel
pub fn progress_channel(buffer: usize) -> (mpsc::Sender<ProgressEvent>, mpsc::Receiver<ProgressEvent>) {
    mpsc::channel(buffer.max(1))
}

/// Producer side used by the orchestrator and the dispatcher
///
/// Tracks how many warnings and errors were emitted so the cycle can be
/// classified at the end.
#[derive(Debug)]
pub struct ProgressReporter {
    tx: Option<mpsc::Sender<ProgressEvent>>,
    warnings: usize,
    errors: usize,
}

impl ProgressReporter {
    pub fn new(tx: Option<mpsc::Sender<ProgressEvent>>) -> Self {
        Self {
            tx,
            warnings: 0,
            errors: 0,
        }
    }

    /// Reporter that only logs
    pub fn silent() -> Self {
        Self::new(None)
    }

    pub async fn info(&mut self, message: impl Into<String>) {
        self.emit(ProgressLevel::Info, message.into()).await;
    }

    pub async fn warning(&mut self, message: impl Into<String>) {
        self.emit(ProgressLevel::Warning, message.into()).await;
    }

    pub async fn error(&mut self, message: impl Into<String>) {
        self.emit(ProgressLevel::Error, message.into()).await;
    }

    pub async fn success(&mut self, message: impl Into<String>) {
        self.emit(ProgressLevel::Success, message.into()).await;
    }

    pub fn warning_count(&self) -> usize {
        self.warnings
    }

    pub fn error_count(&self) -> usize {
        self.errors
    }

    async fn emit(&mut self, level: ProgressLevel, message: String) {
        match level {
            ProgressLevel::Info | ProgressLevel::Success => {
                tracing::info!(level = %level, "{message}")
            }
            ProgressLevel::Warning => {
                self.warnings += 1;
                tracing::warn!("{message}")
            }
            ProgressLevel::Error => {
                self.errors += 1;
                tracing::error!("{message}")
            }
        }

        if let Some(tx) = &self.tx {
            let event = ProgressEvent {
                level,
                message,
                timestamp: Utc::now(),
            };
            // A consumer that went away must not stall the cycle.
            if tx.send(event).await.is_err() {
                self.tx = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_events_are_ordered_and_counted() {
        let (tx, mut rx) = progress_channel(8);
        let mut reporter = ProgressReporter::new(Some(tx));

        reporter.info("one").await;
        reporter.warning("two").await;
        reporter.error("three").await;
        reporter.success("four").await;
        drop(reporter);

        let mut levels = Vec::new();
        while let Some(event) = rx.recv().await {
            levels.push(event.level);
        }
        assert_eq!(
            levels,
            vec![
                ProgressLevel::Info,
                ProgressLevel::Warning,
                ProgressLevel::Error,
                ProgressLevel::Success
            ]
        );
    }

    #[tokio::test]
    async fn test_dropped_receiver_does_not_block() {
        let (tx, rx) = progress_channel(1);
        drop(rx);
        let mut reporter = ProgressReporter::new(Some(tx));

        reporter.error("still counted").await;
        reporter.info("ignored").await;
        assert_eq!(reporter.error_count(), 1);
    }

    #[test]
    fn test_event_display() {
        let event = ProgressEvent {
            level: ProgressLevel::Warning,
            message: "Skipping".to_string(),
            timestamp: Utc::now(),
        };
        assert_eq!(event.to_string(), "[WARNING] Skipping");
    }
}
