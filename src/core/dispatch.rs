//! Batch dispatcher
//!
//! Sends canonical records to the ingestion endpoint in fixed-size groups.
//! A failed batch is reported and skipped; the remaining batches still go out.

use crate::adapters::ingestion::IngestionSink;
use crate::core::cycle::progress::ProgressReporter;
use crate::domain::CanonicalRecord;
use std::sync::Arc;
use tokio::sync::watch;

/// Counters for one dispatch run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub batches_sent: usize,
    pub batches_failed: usize,
    pub records_sent: usize,
    /// Stopped early on an abort request
    pub aborted: bool,
}

impl DispatchSummary {
    pub fn all_delivered(&self) -> bool {
        self.batches_failed == 0 && !self.aborted
    }
}

/// Batch dispatcher
pub struct BatchDispatcher {
    sink: Arc<dyn IngestionSink>,
    batch_size: usize,
}

impl BatchDispatcher {
    pub fn new(sink: Arc<dyn IngestionSink>, batch_size: usize) -> Self {
        Self {
            sink,
            batch_size: batch_size.max(1),
        }
    }

    /// Send every record, one call per batch, in order
    ///
    /// The abort flag is checked before each batch.
    pub async fn send(
        &self,
        records: &[CanonicalRecord],
        progress: &mut ProgressReporter,
        abort: &watch::Receiver<bool>,
    ) -> DispatchSummary {
        let mut summary = DispatchSummary::default();
        let total_batches = records.len().div_ceil(self.batch_size);

        for (index, batch) in records.chunks(self.batch_size).enumerate() {
            let stop = *abort.borrow();
            if stop {
                tracing::info!(
                    sent = summary.batches_sent,
                    remaining = total_batches - index,
                    "Abort requested, stopping dispatch"
                );
                summary.aborted = true;
                break;
            }

            let is_last = index + 1 == total_batches;
            match self.sink.post_batch(batch).await {
                Ok(()) => {
                    summary.batches_sent += 1;
                    summary.records_sent += batch.len();
                    if is_last {
                        progress.info(format!("Final batch of {} sent.", batch.len())).await;
                    } else {
                        progress.info(format!("Batch of {} sent.", batch.len())).await;
                    }
                }
                Err(e) => {
                    summary.batches_failed += 1;
                    tracing::debug!(
                        endpoint = %self.sink.endpoint(),
                        batch = index + 1,
                        size = batch.len(),
                        error = %e,
                        "Batch rejected"
                    );
                    progress
                        .error(format!("Upload Failed. Batch {} of {}: {e}", index + 1, total_batches))
                        .await;
                }
            }
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cycle::progress::{progress_channel, ProgressLevel};
    use crate::core::testing::FakeSink;
    use crate::core::transform::normalize_row;
    use crate::domain::{DomainTag, RawRow};

    fn records(n: usize) -> Vec<CanonicalRecord> {
        (0..n)
            .filter_map(|i| normalize_row(RawRow::new(format!("F{i}"), DomainTag::Consultation)))
            .collect()
    }

    fn no_abort() -> watch::Receiver<bool> {
        watch::channel(false).1
    }

    #[tokio::test]
    async fn test_250_records_go_out_as_100_100_50() {
        let sink = Arc::new(FakeSink::new());
        let dispatcher = BatchDispatcher::new(sink.clone(), 100);
        let (tx, mut rx) = progress_channel(16);
        let mut progress = ProgressReporter::new(Some(tx));

        let summary = dispatcher.send(&records(250), &mut progress, &no_abort()).await;
        drop(progress);

        assert_eq!(sink.batch_sizes(), vec![100, 100, 50]);
        assert_eq!(summary.records_sent, 250);
        assert!(summary.all_delivered());

        let mut messages = Vec::new();
        while let Some(event) = rx.recv().await {
            messages.push(event.message);
        }
        assert_eq!(
            messages,
            vec!["Batch of 100 sent.", "Batch of 100 sent.", "Final batch of 50 sent."]
        );
    }

    #[tokio::test]
    async fn test_failed_batch_does_not_stop_the_rest() {
        let sink = Arc::new(FakeSink::new().failing_call(1));
        let dispatcher = BatchDispatcher::new(sink.clone(), 100);
        let (tx, mut rx) = progress_channel(16);
        let mut progress = ProgressReporter::new(Some(tx));

        let summary = dispatcher.send(&records(250), &mut progress, &no_abort()).await;
        assert_eq!(progress.error_count(), 1);
        drop(progress);

        assert_eq!(sink.call_count(), 3);
        assert_eq!(sink.batch_sizes(), vec![100, 50]);
        assert_eq!(summary.batches_failed, 1);
        assert_eq!(summary.records_sent, 150);
        assert!(!summary.all_delivered());

        let mut levels = Vec::new();
        while let Some(event) = rx.recv().await {
            levels.push(event.level);
        }
        assert_eq!(levels[1], ProgressLevel::Error);
    }

    #[tokio::test]
    async fn test_abort_stops_before_first_batch() {
        let sink = Arc::new(FakeSink::new());
        let dispatcher = BatchDispatcher::new(sink.clone(), 100);
        let (_abort_tx, abort_rx) = watch::channel(true);

        let summary = dispatcher
            .send(&records(10), &mut ProgressReporter::silent(), &abort_rx)
            .await;

        assert!(summary.aborted);
        assert_eq!(sink.call_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_input_sends_nothing() {
        let sink = Arc::new(FakeSink::new());
        let dispatcher = BatchDispatcher::new(sink.clone(), 100);

        let summary = dispatcher
            .send(&[], &mut ProgressReporter::silent(), &no_abort())
            .await;

        assert_eq!(summary, DispatchSummary::default());
        assert_eq!(sink.call_count(), 0);
    }
}
