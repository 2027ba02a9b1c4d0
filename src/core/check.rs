//! Connection check
//!
//! Verifies that the source database answers and that the ingestion
//! endpoint accepts the configured credential, without running a cycle.

use crate::adapters::database::SourceDatabase;
use crate::adapters::ingestion::IngestionSink;
use std::time::Duration;

/// Outcome of a connection check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionReport {
    pub db: bool,
    pub api: bool,
    /// One line per collaborator, human readable
    pub details: Vec<String>,
}

impl ConnectionReport {
    pub fn all_ok(&self) -> bool {
        self.db && self.api
    }
}

/// Probe both collaborators; each probe is bounded by `timeout`
pub async fn check_connections(
    db: &dyn SourceDatabase,
    sink: &dyn IngestionSink,
    timeout: Duration,
) -> ConnectionReport {
    let mut details = Vec::with_capacity(2);

    let db_ok = match tokio::time::timeout(timeout, db.test_connection()).await {
        Ok(Ok(())) => {
            details.push(format!("Database OK ({})", db.describe()));
            true
        }
        Ok(Err(e)) => {
            details.push(format!("Database FAILED ({}): {e}", db.describe()));
            false
        }
        Err(_) => {
            details.push(format!(
                "Database FAILED ({}): no answer within {}s",
                db.describe(),
                timeout.as_secs()
            ));
            false
        }
    };

    let api_ok = match tokio::time::timeout(timeout, sink.probe()).await {
        Ok(Ok(())) => {
            details.push(format!("API OK ({})", sink.endpoint()));
            true
        }
        Ok(Err(e)) => {
            details.push(format!("API FAILED ({}): {e}", sink.endpoint()));
            false
        }
        Err(_) => {
            details.push(format!(
                "API FAILED ({}): no answer within {}s",
                sink.endpoint(),
                timeout.as_secs()
            ));
            false
        }
    };

    tracing::info!(db = db_ok, api = api_ok, "Connection check finished");

    ConnectionReport {
        db: db_ok,
        api: api_ok,
        details,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::{FakeSink, FakeSource};

    #[tokio::test]
    async fn test_both_reachable() {
        let source = FakeSource::new();
        let sink = FakeSink::new();

        let report = check_connections(&source, &sink, Duration::from_secs(1)).await;
        assert!(report.all_ok());
        assert_eq!(report.details.len(), 2);
        assert_eq!(sink.batch_sizes(), vec![0]);
    }

    #[tokio::test]
    async fn test_failures_are_reported_independently() {
        let source = FakeSource::new().unreachable();
        let sink = FakeSink::new();

        let report = check_connections(&source, &sink, Duration::from_secs(1)).await;
        assert!(!report.db);
        assert!(report.api);
        assert!(report.details[0].starts_with("Database FAILED"));

        let report = check_connections(&FakeSource::new(), &FakeSink::new().unreachable(), Duration::from_secs(1)).await;
        assert!(report.db);
        assert!(!report.api);
    }
}
