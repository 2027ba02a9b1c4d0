//! In-memory collaborators for unit tests

use crate::adapters::database::SourceDatabase;
use crate::adapters::ingestion::IngestionSink;
use crate::core::cycle::result::CycleResult;
use crate::core::state::history::{HistoryEntry, HistorySink};
use crate::core::state::settings::SettingsStore;
use crate::domain::{CanonicalRecord, ConnectorError, DomainTag, IngestionError, RawRow, Result, SourceError};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::watch;

/// Domain a composed statement extracts, read from its tag projection
pub fn domain_of(sql: &str) -> Option<DomainTag> {
    DomainTag::ALL
        .into_iter()
        .find(|tag| sql.contains(&format!("CAST('{}' AS TEXT) AS domain_tag", tag.as_str())))
}

/// Scriptable source database
#[derive(Default)]
pub struct FakeSource {
    tables: BTreeMap<String, BTreeSet<String>>,
    failing_probes: BTreeSet<String>,
    rows: BTreeMap<DomainTag, Vec<RawRow>>,
    failing_domains: BTreeSet<DomainTag>,
    lost_at: Option<DomainTag>,
    unreachable: bool,
    connect_delay: Option<std::time::Duration>,
    abort_after: Option<(DomainTag, watch::Sender<bool>)>,
    queries: Mutex<Vec<String>>,
    probes: AtomicUsize,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, table: &str, columns: &[&str]) -> Self {
        self.tables.insert(
            table.to_string(),
            columns.iter().map(|c| c.to_string()).collect(),
        );
        self
    }

    pub fn failing_probe(mut self, table: &str) -> Self {
        self.failing_probes.insert(table.to_string());
        self
    }

    pub fn with_rows(mut self, domain: DomainTag, rows: Vec<RawRow>) -> Self {
        self.rows.entry(domain).or_default().extend(rows);
        self
    }

    pub fn failing_domain(mut self, domain: DomainTag) -> Self {
        self.failing_domains.insert(domain);
        self
    }

    /// Connection drops while extracting `domain`
    pub fn connection_lost_at(mut self, domain: DomainTag) -> Self {
        self.lost_at = Some(domain);
        self
    }

    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    /// Hold every connection test for `delay`
    pub fn slow_connect(mut self, delay: std::time::Duration) -> Self {
        self.connect_delay = Some(delay);
        self
    }

    /// Raise `abort` once `domain` has been served
    pub fn abort_after(mut self, domain: DomainTag, abort: watch::Sender<bool>) -> Self {
        self.abort_after = Some((domain, abort));
        self
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    /// Domains queried, in order
    pub fn queried_domains(&self) -> Vec<DomainTag> {
        self.queries().iter().filter_map(|sql| domain_of(sql)).collect()
    }

    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceDatabase for FakeSource {
    async fn test_connection(&self) -> Result<()> {
        if let Some(delay) = self.connect_delay {
            tokio::time::sleep(delay).await;
        }
        if self.unreachable {
            return Err(SourceError::ConnectionFailed("connection refused".to_string()).into());
        }
        Ok(())
    }

    async fn table_columns(&self, table: &str) -> Result<BTreeSet<String>> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        if self.failing_probes.contains(table) {
            return Err(SourceError::QueryFailed("permission denied for schema".to_string()).into());
        }
        Ok(self.tables.get(table).cloned().unwrap_or_default())
    }

    async fn fetch_rows(&self, sql: &str, since: NaiveDate) -> Result<Vec<RawRow>> {
        self.queries.lock().unwrap().push(sql.to_string());
        let domain = domain_of(sql)
            .ok_or_else(|| ConnectorError::Other("query carries no domain tag".to_string()))?;

        if self.unreachable || self.lost_at == Some(domain) {
            return Err(SourceError::ConnectionFailed("server closed the connection".to_string()).into());
        }
        if self.failing_domains.contains(&domain) {
            return Err(SourceError::QueryFailed(format!(
                "relation for {domain} does not exist"
            ))
            .into());
        }

        let rows = self
            .rows
            .get(&domain)
            .map(|rows| {
                rows.iter()
                    .filter(|row| row.production_date.map_or(true, |d| d >= since))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some((after, abort)) = &self.abort_after {
            if *after == domain {
                abort.send_replace(true);
            }
        }
        Ok(rows)
    }

    fn describe(&self) -> String {
        "postgresql://fake@localhost:5432/esus".to_string()
    }
}

/// Recording ingestion endpoint
#[derive(Default)]
pub struct FakeSink {
    batches: Mutex<Vec<Vec<CanonicalRecord>>>,
    calls: AtomicUsize,
    failing_calls: BTreeSet<usize>,
    unreachable: bool,
}

impl FakeSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the call with this zero-based index
    pub fn failing_call(mut self, index: usize) -> Self {
        self.failing_calls.insert(index);
        self
    }

    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    /// Sizes of accepted batches, in order
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().unwrap().iter().map(Vec::len).collect()
    }

    pub fn records(&self) -> Vec<CanonicalRecord> {
        self.batches.lock().unwrap().iter().flatten().cloned().collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IngestionSink for FakeSink {
    async fn post_batch(&self, records: &[CanonicalRecord]) -> Result<()> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unreachable {
            return Err(IngestionError::ConnectionFailed("dns error".to_string()).into());
        }
        if self.failing_calls.contains(&index) {
            return Err(IngestionError::Rejected {
                status: 500,
                message: "Internal Server Error".to_string(),
            }
            .into());
        }
        self.batches.lock().unwrap().push(records.to_vec());
        Ok(())
    }

    fn endpoint(&self) -> &str {
        "http://ingest.test/api/ingest"
    }
}

/// Settings held in memory
#[derive(Default)]
pub struct MemorySettings {
    values: Mutex<BTreeMap<String, String>>,
    last_run: Mutex<Option<String>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(self, key: &str, value: &str) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&self, key: &str, value: &str) {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    pub fn set_raw_last_run(&self, raw: Option<&str>) {
        *self.last_run.lock().unwrap() = raw.map(str::to_string);
    }

    pub fn raw_last_run(&self) -> Option<String> {
        self.last_run.lock().unwrap().clone()
    }
}

#[async_trait]
impl SettingsStore for MemorySettings {
    fn get(&self, key: &str, default: &str) -> String {
        self.values
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }

    async fn last_run_success(&self) -> Result<Option<String>> {
        Ok(self.raw_last_run())
    }

    async fn set_last_run_success(&self, iso_timestamp: &str) -> Result<()> {
        self.set_raw_last_run(Some(iso_timestamp));
        Ok(())
    }
}

/// History held in memory
#[derive(Default)]
pub struct MemoryHistory {
    entries: Mutex<Vec<HistoryEntry>>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded entries, oldest first
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.entries.lock().unwrap().clone()
    }
}

#[async_trait]
impl HistorySink for MemoryHistory {
    async fn record(&self, result: &CycleResult) -> Result<()> {
        self.entries
            .lock()
            .unwrap()
            .push(HistoryEntry::from_result(result));
        Ok(())
    }
}
