//! Integration tests for the on-disk watermark and run history

use chrono::{TimeZone, Utc};
use pec_connector::core::cycle::{CycleResult, CycleStatus};
use pec_connector::core::state::{
    FileSettingsStore, HistoryEntry, HistorySink, JsonHistoryStore, SettingsStore,
};
use std::collections::BTreeMap;
use tempfile::TempDir;

#[tokio::test]
async fn test_watermark_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("state.json");

    let store = FileSettingsStore::new(BTreeMap::new(), &path);
    assert_eq!(store.last_run_success().await.unwrap(), None);
    store.set_last_run_success("2024-03-01T12:00:00Z").await.unwrap();

    let reopened = FileSettingsStore::new(BTreeMap::new(), &path);
    assert_eq!(
        reopened.last_run_success().await.unwrap().as_deref(),
        Some("2024-03-01T12:00:00Z")
    );
}

#[tokio::test]
async fn test_corrupt_state_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("state.json");
    std::fs::write(&path, "{not json").unwrap();

    let store = FileSettingsStore::new(BTreeMap::new(), &path);
    assert!(store.last_run_success().await.is_err());
}

#[tokio::test]
async fn test_history_is_newest_first_and_bounded() {
    let dir = TempDir::new().unwrap();
    let history = JsonHistoryStore::new(dir.path().join("history.json"), 2);

    for minute in 0..3 {
        let started_at = Utc.with_ymd_and_hms(2024, 3, 1, 12, minute, 0).unwrap();
        let mut result = CycleResult::new(started_at);
        result.records_sent = minute as usize;
        history.record(&result).await.unwrap();
    }

    let entries = history.entries().await;
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].records, 2);
    assert_eq!(entries[1].records, 1);
    assert!(entries.iter().all(|e| e.status == CycleStatus::Success));
}

#[tokio::test]
async fn test_history_append_entry() {
    let dir = TempDir::new().unwrap();
    let history = JsonHistoryStore::new(dir.path().join("nested").join("history.json"), 5);

    history
        .append(HistoryEntry {
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            status: CycleStatus::Warning,
            message: "Sync aborted. Sent 0 of 10 records.".to_string(),
            records: 0,
        })
        .await
        .unwrap();

    let entries = history.entries().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].status, CycleStatus::Warning);
}
