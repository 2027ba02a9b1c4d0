//! Status command implementation
//!
//! This module implements the `status` command for displaying the stored
//! watermark, the scheduling mode and recent run history.

use crate::config::load_config;
use crate::core::cycle::CycleStatus;
use crate::core::scheduler::SyncInterval;
use crate::core::state::{FileSettingsStore, JsonHistoryStore, StateManager, StoredWatermark};
use clap::Args;
use std::sync::Arc;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Number of history entries to show
    #[arg(long, default_value_t = 10)]
    pub limit: usize,
}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Checking sync status");

        println!("📊 Sync Status");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        let interval = SyncInterval::parse(&config.sync.interval);
        let state = StateManager::new(Arc::new(FileSettingsStore::from_config(&config)));
        let watermark = match state.load_watermark().await {
            Ok(w) => w,
            Err(e) => {
                println!("❌ Failed to load watermark");
                println!("   Error: {e}");
                return Ok(5); // Fatal error exit code
            }
        };

        println!("  Interval: {interval}");
        match &watermark {
            StoredWatermark::Missing => println!("  Last success: Never"),
            StoredWatermark::Valid(wm) => println!(
                "  Last success: {}",
                wm.at().with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S")
            ),
            StoredWatermark::Malformed(raw) => println!("  Last success: unreadable ({raw})"),
        }
        let mode = match (&watermark, interval.is_incremental_eligible()) {
            (StoredWatermark::Valid(_), true) => "incremental".to_string(),
            _ => format!("full ({} days)", config.sync.lookback_days),
        };
        println!("  Next cycle: {mode}");
        println!();

        let history = JsonHistoryStore::from_config(&config.state).entries().await;
        if history.is_empty() {
            println!("No sync history found.");
            println!("Run 'pec-connector sync' to synchronize now.");
            return Ok(0);
        }

        println!("Recent runs ({} of {}):", history.len().min(self.limit), history.len());
        println!();
        println!("{:<20} {:<12} {:<8} Message", "Time", "Status", "Records");
        println!("{}", "-".repeat(90));

        for entry in history.iter().take(self.limit) {
            let status = match entry.status {
                CycleStatus::Success => "✅ SUCCESS",
                CycleStatus::Warning => "⚠️  WARNING",
                CycleStatus::Error => "❌ ERROR",
            };
            println!(
                "{:<20} {:<12} {:<8} {}",
                entry.timestamp.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S"),
                status,
                entry.records,
                entry.message
            );
        }

        println!();
        Ok(0)
    }
}
