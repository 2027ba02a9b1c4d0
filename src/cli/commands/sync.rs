//! Sync command implementation
//!
//! This module implements the `sync` command, which runs exactly one cycle
//! in the foreground and exits.

use crate::cli::commands::{build_engine, spawn_progress_printer};
use crate::config::load_config;
use crate::core::cycle::{progress_channel, CycleResult, CycleStatus, DomainOutcome};
use crate::core::state::settings::{KEY_LOOKBACK_DAYS, KEY_SCHEDULER_INTERVAL};
use crate::core::state::FileSettingsStore;
use clap::Args;
use tokio::sync::watch;

/// Arguments for the sync command
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Ignore the stored watermark and load the whole lookback window
    #[arg(long)]
    pub full: bool,

    /// Override the lookback window in days
    #[arg(long, value_name = "DAYS")]
    pub lookback_days: Option<u32>,
}

impl SyncArgs {
    /// Execute the sync command
    pub async fn execute(&self, config_path: &str, shutdown_signal: watch::Receiver<bool>) -> anyhow::Result<i32> {
        tracing::info!("Starting sync command");

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Configuration could not be loaded");
                eprintln!("Configuration error: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        let mut settings = FileSettingsStore::from_config(&config);
        if self.full {
            tracing::info!("Forcing full load from CLI");
            settings = settings.with_value(KEY_SCHEDULER_INTERVAL, "Manual Only");
        }
        if let Some(days) = self.lookback_days {
            tracing::info!(lookback_days = days, "Overriding lookback window from CLI");
            settings = settings.with_value(KEY_LOOKBACK_DAYS, days.to_string());
        }

        let engine = match build_engine(&config, settings) {
            Ok(engine) => engine,
            Err(code) => return Ok(code),
        };

        println!("🚀 Starting sync...");
        println!();

        let (tx, rx) = progress_channel(config.sync.event_buffer);
        let printer = spawn_progress_printer(rx);

        // The shutdown signal doubles as the abort request.
        let result = engine.orchestrator.run_cycle(Some(tx), shutdown_signal).await;
        let _ = printer.await;

        print_summary(&result);
        Ok(exit_code(&result))
    }
}

fn print_summary(result: &CycleResult) {
    println!();
    println!("📊 Sync Summary:");
    for report in &result.domains {
        let detail = match &report.outcome {
            DomainOutcome::Extracted { rows } => format!("{rows} rows, {} records", report.records),
            DomainOutcome::Skipped { reason } => format!("skipped ({reason})"),
            DomainOutcome::Failed { .. } => "failed".to_string(),
        };
        println!("  {:<26} {detail}", report.domain.label());
    }
    println!("  Records: {} sent of {}", result.records_sent, result.records_total);
    println!(
        "  Batches: {} sent, {} failed",
        result.batches_sent, result.batches_failed
    );
    if let Some(watermark) = result.watermark {
        println!("  Watermark: {watermark}");
    }
    println!("  Duration: {:.2}s", result.duration.as_secs_f64());
    println!("  Status: {}", result.status());
    println!();
}

/// Map a finished cycle to the process exit code
pub(crate) fn exit_code(result: &CycleResult) -> i32 {
    match result.status() {
        CycleStatus::Success => 0,
        CycleStatus::Warning => 130, // Interrupted
        CycleStatus::Error if result.fatal.is_some() => 4, // Connection error
        CycleStatus::Error => 1, // Finished with failed batches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_sync_args_defaults() {
        let args = SyncArgs {
            full: false,
            lookback_days: None,
        };
        assert!(!args.full);
        assert!(args.lookback_days.is_none());
    }

    #[test]
    fn test_exit_codes() {
        let mut result = CycleResult::new(Utc::now());
        assert_eq!(exit_code(&result), 0);

        result.aborted = true;
        assert_eq!(exit_code(&result), 130);

        result.errors = 1;
        assert_eq!(exit_code(&result), 1);

        result.fatal = Some("Database connection failed".to_string());
        assert_eq!(exit_code(&result), 4);
    }
}
