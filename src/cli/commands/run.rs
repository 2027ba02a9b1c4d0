//! Run command implementation
//!
//! This module implements the `run` command: the long-lived scheduler that
//! triggers sync cycles on the configured interval until a shutdown signal.

use crate::cli::commands::{build_engine, spawn_progress_printer};
use crate::config::load_config;
use crate::core::cycle::progress_channel;
use crate::core::scheduler::{Scheduler, SchedulerTiming};
use crate::core::state::FileSettingsStore;
use clap::Args;
use std::sync::Arc;
use tokio::sync::watch;

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Trigger one cycle immediately instead of waiting for the startup delay
    #[arg(long)]
    pub now: bool,
}

impl RunArgs {
    /// Execute the run command
    pub async fn execute(&self, config_path: &str, shutdown_signal: watch::Receiver<bool>) -> anyhow::Result<i32> {
        tracing::info!("Starting scheduler");

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Configuration could not be loaded");
                eprintln!("Configuration error: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        let engine = match build_engine(&config, FileSettingsStore::from_config(&config)) {
            Ok(engine) => engine,
            Err(code) => return Ok(code),
        };

        let (tx, rx) = progress_channel(config.sync.event_buffer);
        let printer = spawn_progress_printer(rx);

        let scheduler = Arc::new(
            Scheduler::new(engine.orchestrator.clone(), SchedulerTiming::from_config(&config.sync))
                .with_progress(tx),
        );

        let mut status = scheduler.status();
        let status_logger = tokio::spawn(async move {
            while status.changed().await.is_ok() {
                let current = *status.borrow_and_update();
                tracing::info!(status = %current, "Scheduler status");
            }
        });

        println!(
            "⏱️  Scheduler running (interval: {}). Press Ctrl+C to stop.",
            engine.orchestrator.interval()
        );
        println!();

        if self.now {
            let _ = scheduler.run_now();
        }

        scheduler.clone().run(shutdown_signal).await;

        // Dropping the scheduler closes the progress and status channels.
        drop(scheduler);
        drop(engine);
        let _ = printer.await;
        status_logger.abort();

        println!();
        println!("⚠️  Scheduler stopped.");
        Ok(130) // SIGINT exit code (standard Unix convention)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_args_defaults() {
        let args = RunArgs { now: false };
        assert!(!args.now);
    }
}
