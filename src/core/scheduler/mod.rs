//! Scheduling: interval parsing and the single-flight tick loop

pub mod interval;
pub mod runner;

pub use interval::SyncInterval;
pub use runner::{decide, Scheduler, SchedulerStatus, SchedulerTiming, TickDecision, TriggerOutcome};
