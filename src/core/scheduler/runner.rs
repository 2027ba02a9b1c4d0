//! Single-flight scheduler
//!
//! One long-lived loop wakes on a fixed tick and decides whether a cycle is
//! due. Each cycle runs on its own task so a slow cycle never blocks the
//! loop. An atomic in-flight flag guarantees at most one cycle at a time,
//! whether it was started by the tick or by [`Scheduler::run_now`].

use crate::config::SyncConfig;
use crate::core::cycle::{CycleOrchestrator, CycleResult, ProgressEvent};
use crate::core::scheduler::interval::SyncInterval;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// What the scheduler is doing, for status displays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerStatus {
    /// Interval is manual or unparsable; nothing is triggered
    Manual,
    /// Waiting for the first run of this process
    Starting,
    /// A cycle is in flight
    Running,
    /// Next periodic run is due in this long
    NextRunIn(Duration),
}

impl fmt::Display for SchedulerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulerStatus::Manual => f.write_str("Manual"),
            SchedulerStatus::Starting => f.write_str("Starting..."),
            SchedulerStatus::Running => f.write_str("Running"),
            SchedulerStatus::NextRunIn(left) => {
                let minutes = left.as_secs().div_ceil(60);
                write!(f, "Next run in {minutes} min")
            }
        }
    }
}

/// Result of a trigger request
#[derive(Debug)]
pub enum TriggerOutcome {
    /// A cycle was started; the handle yields its result
    Started(JoinHandle<CycleResult>),
    /// Another cycle is in flight; nothing was started
    AlreadyRunning,
}

impl TriggerOutcome {
    pub fn is_started(&self) -> bool {
        matches!(self, TriggerOutcome::Started(_))
    }
}

/// Decision taken on one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickDecision {
    Trigger,
    Wait(SchedulerStatus),
}

/// Decide what a tick does
///
/// `since_last_run` is the time since the last cycle of this process
/// finished, `None` before the first one.
pub fn decide(interval: &SyncInterval, since_last_run: Option<Duration>, in_flight: bool) -> TickDecision {
    if in_flight {
        return TickDecision::Wait(SchedulerStatus::Running);
    }
    let Some(period) = interval.period() else {
        return TickDecision::Wait(SchedulerStatus::Manual);
    };
    match since_last_run {
        None => TickDecision::Trigger,
        Some(elapsed) if elapsed >= period => TickDecision::Trigger,
        Some(elapsed) => TickDecision::Wait(SchedulerStatus::NextRunIn(period - elapsed)),
    }
}

/// Tick and startup timing
#[derive(Debug, Clone, Copy)]
pub struct SchedulerTiming {
    pub tick: Duration,
    pub startup_delay: Duration,
}

impl SchedulerTiming {
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            tick: Duration::from_secs(config.tick_seconds.max(1)),
            startup_delay: Duration::from_secs(config.startup_delay_seconds),
        }
    }
}

impl Default for SchedulerTiming {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(60),
            startup_delay: Duration::from_secs(5),
        }
    }
}

/// Clears the in-flight flag when the cycle task ends, even on panic
struct InFlight<'a>(&'a Scheduler);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.running.store(false, Ordering::SeqCst);
        self.0.finished.notify_waiters();
    }
}

/// Single-flight scheduler
pub struct Scheduler {
    orchestrator: Arc<CycleOrchestrator>,
    timing: SchedulerTiming,
    running: AtomicBool,
    finished: Notify,
    last_run: Mutex<Option<Instant>>,
    status: watch::Sender<SchedulerStatus>,
    abort: watch::Sender<bool>,
    progress: Option<mpsc::Sender<ProgressEvent>>,
}

impl Scheduler {
    pub fn new(orchestrator: Arc<CycleOrchestrator>, timing: SchedulerTiming) -> Self {
        let (status, _) = watch::channel(SchedulerStatus::Starting);
        let (abort, _) = watch::channel(false);
        Self {
            orchestrator,
            timing,
            running: AtomicBool::new(false),
            finished: Notify::new(),
            last_run: Mutex::new(None),
            status,
            abort,
            progress: None,
        }
    }

    /// Forward every cycle's progress events to `tx`
    pub fn with_progress(mut self, tx: mpsc::Sender<ProgressEvent>) -> Self {
        self.progress = Some(tx);
        self
    }

    /// Observe the scheduler status
    pub fn status(&self) -> watch::Receiver<SchedulerStatus> {
        self.status.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Ask the in-flight cycle, if any, to stop at its next checkpoint
    pub fn request_abort(&self) {
        if self.is_running() {
            tracing::info!("Abort requested for in-flight cycle");
        }
        self.abort.send_replace(true);
    }

    /// Start a cycle now unless one is already in flight
    pub fn run_now(self: &Arc<Self>) -> TriggerOutcome {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::info!("Cycle already in flight, trigger ignored");
            return TriggerOutcome::AlreadyRunning;
        }

        self.abort.send_replace(false);
        self.status.send_replace(SchedulerStatus::Running);

        let this = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let _in_flight = InFlight(&this);
            let result = this
                .orchestrator
                .run_cycle(this.progress.clone(), this.abort.subscribe())
                .await;

            if let Ok(mut last_run) = this.last_run.lock() {
                *last_run = Some(Instant::now());
            }
            let interval = this.orchestrator.interval();
            this.status.send_replace(match decide(&interval, Some(Duration::ZERO), false) {
                TickDecision::Wait(status) => status,
                TickDecision::Trigger => SchedulerStatus::Running,
            });
            result
        });

        TriggerOutcome::Started(handle)
    }

    /// Drive the tick loop until `shutdown` turns true
    ///
    /// On shutdown the in-flight cycle is asked to abort and awaited.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            tick_secs = self.timing.tick.as_secs(),
            startup_delay_secs = self.timing.startup_delay.as_secs(),
            interval = %self.orchestrator.interval(),
            "Scheduler started"
        );

        let stopped = tokio::select! {
            _ = tokio::time::sleep(self.timing.startup_delay) => false,
            _ = wait_for_shutdown(&mut shutdown) => true,
        };

        if !stopped {
            let mut ticker = tokio::time::interval(self.timing.tick);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => self.on_tick(),
                    _ = wait_for_shutdown(&mut shutdown) => break,
                }
            }
        }

        tracing::info!("Scheduler stopping");
        self.request_abort();
        self.wait_idle().await;
        tracing::info!("Scheduler stopped");
    }

    fn on_tick(self: &Arc<Self>) {
        let interval = self.orchestrator.interval();
        let since_last_run = self
            .last_run
            .lock()
            .ok()
            .and_then(|last| last.map(|at| at.elapsed()));

        match decide(&interval, since_last_run, self.is_running()) {
            TickDecision::Trigger => {
                tracing::info!(interval = %interval, "Scheduled cycle due");
                // The guard may still reject if a manual run slipped in.
                let _ = self.run_now();
            }
            TickDecision::Wait(status) => {
                if let SyncInterval::Unparsable(raw) = &interval {
                    tracing::debug!(value = %raw, "Unparsable interval, not scheduling");
                }
                self.status.send_replace(status);
            }
        }
    }

    /// Resolve once no cycle is in flight
    pub async fn wait_idle(&self) {
        loop {
            let finished = self.finished.notified();
            if !self.is_running() {
                return;
            }
            finished.await;
        }
    }
}

async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            // Sender gone: nobody can ask for shutdown any more.
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::settings::{KEY_DB_HOST, KEY_SCHEDULER_INTERVAL};
    use crate::core::testing::{FakeSink, FakeSource, MemorySettings};
    use crate::domain::{DomainTag, RawRow};
    use test_case::test_case;

    fn minutes(n: u64) -> Duration {
        Duration::from_secs(n * 60)
    }

    #[test_case("Manual Only", None, false => TickDecision::Wait(SchedulerStatus::Manual); "manual")]
    #[test_case("every so often", None, false => TickDecision::Wait(SchedulerStatus::Manual); "unparsable")]
    #[test_case("15", None, false => TickDecision::Trigger; "first run")]
    #[test_case("15", Some(minutes(15)), false => TickDecision::Trigger; "due")]
    #[test_case("15", Some(minutes(10)), false => TickDecision::Wait(SchedulerStatus::NextRunIn(minutes(5))); "not due")]
    #[test_case("15", Some(minutes(30)), true => TickDecision::Wait(SchedulerStatus::Running); "in flight")]
    #[test_case("Manual Only", None, true => TickDecision::Wait(SchedulerStatus::Running); "manual run in flight")]
    fn test_decide(interval: &str, since: Option<Duration>, in_flight: bool) -> TickDecision {
        decide(&SyncInterval::parse(interval), since, in_flight)
    }

    #[test]
    fn test_status_display() {
        assert_eq!(SchedulerStatus::NextRunIn(Duration::from_secs(61)).to_string(), "Next run in 2 min");
        assert_eq!(SchedulerStatus::Manual.to_string(), "Manual");
    }

    fn scheduler(interval: &str, source: FakeSource) -> (Arc<Scheduler>, Arc<FakeSink>) {
        let sink = Arc::new(FakeSink::new());
        let settings = Arc::new(
            MemorySettings::new()
                .with_value(KEY_SCHEDULER_INTERVAL, interval)
                .with_value(KEY_DB_HOST, "localhost"),
        );
        let orchestrator = Arc::new(CycleOrchestrator::new(Arc::new(source), sink.clone(), settings));
        let timing = SchedulerTiming {
            tick: Duration::from_millis(20),
            startup_delay: Duration::from_millis(10),
        };
        (Arc::new(Scheduler::new(orchestrator, timing)), sink)
    }

    #[tokio::test]
    async fn test_run_now_is_single_flight() {
        let (scheduler, _) = scheduler("Manual Only", FakeSource::new());

        let first = scheduler.run_now();
        let second = scheduler.run_now();
        assert!(first.is_started());
        assert!(matches!(second, TriggerOutcome::AlreadyRunning));

        if let TriggerOutcome::Started(handle) = first {
            assert!(handle.await.unwrap().is_success());
        }
        assert!(!scheduler.is_running());
        assert!(scheduler.run_now().is_started());
        scheduler.wait_idle().await;
    }

    #[tokio::test]
    async fn test_manual_interval_never_triggers() {
        let (scheduler, sink) = scheduler(
            "Manual Only",
            FakeSource::new().with_rows(DomainTag::Procedure, vec![RawRow::new("F1", DomainTag::Procedure)]),
        );
        let status = scheduler.status();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(scheduler.clone().run(shutdown_rx));
        tokio::time::sleep(Duration::from_millis(100)).await;
        shutdown_tx.send_replace(true);
        task.await.unwrap();

        assert_eq!(sink.call_count(), 0);
        assert_eq!(*status.borrow(), SchedulerStatus::Manual);
    }

    #[tokio::test]
    async fn test_manual_run_reports_running_across_ticks() {
        let (scheduler, _) = scheduler(
            "Manual Only",
            FakeSource::new().slow_connect(Duration::from_millis(300)),
        );
        let status = scheduler.status();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(scheduler.clone().run(shutdown_rx));
        assert!(scheduler.run_now().is_started());
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(scheduler.is_running());
        assert_eq!(*status.borrow(), SchedulerStatus::Running);

        shutdown_tx.send_replace(true);
        task.await.unwrap();
        assert!(!scheduler.is_running());
    }

    #[tokio::test]
    async fn test_first_tick_triggers_once_per_interval() {
        let (scheduler, sink) = scheduler(
            "15",
            FakeSource::new().with_rows(DomainTag::Procedure, vec![RawRow::new("F1", DomainTag::Procedure)]),
        );
        let status = scheduler.status();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(scheduler.clone().run(shutdown_rx));
        tokio::time::sleep(Duration::from_millis(200)).await;
        shutdown_tx.send_replace(true);
        task.await.unwrap();

        assert_eq!(sink.call_count(), 1);
        assert!(matches!(*status.borrow(), SchedulerStatus::NextRunIn(_)));
        assert!(!scheduler.is_running());
    }
}
