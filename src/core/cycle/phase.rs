//! Cycle state machine phases

use crate::domain::DomainTag;
use std::fmt;

/// Where a cycle currently is
///
/// `Idle -> ComputingWindow -> Connecting -> Extracting(1..7) -> Normalizing
/// -> Dispatching -> Finalizing -> Idle`, with `Aborted` reachable from any
/// phase on cancellation and `Errored` on a connection-level failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CyclePhase {
    #[default]
    Idle,
    ComputingWindow,
    Connecting,
    Extracting(DomainTag),
    Normalizing,
    Dispatching,
    Finalizing,
    Aborted,
    Errored,
}

impl CyclePhase {
    /// Phases a cycle can end in
    pub fn is_terminal(&self) -> bool {
        matches!(self, CyclePhase::Idle | CyclePhase::Aborted | CyclePhase::Errored)
    }
}

impl fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CyclePhase::Idle => f.write_str("IDLE"),
            CyclePhase::ComputingWindow => f.write_str("COMPUTING_WINDOW"),
            CyclePhase::Connecting => f.write_str("CONNECTING"),
            CyclePhase::Extracting(tag) => write!(f, "EXTRACTING({tag})"),
            CyclePhase::Normalizing => f.write_str("NORMALIZING"),
            CyclePhase::Dispatching => f.write_str("DISPATCHING"),
            CyclePhase::Finalizing => f.write_str("FINALIZING"),
            CyclePhase::Aborted => f.write_str("ABORTED"),
            CyclePhase::Errored => f.write_str("ERRORED"),
        }
    }
}
