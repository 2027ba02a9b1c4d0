//! Sync cycle: phases, progress stream, orchestration and results

pub mod orchestrator;
pub mod phase;
pub mod progress;
pub mod result;

pub use orchestrator::CycleOrchestrator;
pub use phase::CyclePhase;
pub use progress::{progress_channel, ProgressEvent, ProgressLevel, ProgressReporter};
pub use result::{CycleResult, CycleStatus, DomainOutcome, DomainReport};
