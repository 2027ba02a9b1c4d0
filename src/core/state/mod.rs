//! State management: watermark, settings collaborator and run history

pub mod history;
pub mod manager;
pub mod settings;
pub mod watermark;

pub use history::{HistoryEntry, HistorySink, JsonHistoryStore};
pub use manager::{StateManager, StoredWatermark};
pub use settings::{FileSettingsStore, SettingsStore};
pub use watermark::{compute_window, SyncWindow, Watermark, WindowDecision};
