//! Watermark model and sync window computation
//!
//! The watermark is the start time of the last cycle that finished without
//! errors. It only ever moves forward.

use crate::core::scheduler::SyncInterval;
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Naive formats accepted for legacy watermarks, interpreted as local time
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Boundary below which all data is assumed synchronized
///
/// # Examples
///
/// ```
/// use pec_connector::core::state::watermark::Watermark;
///
/// let wm = Watermark::parse("2024-03-01T10:00:00Z").unwrap();
/// assert_eq!(wm.to_iso(), "2024-03-01T10:00:00Z");
///
/// assert!(Watermark::parse("yesterday").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Watermark(DateTime<Utc>);

impl Watermark {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self(at)
    }

    /// Parse a stored watermark
    ///
    /// Accepts RFC 3339 timestamps and naive ISO timestamps (local time).
    ///
    /// # Errors
    ///
    /// Returns a description of the value when no format matches.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let value = raw.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
            return Ok(Self(dt.with_timezone(&Utc)));
        }

        for format in NAIVE_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
                return Local
                    .from_local_datetime(&naive)
                    .earliest()
                    .map(|local| Self(local.with_timezone(&Utc)))
                    .ok_or_else(|| format!("'{value}' does not exist in the local time zone"));
            }
        }

        Err(format!("'{value}' is not an ISO-8601 timestamp"))
    }

    /// Instant of the watermark
    pub fn at(&self) -> DateTime<Utc> {
        self.0
    }

    /// Serialized form persisted by the settings collaborator
    pub fn to_iso(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    /// Local calendar date used to filter `dt_registro`
    pub fn start_date(&self) -> NaiveDate {
        self.0.with_timezone(&Local).date_naive()
    }

    /// The watermark to persist after a successful cycle, if any
    ///
    /// Returns `None` when `candidate` would move the watermark backward.
    pub fn advance(previous: Option<Watermark>, candidate: Watermark) -> Option<Watermark> {
        match previous {
            Some(prev) if candidate <= prev => None,
            _ => Some(candidate),
        }
    }
}

impl fmt::Display for Watermark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_iso())
    }
}

/// Date window extracted by one cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncWindow {
    /// Starts exactly at the stored watermark
    Incremental { since: Watermark },
    /// Starts `lookback_days` before the cycle start
    Full {
        since: DateTime<Utc>,
        lookback_days: u32,
    },
}

impl SyncWindow {
    /// Local date bound to the extraction queries
    pub fn start_date(&self) -> NaiveDate {
        match self {
            SyncWindow::Incremental { since } => since.start_date(),
            SyncWindow::Full { since, .. } => since.with_timezone(&Local).date_naive(),
        }
    }

    pub fn is_incremental(&self) -> bool {
        matches!(self, SyncWindow::Incremental { .. })
    }

    /// Progress message announcing the window
    pub fn describe(&self) -> String {
        match self {
            SyncWindow::Incremental { since } => {
                format!("Incremental Mode: Starting from last success ({since})")
            }
            SyncWindow::Full { lookback_days, .. } => format!(
                "Full Load Mode: Starting from {lookback_days} days ago ({})",
                self.start_date()
            ),
        }
    }
}

/// Window plus a warning when the stored watermark was unusable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowDecision {
    pub window: SyncWindow,
    pub warning: Option<String>,
}

/// Decide where a cycle starting at `now` begins
///
/// Incremental-eligible intervals with a valid stored watermark start at the
/// watermark exactly. Everything else starts `lookback_days` before `now`.
pub fn compute_window(
    interval: &SyncInterval,
    stored: Option<&str>,
    lookback_days: u32,
    now: DateTime<Utc>,
) -> WindowDecision {
    let full = SyncWindow::Full {
        since: now - Duration::days(i64::from(lookback_days)),
        lookback_days,
    };

    let stored = stored.filter(|raw| !raw.trim().is_empty());
    match stored {
        Some(raw) if interval.is_incremental_eligible() => match Watermark::parse(raw) {
            Ok(since) => WindowDecision {
                window: SyncWindow::Incremental { since },
                warning: None,
            },
            Err(reason) => WindowDecision {
                window: full,
                warning: Some(format!(
                    "Failed to parse last run time ({reason}). Defaulting to {lookback_days} days back."
                )),
            },
        },
        _ => WindowDecision {
            window: full,
            warning: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(raw: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(raw).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_parse_rfc3339_with_offset() {
        let wm = Watermark::parse("2024-03-01T07:00:00-03:00").unwrap();
        assert_eq!(wm.at(), utc("2024-03-01T10:00:00Z"));
    }

    #[test]
    fn test_parse_naive_iso_as_local() {
        let wm = Watermark::parse("2024-03-01T10:15:30.123456").unwrap();
        let local = wm.at().with_timezone(&Local).naive_local();
        assert_eq!(local.to_string(), "2024-03-01 10:15:30.123456");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Watermark::parse("not a date").is_err());
        assert!(Watermark::parse("2024-13-01T00:00:00Z").is_err());
    }

    #[test]
    fn test_advance_is_monotonic() {
        let earlier = Watermark::new(utc("2024-03-01T10:00:00Z"));
        let later = Watermark::new(utc("2024-03-02T10:00:00Z"));

        assert_eq!(Watermark::advance(None, earlier), Some(earlier));
        assert_eq!(Watermark::advance(Some(earlier), later), Some(later));
        assert_eq!(Watermark::advance(Some(later), earlier), None);
        assert_eq!(Watermark::advance(Some(later), later), None);
    }

    #[test]
    fn test_incremental_window_uses_watermark_exactly() {
        let now = utc("2024-03-05T12:00:00Z");
        let decision = compute_window(&SyncInterval::parse("12 hours"), Some("2024-03-04T12:00:00Z"), 30, now);

        assert_eq!(decision.warning, None);
        assert_eq!(
            decision.window,
            SyncWindow::Incremental {
                since: Watermark::new(utc("2024-03-04T12:00:00Z"))
            }
        );
    }

    #[test]
    fn test_full_window_without_watermark() {
        let now = utc("2024-03-31T12:00:00Z");
        let decision = compute_window(&SyncInterval::parse("15"), None, 30, now);

        assert!(!decision.window.is_incremental());
        assert_eq!(
            decision.window,
            SyncWindow::Full {
                since: utc("2024-03-01T12:00:00Z"),
                lookback_days: 30
            }
        );
    }

    #[test]
    fn test_manual_interval_ignores_watermark() {
        let now = utc("2024-03-31T12:00:00Z");
        let decision = compute_window(&SyncInterval::Manual, Some("2024-03-30T12:00:00Z"), 7, now);
        assert!(!decision.window.is_incremental());
        assert_eq!(decision.warning, None);
    }

    #[test]
    fn test_malformed_watermark_falls_back_with_warning() {
        let now = utc("2024-03-31T12:00:00Z");
        let decision = compute_window(&SyncInterval::parse("15"), Some("garbage"), 30, now);

        assert!(!decision.window.is_incremental());
        assert!(decision.warning.unwrap().contains("Defaulting to 30 days back"));
    }
}
