//! Sync interval setting

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Longest periodic interval that still runs incrementally from the watermark
const INCREMENTAL_LIMIT: Duration = Duration::from_secs(24 * 60 * 60);

/// How often the scheduler triggers a cycle
///
/// Parsed from the `scheduler_interval` setting. Accepted forms are a bare
/// number of minutes (`"15"`), `"<n> min"`, `"<n> hours"` and `"Manual Only"`.
/// Anything else is kept as [`SyncInterval::Unparsable`] and behaves like
/// manual scheduling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncInterval {
    /// Cycles only run on explicit request
    Manual,
    /// Cycles run periodically
    Every(Duration),
    /// Setting could not be understood
    Unparsable(String),
}

impl SyncInterval {
    /// Parse a setting value; never fails
    pub fn parse(raw: &str) -> Self {
        let value = raw.trim();
        let lower = value.to_ascii_lowercase();

        if lower == "manual only" || lower == "manual" {
            return SyncInterval::Manual;
        }

        let (number, unit) = match lower.find(|c: char| !c.is_ascii_digit()) {
            Some(idx) => (&lower[..idx], lower[idx..].trim()),
            None => (lower.as_str(), ""),
        };

        let Ok(amount) = number.parse::<u64>() else {
            return SyncInterval::Unparsable(value.to_string());
        };
        if amount == 0 {
            return SyncInterval::Unparsable(value.to_string());
        }

        let minutes = match unit {
            "" | "m" | "min" | "mins" | "minute" | "minutes" => amount,
            "h" | "hour" | "hours" => amount.saturating_mul(60),
            _ => return SyncInterval::Unparsable(value.to_string()),
        };

        SyncInterval::Every(Duration::from_secs(minutes.saturating_mul(60)))
    }

    /// Period between cycles, `None` when not scheduled
    pub fn period(&self) -> Option<Duration> {
        match self {
            SyncInterval::Every(period) => Some(*period),
            _ => None,
        }
    }

    /// Whether cycles may start from the stored watermark instead of the
    /// lookback window
    pub fn is_incremental_eligible(&self) -> bool {
        matches!(self, SyncInterval::Every(period) if *period <= INCREMENTAL_LIMIT)
    }
}

impl FromStr for SyncInterval {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for SyncInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncInterval::Manual => f.write_str("Manual Only"),
            SyncInterval::Every(period) => {
                let minutes = period.as_secs() / 60;
                if minutes % 60 == 0 {
                    write!(f, "{} hours", minutes / 60)
                } else {
                    write!(f, "{minutes} min")
                }
            }
            SyncInterval::Unparsable(raw) => write!(f, "unparsable ({raw})"),
        }
    }
}
