use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Time strings look like "30m", "1h", "2d"; surrounding whitespace is fine.
static TIME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(\d+)([mhd])\s*$").expect("static regex compile"));

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeParseError {
    #[error("Invalid time format: `{input}`. Use format like `30m`, `1h`, or `2d`.")]
    InvalidFormat { input: String },

    #[error("Time value must be greater than 0.")]
    InvalidValue,
}

/// Parse a "how far back" string like `1h`, `30m`, or `2d` into a duration.
///
/// No upper bound is enforced here; range validation is the caller's job.
pub fn parse_time_ago(input: &str) -> Result<Duration, TimeParseError> {
    let caps = TIME_PATTERN
        .captures(input)
        .ok_or_else(|| TimeParseError::InvalidFormat {
            input: input.to_string(),
        })?;

    let value: i64 = caps[1].parse().map_err(|_| TimeParseError::InvalidValue)?;

    // The pattern only admits digits, but check anyway.
    if value < 0 {
        return Err(TimeParseError::InvalidValue);
    }

    match caps[2].to_ascii_lowercase().as_str() {
        "m" => Duration::try_minutes(value),
        "h" => Duration::try_hours(value),
        "d" => Duration::try_days(value),
        _ => None,
    }
    .ok_or(TimeParseError::InvalidValue)
}

/// An absolute window of time, derived from two "how far back" durations
/// relative to a single observation of "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// `start_back` must exceed `end_back` (the end is closer to now); the
    /// handler validates that before building a window.
    pub fn ending_at(now: DateTime<Utc>, start_back: Duration, end_back: Duration) -> Self {
        Self {
            start: now - start_back,
            end: now - end_back,
        }
    }
}
