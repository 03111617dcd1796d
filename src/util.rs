//! Shared time helpers.

use chrono::{DateTime, Datelike, Utc};

pub const MILLIS_PER_SECOND: i64 = 1_000;
pub const MILLIS_PER_MINUTE: i64 = 60 * MILLIS_PER_SECOND;
pub const MILLIS_PER_HOUR: i64 = 60 * MILLIS_PER_MINUTE;
pub const MILLIS_PER_DAY: i64 = 24 * MILLIS_PER_HOUR;

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Calendar year (UTC) of a millisecond timestamp.
pub fn year_of(millis: i64) -> i32 {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|dt| dt.year())
        .unwrap_or_else(|| Utc::now().year())
}
