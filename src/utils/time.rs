use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, Utc};

/// Converts a sample timestamp (milliseconds since the Unix epoch) into a date.
pub fn timestamp_to_datetime(timestamp_ms: u64) -> Result<DateTime<Utc>> {
    i64::try_from(timestamp_ms)
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .ok_or_else(|| anyhow!("Timestamp {timestamp_ms}ms is out of range"))
}

pub fn format_duration(v: Duration) -> String {
    if v.num_hours() > 0 {
        format!(
            "{}h{}m{}s",
            v.num_hours(),
            v.num_minutes() % 60,
            v.num_seconds() % 60
        )
    } else if v.num_minutes() > 0 {
        format!("{}m{}s", v.num_minutes() % 60, v.num_seconds() % 60)
    } else {
        format!("{}s", v.num_seconds() % 60)
    }
}
