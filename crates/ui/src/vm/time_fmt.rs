use std::time::Duration;

use chrono::{DateTime, Utc};
use kviz_core::quota::format_countdown;

/// Seconds with one decimal, e.g. `1.0` or `15.0`.
#[must_use]
pub fn format_seconds(value: Duration) -> String {
    format!("{:.1}", value.as_secs_f64())
}

/// `elapsed / window` progress text for the playback bar.
#[must_use]
pub fn format_progress(elapsed: Duration, window: Duration) -> String {
    format!("{} / {} s", format_seconds(elapsed.min(window)), format_seconds(window))
}

#[must_use]
pub fn countdown_label(until: DateTime<Utc>, now: DateTime<Utc>) -> String {
    format!("Nove pjesme za {}", format_countdown(until, now))
}
