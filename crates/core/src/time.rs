use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDate, Offset, TimeZone, Utc};
use thiserror::Error;

/// A simple clock abstraction for deterministic time in services and tests.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    Default,
    Fixed(DateTime<Utc>),
}

impl Clock {
    /// Returns a clock that uses the current system time.
    #[must_use]
    pub fn default_clock() -> Self {
        Self::Default
    }

    /// Returns a clock fixed at the given timestamp.
    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    /// Returns the current time according to the clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::Default => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }

    /// Calendar day of "now" as seen from the given UTC offset.
    #[must_use]
    pub fn today(&self, offset: FixedOffset) -> DayKey {
        DayKey::from_instant(self.now(), offset)
    }

    /// If this is a fixed clock, advance it by the given duration.
    ///
    /// Has no effect on `Clock::Default`.
    pub fn advance(&mut self, delta: Duration) {
        if let Clock::Fixed(t) = self {
            *t += delta;
        }
    }

    #[must_use]
    pub fn is_fixed(&self) -> bool {
        matches!(self, Clock::Fixed(_))
    }
}

/// Offset of the machine's local time zone at this moment.
#[must_use]
pub fn local_offset() -> FixedOffset {
    *Local::now().offset()
}

/// First instant of the calendar day after `at`, in the given offset.
///
/// This is the nominal cooldown boundary handed out with each daily playlist.
#[must_use]
pub fn next_local_midnight(at: DateTime<Utc>, offset: FixedOffset) -> DateTime<Utc> {
    let local_date = at.with_timezone(&offset).date_naive();
    local_date
        .succ_opt()
        .and_then(|next| next.and_hms_opt(0, 0, 0))
        .and_then(|naive| offset.from_local_datetime(&naive).single())
        .map_or(at + Duration::days(1), |local| local.with_timezone(&Utc))
}

//
// ─── DAY KEY ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DayKeyError {
    #[error("unrecognised date string: {0:?}")]
    Unrecognised(String),
}

/// Calendar day marker used to detect day rollover.
///
/// Renders in the `dd.mm.yyyy.` form a Croatian locale produces; parsing also
/// accepts the spaced locale variant (`16. 10. 2026.`) and ISO dates.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DayKey(NaiveDate);

impl DayKey {
    #[must_use]
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    #[must_use]
    pub fn from_instant(at: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self(at.with_timezone(&offset).date_naive())
    }

    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

impl fmt::Debug for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DayKey({})", self.0)
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%d.%m.%Y."))
    }
}

impl FromStr for DayKey {
    type Err = DayKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        if let Ok(date) = NaiveDate::parse_from_str(&compact, "%Y-%m-%d") {
            return Ok(Self(date));
        }
        let trimmed = compact.trim_end_matches('.');
        NaiveDate::parse_from_str(trimmed, "%d.%m.%Y")
            .map(Self)
            .map_err(|_| DayKeyError::Unrecognised(s.to_string()))
    }
}

/// Deterministic timestamp for tests and examples (2023-11-14T22:13:20Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// Returns a deterministic `DateTime<Utc>` for tests and doc examples.
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

/// Returns a `Clock` fixed at the deterministic test timestamp.
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}

/// The UTC offset, for tests that need stable day boundaries.
#[must_use]
pub fn utc_offset() -> FixedOffset {
    Utc.fix()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_key_renders_locale_form_and_parses_back() {
        let key = DayKey::from_instant(fixed_now(), utc_offset());
        assert_eq!(key.to_string(), "14.11.2023.");
        assert_eq!("14.11.2023.".parse::<DayKey>().unwrap(), key);
        assert_eq!("14. 11. 2023.".parse::<DayKey>().unwrap(), key);
        assert_eq!("2023-11-14".parse::<DayKey>().unwrap(), key);
        assert!("yesterday".parse::<DayKey>().is_err());
    }

    #[test]
    fn day_key_follows_offset() {
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        // 22:13 UTC is already the next day at +02:00.
        let key = DayKey::from_instant(fixed_now(), plus_two);
        assert_eq!(key.to_string(), "15.11.2023.");
    }

    #[test]
    fn next_midnight_is_start_of_following_local_day() {
        let midnight = next_local_midnight(fixed_now(), utc_offset());
        assert_eq!(midnight.to_rfc3339(), "2023-11-15T00:00:00+00:00");

        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let midnight = next_local_midnight(fixed_now(), plus_two);
        assert_eq!(midnight.to_rfc3339(), "2023-11-15T22:00:00+00:00");
    }

    #[test]
    fn fixed_clock_advances() {
        let mut clock = fixed_clock();
        clock.advance(Duration::days(1));
        assert_eq!(clock.now(), fixed_now() + Duration::days(1));
        assert!(clock.is_fixed());
        assert!(!Clock::default_clock().is_fixed());
    }
}
