//! Daily quota and cooldown tracking.
//!
//! `DailyProgress` is the persisted part of a quiz session: what was resolved
//! today, in which order, and when the quota reopens.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{Resolution, Track, TrackKey};
use crate::time::DayKey;

/// Resolved tracks allowed per calendar day.
pub const MAX_DAILY_ATTEMPTS: u32 = 5;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("daily quota of {max} tracks already used")]
    QuotaExhausted { max: u32 },

    #[error("track already resolved today: {key}")]
    AlreadyResolved { key: TrackKey },

    #[error("played count ({played}) does not match resolved tracks ({resolved})")]
    CountMismatch { played: u32, resolved: usize },

    #[error("played count ({played}) exceeds the daily maximum ({max})")]
    OverQuota { played: u32, max: u32 },

    #[error("correct count ({stored}) does not match resolutions marked correct ({actual})")]
    CorrectMismatch { stored: u32, actual: u32 },
}

//
// ─── SNAPSHOT ──────────────────────────────────────────────────────────────────
//

/// Plain persisted shape of `DailyProgress`.
///
/// `resolution_order` and `correct_count` are optional so that a store holding
/// only the three original keys can still be read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub last_played_date: Option<DayKey>,
    pub resolved: Vec<TrackKey>,
    pub resolution_order: Option<Vec<Resolution>>,
    pub played_count: u32,
    pub correct_count: Option<u32>,
    pub cooldown_until: Option<DateTime<Utc>>,
}

//
// ─── DAILY PROGRESS ────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyProgress {
    max_daily: u32,
    last_played_date: Option<DayKey>,
    resolved: HashSet<TrackKey>,
    order: Vec<Resolution>,
    played_count: u32,
    correct_count: u32,
    cooldown_until: Option<DateTime<Utc>>,
}

impl Default for DailyProgress {
    fn default() -> Self {
        Self::new(MAX_DAILY_ATTEMPTS)
    }
}

impl DailyProgress {
    #[must_use]
    pub fn new(max_daily: u32) -> Self {
        Self {
            max_daily,
            last_played_date: None,
            resolved: HashSet::new(),
            order: Vec::new(),
            played_count: 0,
            correct_count: 0,
            cooldown_until: None,
        }
    }

    /// Rehydrate progress from persisted storage, checking its invariants.
    ///
    /// Missing resolution order is rebuilt from the resolved keys, each marked
    /// incorrect.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` when the stored counts and sets disagree.
    pub fn from_snapshot(max_daily: u32, snapshot: ProgressSnapshot) -> Result<Self, ProgressError> {
        let order = match snapshot.resolution_order {
            Some(order) => order,
            None => snapshot.resolved.iter().map(legacy_resolution).collect(),
        };

        let mut resolved = HashSet::with_capacity(order.len());
        for resolution in &order {
            if !resolved.insert(resolution.key().clone()) {
                return Err(ProgressError::AlreadyResolved {
                    key: resolution.key().clone(),
                });
            }
        }
        let stored_keys: HashSet<TrackKey> = snapshot.resolved.into_iter().collect();
        if stored_keys != resolved || usize::try_from(snapshot.played_count).ok() != Some(order.len()) {
            return Err(ProgressError::CountMismatch {
                played: snapshot.played_count,
                resolved: stored_keys.len(),
            });
        }
        if snapshot.played_count > max_daily {
            return Err(ProgressError::OverQuota {
                played: snapshot.played_count,
                max: max_daily,
            });
        }

        let actual_correct = count_correct(&order);
        let correct_count = snapshot.correct_count.unwrap_or(actual_correct);
        if correct_count != actual_correct {
            return Err(ProgressError::CorrectMismatch {
                stored: correct_count,
                actual: actual_correct,
            });
        }

        Ok(Self {
            max_daily,
            last_played_date: snapshot.last_played_date,
            resolved,
            order,
            played_count: snapshot.played_count,
            correct_count,
            cooldown_until: snapshot.cooldown_until,
        })
    }

    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            last_played_date: self.last_played_date,
            resolved: self.order.iter().map(|r| r.key().clone()).collect(),
            resolution_order: Some(self.order.clone()),
            played_count: self.played_count,
            correct_count: Some(self.correct_count),
            cooldown_until: self.cooldown_until,
        }
    }

    #[must_use]
    pub fn max_daily(&self) -> u32 {
        self.max_daily
    }

    #[must_use]
    pub fn last_played_date(&self) -> Option<DayKey> {
        self.last_played_date
    }

    #[must_use]
    pub fn played_count(&self) -> u32 {
        self.played_count
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    #[must_use]
    pub fn resolutions(&self) -> &[Resolution] {
        &self.order
    }

    #[must_use]
    pub fn is_resolved(&self, key: &TrackKey) -> bool {
        self.resolved.contains(key)
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.played_count >= self.max_daily
    }

    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.max_daily.saturating_sub(self.played_count)
    }

    #[must_use]
    pub fn cooldown_until(&self) -> Option<DateTime<Utc>> {
        self.cooldown_until
    }

    pub fn set_cooldown_until(&mut self, until: Option<DateTime<Utc>>) {
        self.cooldown_until = until;
    }

    /// Give resolutions rebuilt from bare keys the casing of matching `tracks`.
    ///
    /// Only entries whose key is on the playlist change; the rest keep the
    /// lower-cased text of the key.
    pub fn restore_display_names(&mut self, tracks: &[Track]) {
        for resolution in &mut self.order {
            let Some(track) = tracks.iter().find(|t| t.key() == *resolution.key()) else {
                continue;
            };
            if resolution.artist() != track.artist() || resolution.name() != track.name() {
                *resolution =
                    Resolution::from_persisted(track.artist(), track.name(), resolution.is_correct());
            }
        }
    }

    /// Record a terminal track outcome.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::QuotaExhausted` once the daily maximum is reached and
    /// `ProgressError::AlreadyResolved` for a track already recorded today.
    pub fn record(&mut self, resolution: Resolution) -> Result<u32, ProgressError> {
        if self.is_exhausted() {
            return Err(ProgressError::QuotaExhausted { max: self.max_daily });
        }
        if !self.resolved.insert(resolution.key().clone()) {
            return Err(ProgressError::AlreadyResolved {
                key: resolution.key().clone(),
            });
        }
        if resolution.is_correct() {
            self.correct_count = self.correct_count.saturating_add(1);
        }
        self.order.push(resolution);
        self.played_count = (self.played_count + 1).min(self.max_daily);
        Ok(self.played_count)
    }

    /// Reopen play once the cooldown timestamp has passed.
    ///
    /// Returns `true` when progress was reset.
    pub fn poll_cooldown(&mut self, now: DateTime<Utc>) -> bool {
        match self.cooldown_until {
            Some(until) if now >= until => {
                tracing::info!(%until, played = self.played_count, "cooldown elapsed, reopening quota");
                self.clear_day();
                true
            }
            _ => false,
        }
    }

    /// Reset everything when `today` differs from the stored day.
    ///
    /// The day boundary wins over the cooldown timestamp. Returns `true` when a
    /// reset happened.
    pub fn check_day_rollover(&mut self, today: DayKey) -> bool {
        if self.last_played_date == Some(today) {
            return false;
        }
        tracing::info!(
            previous = ?self.last_played_date,
            %today,
            "calendar day changed, resetting daily progress"
        );
        self.clear_day();
        self.last_played_date = Some(today);
        true
    }

    /// Live countdown to the cooldown, formatted `HH:MM:SS`.
    #[must_use]
    pub fn countdown(&self, now: DateTime<Utc>) -> Option<String> {
        self.cooldown_until.map(|until| format_countdown(until, now))
    }

    fn clear_day(&mut self) {
        self.resolved.clear();
        self.order.clear();
        self.played_count = 0;
        self.correct_count = 0;
        self.cooldown_until = None;
    }
}

fn count_correct(order: &[Resolution]) -> u32 {
    let correct = order.iter().filter(|r| r.is_correct()).count();
    u32::try_from(correct).unwrap_or(u32::MAX)
}

/// A stored key carries no casing, so the rebuilt artist and name are lower
/// case until [`DailyProgress::restore_display_names`] sees today's playlist.
fn legacy_resolution(key: &TrackKey) -> Resolution {
    match key.as_str().split_once(" - ") {
        Some((artist, name)) => Resolution::from_persisted(artist, name, false),
        None => Resolution::from_persisted(key.as_str(), "", false),
    }
}

/// Time left until `until`, as `HH:MM:SS`, never below `00:00:00`.
///
/// Hours are not wrapped, so a cooldown two days out shows `48:00:00`.
#[must_use]
pub fn format_countdown(until: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (until - now).num_seconds().max(0);
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}
