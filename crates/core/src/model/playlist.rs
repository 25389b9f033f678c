use std::collections::HashSet;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::track::Track;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PlaylistError {
    #[error("playlist has no tracks")]
    Empty,
}

/// Today's ordered set of candidate tracks plus the provider's cooldown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyPlaylist {
    tracks: Vec<Track>,
    day: String,
    cooldown_until: Option<DateTime<Utc>>,
}

impl DailyPlaylist {
    /// Duplicate tracks (same case-insensitive key) keep their first position.
    ///
    /// # Errors
    ///
    /// Returns `PlaylistError::Empty` when no tracks remain.
    pub fn new(
        tracks: Vec<Track>,
        day: impl Into<String>,
        cooldown_until: Option<DateTime<Utc>>,
    ) -> Result<Self, PlaylistError> {
        let mut seen = HashSet::new();
        let tracks: Vec<Track> = tracks
            .into_iter()
            .filter(|track| seen.insert(track.key()))
            .collect();
        if tracks.is_empty() {
            return Err(PlaylistError::Empty);
        }
        Ok(Self {
            tracks,
            day: day.into(),
            cooldown_until,
        })
    }

    #[must_use]
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    #[must_use]
    pub fn day(&self) -> &str {
        &self.day
    }

    #[must_use]
    pub fn cooldown_until(&self) -> Option<DateTime<Utc>> {
        self.cooldown_until
    }
}

/// Parse a provider cooldown timestamp.
///
/// Malformed values never fail the caller: the cooldown is treated as inactive
/// and the anomaly is logged.
#[must_use]
pub fn parse_cooldown(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    match DateTime::parse_from_rfc3339(raw) {
        Ok(at) => Some(at.with_timezone(&Utc)),
        Err(err) => {
            tracing::warn!(value = raw, error = %err, "ignoring unparseable cooldown timestamp");
            None
        }
    }
}
