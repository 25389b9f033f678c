//! String-encoded key layout for daily progress.
//!
//! The first three keys are the ones a browser build kept in local storage;
//! the rest carry what the end-of-day summary needs across reloads.

use kviz_core::DayKey;
use kviz_core::model::{Resolution, TrackKey, parse_cooldown};
use kviz_core::quota::ProgressSnapshot;
use serde::{Deserialize, Serialize};

use crate::repository::StorageError;

pub const LAST_PLAYED_DATE: &str = "lastPlayedDate";
pub const GUESSED_TRACKS: &str = "guessedTracks";
pub const PLAYED_TRACKS_COUNT: &str = "playedTracksCount";
pub const CORRECT_TRACKS_COUNT: &str = "correctTracksCount";
pub const RESOLUTION_ORDER: &str = "resolutionOrder";
pub const COOLDOWN_UNTIL: &str = "cooldownUntil";

/// Every key owned by the progress layout, written and cleared together.
pub const ALL_KEYS: [&str; 6] = [
    LAST_PLAYED_DATE,
    GUESSED_TRACKS,
    PLAYED_TRACKS_COUNT,
    CORRECT_TRACKS_COUNT,
    RESOLUTION_ORDER,
    COOLDOWN_UNTIL,
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResolutionEntry {
    artist: String,
    name: String,
    is_correct: bool,
}

/// Raw persisted values, one optional string per key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressRecord {
    pub last_played_date: Option<String>,
    pub guessed_tracks: Option<String>,
    pub played_tracks_count: Option<String>,
    pub correct_tracks_count: Option<String>,
    pub resolution_order: Option<String>,
    pub cooldown_until: Option<String>,
}

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

impl ProgressRecord {
    /// Encode a snapshot into the string layout.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if JSON encoding fails.
    pub fn from_snapshot(snapshot: &ProgressSnapshot) -> Result<Self, StorageError> {
        let keys: Vec<&str> = snapshot.resolved.iter().map(TrackKey::as_str).collect();
        let order = snapshot
            .resolution_order
            .as_ref()
            .map(|order| {
                let entries: Vec<ResolutionEntry> = order
                    .iter()
                    .map(|r| ResolutionEntry {
                        artist: r.artist().to_string(),
                        name: r.name().to_string(),
                        is_correct: r.is_correct(),
                    })
                    .collect();
                serde_json::to_string(&entries)
            })
            .transpose()
            .map_err(ser)?;

        Ok(Self {
            last_played_date: snapshot.last_played_date.map(|d| d.to_string()),
            guessed_tracks: Some(serde_json::to_string(&keys).map_err(ser)?),
            played_tracks_count: Some(snapshot.played_count.to_string()),
            correct_tracks_count: snapshot.correct_count.map(|c| c.to_string()),
            resolution_order: order,
            cooldown_until: snapshot.cooldown_until.map(|at| at.to_rfc3339()),
        })
    }

    /// True when nothing was ever stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.last_played_date.is_none()
            && self.guessed_tracks.is_none()
            && self.played_tracks_count.is_none()
    }

    /// Decode the string layout.
    ///
    /// An unparseable cooldown is dropped (logged) rather than failing the load.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` for malformed dates, counts or JSON.
    pub fn into_snapshot(self) -> Result<ProgressSnapshot, StorageError> {
        let last_played_date = self
            .last_played_date
            .as_deref()
            .map(str::parse::<DayKey>)
            .transpose()
            .map_err(ser)?;

        let resolved = match self.guessed_tracks.as_deref() {
            Some(raw) => serde_json::from_str::<Vec<String>>(raw)
                .map_err(ser)?
                .iter()
                .map(|key| TrackKey::from_persisted(key))
                .collect(),
            None => Vec::new(),
        };

        let played_count = match self.played_tracks_count.as_deref() {
            Some(raw) => raw.trim().parse::<u32>().map_err(ser)?,
            None => 0,
        };

        let correct_count = self
            .correct_tracks_count
            .as_deref()
            .map(|raw| raw.trim().parse::<u32>())
            .transpose()
            .map_err(ser)?;

        let resolution_order = self
            .resolution_order
            .as_deref()
            .map(|raw| serde_json::from_str::<Vec<ResolutionEntry>>(raw))
            .transpose()
            .map_err(ser)?
            .map(|entries| {
                entries
                    .into_iter()
                    .map(|e| Resolution::from_persisted(e.artist, e.name, e.is_correct))
                    .collect()
            });

        Ok(ProgressSnapshot {
            last_played_date,
            resolved,
            resolution_order,
            played_count,
            correct_count,
            cooldown_until: parse_cooldown(self.cooldown_until.as_deref()),
        })
    }

    /// Key/value pairs to write; `None` means the key is removed.
    #[must_use]
    pub fn into_entries(self) -> Vec<(&'static str, Option<String>)> {
        vec![
            (LAST_PLAYED_DATE, self.last_played_date),
            (GUESSED_TRACKS, self.guessed_tracks),
            (PLAYED_TRACKS_COUNT, self.played_tracks_count),
            (CORRECT_TRACKS_COUNT, self.correct_tracks_count),
            (RESOLUTION_ORDER, self.resolution_order),
            (COOLDOWN_UNTIL, self.cooldown_until),
        ]
    }
}
