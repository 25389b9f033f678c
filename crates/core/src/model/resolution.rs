use crate::model::track::{Track, TrackKey};

/// A track that reached a terminal state today, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    key: TrackKey,
    artist: String,
    name: String,
    is_correct: bool,
}

impl Resolution {
    #[must_use]
    pub fn correct(track: &Track) -> Self {
        Self::from_track(track, true)
    }

    #[must_use]
    pub fn incorrect(track: &Track) -> Self {
        Self::from_track(track, false)
    }

    fn from_track(track: &Track, is_correct: bool) -> Self {
        Self {
            key: track.key(),
            artist: track.artist().to_string(),
            name: track.name().to_string(),
            is_correct,
        }
    }

    /// Rehydrate a resolution from persisted storage.
    #[must_use]
    pub fn from_persisted(artist: impl Into<String>, name: impl Into<String>, is_correct: bool) -> Self {
        let artist = artist.into();
        let name = name.into();
        Self {
            key: TrackKey::from_parts(&artist, &name),
            artist,
            name,
            is_correct,
        }
    }

    #[must_use]
    pub fn key(&self) -> &TrackKey {
        &self.key
    }

    #[must_use]
    pub fn artist(&self) -> &str {
        &self.artist
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.is_correct
    }
}
