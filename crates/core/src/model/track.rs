use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TrackError {
    #[error("track name cannot be empty")]
    EmptyName,

    #[error("track artist cannot be empty")]
    EmptyArtist,
}

//
// ─── TRACK KEY ─────────────────────────────────────────────────────────────────
//

/// Case-insensitive identity of a track: the lower-cased `"artist - name"` pair.
///
/// Providers do not hand out stable numeric ids, so this is the only key used
/// for the resolved set and for persistence.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackKey(String);

impl TrackKey {
    #[must_use]
    pub fn from_parts(artist: &str, name: &str) -> Self {
        Self(format!("{} - {}", artist.trim(), name.trim()).to_lowercase())
    }

    /// Rebuild a key from its persisted string form.
    #[must_use]
    pub fn from_persisted(raw: &str) -> Self {
        Self(raw.trim().to_lowercase())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TrackKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TrackKey({:?})", self.0)
    }
}

impl fmt::Display for TrackKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

//
// ─── TRACK ─────────────────────────────────────────────────────────────────────
//

/// One candidate song of the day. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    name: String,
    artist: String,
    preview_url: Option<String>,
    album_image: String,
}

impl Track {
    /// Build a track from provider data.
    ///
    /// A blank or malformed preview URL is kept as "no preview" so the session
    /// can skip the track instead of failing the whole playlist.
    ///
    /// # Errors
    ///
    /// Returns `TrackError` when the name or artist is blank.
    pub fn new(
        artist: impl Into<String>,
        name: impl Into<String>,
        preview_url: Option<String>,
        album_image: impl Into<String>,
    ) -> Result<Self, TrackError> {
        let artist = artist.into().trim().to_string();
        let name = name.into().trim().to_string();
        if artist.is_empty() {
            return Err(TrackError::EmptyArtist);
        }
        if name.is_empty() {
            return Err(TrackError::EmptyName);
        }

        let preview_url = preview_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .and_then(|url| match Url::parse(&url) {
                Ok(_) => Some(url),
                Err(err) => {
                    tracing::warn!(%artist, %name, %url, error = %err, "ignoring malformed preview url");
                    None
                }
            });

        Ok(Self {
            name,
            artist,
            preview_url,
            album_image: album_image.into(),
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn artist(&self) -> &str {
        &self.artist
    }

    #[must_use]
    pub fn preview_url(&self) -> Option<&str> {
        self.preview_url.as_deref()
    }

    #[must_use]
    pub fn album_image(&self) -> &str {
        &self.album_image
    }

    #[must_use]
    pub fn has_preview(&self) -> bool {
        self.preview_url.is_some()
    }

    #[must_use]
    pub fn key(&self) -> TrackKey {
        TrackKey::from_parts(&self.artist, &self.name)
    }

    /// The `"Artist - Title"` string players are asked to type.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} - {}", self.artist, self.name)
    }
}
