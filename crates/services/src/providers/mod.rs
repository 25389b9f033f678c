//! Clients for the services that supply today's tracks and live suggestions.

mod deezer;
mod http;
mod schedule;
mod spotify;

use async_trait::async_trait;
use kviz_core::model::DailyPlaylist;

use crate::error::ProviderError;

pub use deezer::{DEEZER_API_BASE, DeezerTrackProvider};
pub use http::{HttpSuggestionProvider, HttpTrackProvider};
pub use schedule::{ScheduledTrack, WeeklySchedule, day_name};
pub use spotify::{SpotifyConfig, SpotifySuggestionProvider};

/// Source of today's playlist.
#[async_trait]
pub trait TrackProvider: Send + Sync {
    /// Fetch today's playlist.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` when the source is unreachable or has nothing to play.
    async fn today(&self) -> Result<DailyPlaylist, ProviderError>;
}

/// Live "Artist - Title" search used for suggestions.
#[async_trait]
pub trait SuggestionProvider: Send + Sync {
    /// Search for display names matching `query`, best first.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` on transport failures or when the provider reports an error.
    async fn search(&self, query: &str) -> Result<Vec<String>, ProviderError>;
}

/// Track provider that always hands out the same playlist.
#[derive(Debug, Clone)]
pub struct StaticTrackProvider {
    playlist: DailyPlaylist,
}

impl StaticTrackProvider {
    #[must_use]
    pub fn new(playlist: DailyPlaylist) -> Self {
        Self { playlist }
    }
}

#[async_trait]
impl TrackProvider for StaticTrackProvider {
    async fn today(&self) -> Result<DailyPlaylist, ProviderError> {
        Ok(self.playlist.clone())
    }
}

/// Join `path` onto a base URL, tolerating a trailing slash on the base.
pub(crate) fn endpoint(base: &str, path: &str) -> Result<url::Url, ProviderError> {
    let joined = format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'));
    Ok(url::Url::parse(&joined)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_ignores_trailing_slash() {
        let url = endpoint("http://localhost:3000/api/", "today-tracks").unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/api/today-tracks");
        assert!(endpoint("not a url", "x").is_err());
    }
}
