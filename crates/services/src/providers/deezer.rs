use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Datelike, FixedOffset};
use futures::future::join_all;
use kviz_core::Clock;
use kviz_core::model::{DailyPlaylist, Track};
use kviz_core::time::next_local_midnight;
use reqwest::Client;
use serde::Deserialize;

use super::schedule::{ScheduledTrack, WeeklySchedule, day_name};
use super::{TrackProvider, endpoint};
use crate::error::ProviderError;

pub const DEEZER_API_BASE: &str = "https://api.deezer.com";

const MAX_TRACKS: usize = 5;

/// Builds today's playlist by looking up the scheduled songs on Deezer.
///
/// Songs that cannot be found are dropped; the cooldown ends at the next local
/// midnight.
#[derive(Clone)]
pub struct DeezerTrackProvider {
    client: Client,
    api_base: String,
    schedule: Arc<WeeklySchedule>,
    clock: Clock,
    offset: FixedOffset,
}

impl DeezerTrackProvider {
    /// # Errors
    ///
    /// Returns `ProviderError::InvalidUrl` if `api_base` cannot be parsed.
    pub fn new(
        api_base: impl Into<String>,
        schedule: WeeklySchedule,
        clock: Clock,
        offset: FixedOffset,
    ) -> Result<Self, ProviderError> {
        let api_base = api_base.into();
        endpoint(&api_base, "search")?;
        Ok(Self {
            client: Client::new(),
            api_base,
            schedule: Arc::new(schedule),
            clock,
            offset,
        })
    }

    async fn lookup(&self, wanted: &ScheduledTrack) -> Option<Track> {
        let mut url = endpoint(&self.api_base, "search").ok()?;
        let query = format!("artist:\"{}\" track:\"{}\"", wanted.artist, wanted.title);
        url.query_pairs_mut().append_pair("q", &query);

        let response = match self.client.get(url).send().await {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                tracing::warn!(status = %response.status(), artist = %wanted.artist, title = %wanted.title, "deezer lookup refused");
                return None;
            }
            Err(err) => {
                tracing::warn!(%err, artist = %wanted.artist, title = %wanted.title, "deezer lookup failed");
                return None;
            }
        };

        let body: DeezerSearch = match response.json().await {
            Ok(body) => body,
            Err(err) => {
                tracing::warn!(%err, title = %wanted.title, "unreadable deezer response");
                return None;
            }
        };

        let hit = body.data.into_iter().next()?;
        Track::new(hit.artist.name, hit.title, hit.preview, hit.album.cover_medium)
            .map_err(|err| tracing::warn!(%err, "deezer returned a malformed track"))
            .ok()
    }
}

#[async_trait]
impl TrackProvider for DeezerTrackProvider {
    async fn today(&self) -> Result<DailyPlaylist, ProviderError> {
        let now = self.clock.now();
        let weekday = now.with_timezone(&self.offset).weekday();
        let wanted = self.schedule.for_weekday(weekday);

        let found = join_all(wanted.iter().map(|track| self.lookup(track))).await;
        let tracks: Vec<Track> = found.into_iter().flatten().take(MAX_TRACKS).collect();
        tracing::info!(
            day = day_name(weekday),
            scheduled = wanted.len(),
            found = tracks.len(),
            "looked up today's tracks"
        );
        if tracks.is_empty() {
            return Err(ProviderError::NoTracks);
        }

        let cooldown = next_local_midnight(now, self.offset);
        Ok(DailyPlaylist::new(tracks, day_name(weekday), Some(cooldown))?)
    }
}

#[derive(Debug, Deserialize)]
struct DeezerSearch {
    #[serde(default)]
    data: Vec<DeezerTrack>,
}

#[derive(Debug, Deserialize)]
struct DeezerTrack {
    title: String,
    #[serde(default)]
    preview: Option<String>,
    artist: DeezerArtist,
    #[serde(default)]
    album: DeezerAlbum,
}

#[derive(Debug, Deserialize)]
struct DeezerArtist {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct DeezerAlbum {
    #[serde(default)]
    cover_medium: String,
}
