use async_trait::async_trait;
use kviz_core::model::{DailyPlaylist, Track, parse_cooldown};
use reqwest::Client;
use serde::Deserialize;

use super::{SuggestionProvider, TrackProvider, endpoint};
use crate::error::ProviderError;

/// Reads `GET {base}/today-tracks`.
#[derive(Clone)]
pub struct HttpTrackProvider {
    client: Client,
    base_url: String,
}

impl HttpTrackProvider {
    /// # Errors
    ///
    /// Returns `ProviderError::InvalidUrl` if `base_url` cannot be parsed.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ProviderError> {
        let base_url = base_url.into();
        endpoint(&base_url, "today-tracks")?;
        Ok(Self {
            client: Client::new(),
            base_url,
        })
    }
}

#[async_trait]
impl TrackProvider for HttpTrackProvider {
    async fn today(&self) -> Result<DailyPlaylist, ProviderError> {
        let url = endpoint(&self.base_url, "today-tracks")?;
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error)
                .unwrap_or_default();
            tracing::warn!(%status, %message, "track provider refused the request");
            return Err(ProviderError::HttpStatus { status, message });
        }

        let body: TodayTracksResponse = response.json().await?;
        let tracks: Vec<Track> = body
            .tracks
            .into_iter()
            .filter_map(|payload| {
                Track::new(
                    payload.artist,
                    payload.name,
                    payload.preview_url,
                    payload.album_image.unwrap_or_default(),
                )
                .map_err(|err| tracing::warn!(%err, "skipping malformed track"))
                .ok()
            })
            .collect();

        if tracks.is_empty() {
            return Err(ProviderError::NoTracks);
        }

        let cooldown = parse_cooldown(body.cooldown_until.as_deref());
        let playlist = DailyPlaylist::new(tracks, body.day, cooldown)?;
        tracing::info!(
            day = playlist.day(),
            tracks = playlist.tracks().len(),
            "loaded today's tracks"
        );
        Ok(playlist)
    }
}

/// Reads `GET {base}/search?q=<text>`.
#[derive(Clone)]
pub struct HttpSuggestionProvider {
    client: Client,
    base_url: String,
}

impl HttpSuggestionProvider {
    /// # Errors
    ///
    /// Returns `ProviderError::InvalidUrl` if `base_url` cannot be parsed.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ProviderError> {
        let base_url = base_url.into();
        endpoint(&base_url, "search")?;
        Ok(Self {
            client: Client::new(),
            base_url,
        })
    }
}

#[async_trait]
impl SuggestionProvider for HttpSuggestionProvider {
    async fn search(&self, query: &str) -> Result<Vec<String>, ProviderError> {
        let mut url = endpoint(&self.base_url, "search")?;
        url.query_pairs_mut().append_pair("q", query);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body: SearchResponse = response.json().await?;

        if let Some(error) = body.error.filter(|_| body.results.is_empty()) {
            return Err(ProviderError::Remote(error));
        }
        if !status.is_success() {
            return Err(ProviderError::HttpStatus {
                status,
                message: String::new(),
            });
        }

        Ok(body
            .results
            .into_iter()
            .filter_map(SearchResult::into_display_name)
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TodayTracksResponse {
    #[serde(default)]
    tracks: Vec<TrackPayload>,
    #[serde(default)]
    day: String,
    #[serde(default, rename = "cooldownUntil")]
    cooldown_until: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TrackPayload {
    name: String,
    artist: String,
    #[serde(default)]
    preview_url: Option<String>,
    #[serde(default)]
    album_image: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResult {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    artist: String,
}

impl SearchResult {
    fn into_display_name(self) -> Option<String> {
        match self.display_name {
            Some(display) if !display.trim().is_empty() => Some(display),
            _ if !self.name.is_empty() && !self.artist.is_empty() => {
                Some(format!("{} - {}", self.artist, self.name))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_falls_back_to_fields() {
        let result = SearchResult {
            display_name: None,
            name: "Karmin".into(),
            artist: "Inas".into(),
        };
        assert_eq!(result.into_display_name().as_deref(), Some("Inas - Karmin"));

        let empty = SearchResult {
            display_name: Some("  ".into()),
            name: String::new(),
            artist: "Inas".into(),
        };
        assert_eq!(empty.into_display_name(), None);
    }

    #[test]
    fn today_tracks_payload_tolerates_missing_fields() {
        let body: TodayTracksResponse = serde_json::from_str(
            r#"{"tracks":[{"name":"Rambo","artist":"Coby","preview_url":null}],"day":"srijeda"}"#,
        )
        .unwrap();
        assert_eq!(body.tracks.len(), 1);
        assert_eq!(body.cooldown_until, None);
        assert_eq!(body.tracks[0].album_image, None);
    }
}
