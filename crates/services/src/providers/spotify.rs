use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::{SuggestionProvider, endpoint};
use crate::error::ProviderError;

const SEARCH_LIMIT: &str = "15";
const SEARCH_MARKET: &str = "HR";
/// Tokens are refreshed this long before Spotify says they expire.
const EXPIRY_MARGIN: Duration = Duration::from_secs(30);

#[derive(Clone, Debug)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub client_secret: String,
    pub accounts_base: String,
    pub api_base: String,
}

impl SpotifyConfig {
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let client_id = env::var("SPOTIFY_CLIENT_ID").ok()?;
        let client_secret = env::var("SPOTIFY_CLIENT_SECRET").ok()?;
        if client_id.trim().is_empty() || client_secret.trim().is_empty() {
            return None;
        }
        Some(Self {
            client_id,
            client_secret,
            accounts_base: "https://accounts.spotify.com".into(),
            api_base: "https://api.spotify.com".into(),
        })
    }
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// Track search against the Spotify Web API using client credentials.
pub struct SpotifySuggestionProvider {
    client: Client,
    config: Option<SpotifyConfig>,
    token: Mutex<Option<CachedToken>>,
}

impl SpotifySuggestionProvider {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(SpotifyConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<SpotifyConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
            token: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }

    async fn access_token(&self, config: &SpotifyConfig) -> Result<String, ProviderError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.expires_at > Instant::now()) {
            return Ok(token.value.clone());
        }

        let url = endpoint(&config.accounts_base, "api/token")?;
        let response = self
            .client
            .post(url)
            .basic_auth(&config.client_id, Some(&config.client_secret))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body("grant_type=client_credentials")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::HttpStatus { status, message });
        }

        let body: TokenResponse = response.json().await?;
        let value = body
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ProviderError::Remote("no access token in response".into()))?;
        let lifetime = Duration::from_secs(body.expires_in.unwrap_or(3600));
        *cached = Some(CachedToken {
            value: value.clone(),
            expires_at: Instant::now() + lifetime.saturating_sub(EXPIRY_MARGIN),
        });
        tracing::debug!(expires_in = lifetime.as_secs(), "obtained spotify token");
        Ok(value)
    }
}

#[async_trait]
impl SuggestionProvider for SpotifySuggestionProvider {
    async fn search(&self, query: &str) -> Result<Vec<String>, ProviderError> {
        let config = self
            .config
            .as_ref()
            .ok_or(ProviderError::Disabled("spotify"))?;
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let token = self.access_token(config).await?;
        let mut url = endpoint(&config.api_base, "v1/search")?;
        url.query_pairs_mut()
            .append_pair("type", "track")
            .append_pair("limit", SEARCH_LIMIT)
            .append_pair("market", SEARCH_MARKET)
            .append_pair("q", query);

        let response = self.client.get(url).bearer_auth(token).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::HttpStatus { status, message });
        }

        let body: SearchResponse = response.json().await?;
        Ok(rank_items(body.tracks.items))
    }
}

/// Valid items, most popular first, as `"Title - Artist"`.
fn rank_items(items: Vec<SpotifyTrack>) -> Vec<String> {
    let mut valid: Vec<(u32, String)> = items
        .into_iter()
        .filter_map(|item| {
            let artist = item.artists.into_iter().next()?.name;
            if item.name.is_empty() || artist.is_empty() {
                return None;
            }
            Some((item.popularity, format!("{} - {artist}", item.name)))
        })
        .collect();
    valid.sort_by(|a, b| b.0.cmp(&a.0));
    valid.into_iter().map(|(_, display)| display).collect()
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    tracks: SpotifyTracks,
}

#[derive(Debug, Default, Deserialize)]
struct SpotifyTracks {
    #[serde(default)]
    items: Vec<SpotifyTrack>,
}

#[derive(Debug, Deserialize)]
struct SpotifyTrack {
    #[serde(default)]
    name: String,
    #[serde(default)]
    popularity: u32,
    #[serde(default)]
    artists: Vec<SpotifyArtist>,
}

#[derive(Debug, Deserialize)]
struct SpotifyArtist {
    #[serde(default)]
    name: String,
}
