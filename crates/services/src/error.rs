//! Shared error types for the services crate.

use thiserror::Error;

use kviz_core::ladder::LadderError;
use kviz_core::model::PlaylistError;
use kviz_core::quota::ProgressError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by track and suggestion providers.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProviderError {
    #[error("provider is not configured: {0}")]
    Disabled(&'static str),
    #[error("provider returned status {status}: {message}")]
    HttpStatus {
        status: reqwest::StatusCode,
        message: String,
    },
    #[error("provider returned no playable tracks")]
    NoTracks,
    #[error("provider reported an error: {0}")]
    Remote(String),
    #[error("invalid provider url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error(transparent)]
    Playlist(#[from] PlaylistError),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors reported by an audio sink.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PlaybackError {
    #[error("nothing to play")]
    NoSource,
    #[error("playback failed: {0}")]
    Failed(String),
}

/// Errors emitted by the quiz session.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("could not load today's tracks: {0}")]
    Load(#[source] ProviderError),
    #[error("no track is currently playing")]
    NoCurrentTrack,
    #[error("the current track is still being guessed")]
    InProgress,
    #[error(transparent)]
    Ladder(#[from] LadderError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors raised while reading configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TOML in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid url {value:?}: {source}")]
    Url {
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error("utc offset of {0} minutes is out of range")]
    Offset(i32),
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
}
