//! Quiz configuration.
//!
//! Values are resolved in priority order: command-line flag, environment
//! variable, TOML file, compiled default.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::FixedOffset;
use kviz_core::matcher::MatchPolicy;
use kviz_core::quota::MAX_DAILY_ATTEMPTS;
use kviz_core::time::local_offset;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::providers::DEEZER_API_BASE;

pub const ENV_CONFIG: &str = "KVIZ_CONFIG";
pub const ENV_DB_URL: &str = "KVIZ_DB_URL";
pub const ENV_PROVIDER_URL: &str = "KVIZ_PROVIDER_URL";

const DEFAULT_DATABASE_URL: &str = "sqlite://kviz.db?mode=rwc";
const DEFAULT_PROVIDER_URL: &str = "http://localhost:3000/api";

/// Game rules that were left open and are therefore configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QuizRules {
    pub max_daily_attempts: u32,
    /// A rejected guess moves the ladder up exactly like a skip.
    pub wrong_guess_advances: bool,
    /// Accept the artist alone or the title alone as a correct guess.
    pub accept_single_field: bool,
}

impl Default for QuizRules {
    fn default() -> Self {
        Self {
            max_daily_attempts: MAX_DAILY_ATTEMPTS,
            wrong_guess_advances: true,
            accept_single_field: false,
        }
    }
}

impl QuizRules {
    #[must_use]
    pub fn match_policy(&self) -> MatchPolicy {
        MatchPolicy {
            accept_single_field: self.accept_single_field,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TrackSource {
    /// A server exposing `GET /today-tracks`.
    Http { base_url: String },
    /// Look up a weekly schedule on Deezer directly.
    Deezer {
        schedule_path: PathBuf,
        #[serde(default = "default_deezer_api")]
        api_base: String,
    },
}

impl Default for TrackSource {
    fn default() -> Self {
        Self::Http {
            base_url: DEFAULT_PROVIDER_URL.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SuggestionSource {
    /// Filter today's playlist.
    #[default]
    Local,
    /// A server exposing `GET /search?q=`.
    Http { base_url: String },
    /// Spotify search; credentials come from the environment.
    Spotify,
}

fn default_deezer_api() -> String {
    DEEZER_API_BASE.into()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QuizConfig {
    pub database_url: String,
    /// Offset used for day boundaries; the machine's local offset when unset.
    pub utc_offset_minutes: Option<i32>,
    pub track_source: TrackSource,
    pub suggestion_source: SuggestionSource,
    pub rules: QuizRules,
    pub cooldown_poll_secs: u64,
    pub day_change_poll_secs: u64,
    pub suggestion_debounce_ms: u64,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.into(),
            utc_offset_minutes: None,
            track_source: TrackSource::default(),
            suggestion_source: SuggestionSource::default(),
            rules: QuizRules::default(),
            cooldown_poll_secs: 60,
            day_change_poll_secs: 60,
            suggestion_debounce_ms: 300,
        }
    }
}

/// Values given on the command line; they win over everything else.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub database_url: Option<String>,
    pub provider_url: Option<String>,
    pub schedule_path: Option<PathBuf>,
}

impl QuizConfig {
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed TOML.
    pub fn from_toml_str(raw: &str, origin: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })
    }

    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let origin = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: origin.clone(),
            source,
        })?;
        Self::from_toml_str(&raw, &origin)
    }

    /// Resolve configuration from flags, the process environment and an optional file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for unreadable files or invalid values.
    pub fn load(overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        Self::load_with(overrides, |name| std::env::var(name).ok())
    }

    /// Same as [`QuizConfig::load`] with an injectable environment lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for unreadable files or invalid values.
    pub fn load_with(
        overrides: &ConfigOverrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let env = |name: &str| env(name).filter(|value| !value.trim().is_empty());

        let path = overrides
            .config_path
            .clone()
            .or_else(|| env(ENV_CONFIG).map(PathBuf::from));
        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        if let Some(url) = overrides.database_url.clone().or_else(|| env(ENV_DB_URL)) {
            config.database_url = url;
        }

        if let Some(schedule_path) = overrides.schedule_path.clone() {
            config.track_source = TrackSource::Deezer {
                schedule_path,
                api_base: default_deezer_api(),
            };
        } else if let Some(base_url) = overrides.provider_url.clone().or_else(|| env(ENV_PROVIDER_URL)) {
            config.track_source = TrackSource::Http { base_url };
        }

        config.validate()?;
        tracing::debug!(?config, "configuration resolved");
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns `ConfigError` for unparseable URLs, an impossible offset or zero intervals.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.track_source {
            TrackSource::Http { base_url } => check_url(base_url)?,
            TrackSource::Deezer { api_base, .. } => check_url(api_base)?,
        }
        if let SuggestionSource::Http { base_url } = &self.suggestion_source {
            check_url(base_url)?;
        }
        self.utc_offset()?;
        if self.rules.max_daily_attempts == 0 {
            return Err(ConfigError::Zero("rules.max_daily_attempts"));
        }
        if self.cooldown_poll_secs == 0 {
            return Err(ConfigError::Zero("cooldown_poll_secs"));
        }
        if self.day_change_poll_secs == 0 {
            return Err(ConfigError::Zero("day_change_poll_secs"));
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `ConfigError::Offset` when the configured offset is out of range.
    pub fn utc_offset(&self) -> Result<FixedOffset, ConfigError> {
        match self.utc_offset_minutes {
            Some(minutes) => minutes
                .checked_mul(60)
                .and_then(FixedOffset::east_opt)
                .ok_or(ConfigError::Offset(minutes)),
            None => Ok(local_offset()),
        }
    }

    #[must_use]
    pub fn cooldown_poll_interval(&self) -> Duration {
        Duration::from_secs(self.cooldown_poll_secs)
    }

    #[must_use]
    pub fn day_change_poll_interval(&self) -> Duration {
        Duration::from_secs(self.day_change_poll_secs)
    }

    #[must_use]
    pub fn suggestion_debounce(&self) -> Duration {
        Duration::from_millis(self.suggestion_debounce_ms)
    }
}

fn check_url(value: &str) -> Result<(), ConfigError> {
    url::Url::parse(value)
        .map(|_| ())
        .map_err(|source| ConfigError::Url {
            value: value.to_string(),
            source,
        })
}
