use std::sync::Arc;

use kviz_core::Clock;
use chrono::FixedOffset;
use storage::repository::Storage;

use crate::config::{QuizConfig, SuggestionSource, TrackSource};
use crate::error::AppServicesError;
use crate::providers::{
    DeezerTrackProvider, HttpSuggestionProvider, HttpTrackProvider, SpotifySuggestionProvider,
    SuggestionProvider, TrackProvider, WeeklySchedule,
};
use crate::sessions::QuizLoopService;

/// Assembles the services the front-end needs from a resolved configuration.
#[derive(Clone)]
pub struct AppServices {
    config: QuizConfig,
    quiz_loop: Arc<QuizLoopService>,
    suggestions: Option<Arc<dyn SuggestionProvider>>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or provider setup fails.
    pub async fn from_config(config: QuizConfig, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(&config.database_url).await?;
        Self::with_storage(config, clock, storage)
    }

    /// Build services on top of an existing storage backend.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the schedule or a provider URL is invalid.
    pub fn with_storage(
        config: QuizConfig,
        clock: Clock,
        storage: Storage,
    ) -> Result<Self, AppServicesError> {
        let offset = config.utc_offset()?;
        let tracks = build_track_provider(&config.track_source, clock, offset)?;
        Self::assemble(config, clock, storage, tracks)
    }

    /// Build services with an explicit track provider.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the configuration is invalid.
    pub fn assemble(
        config: QuizConfig,
        clock: Clock,
        storage: Storage,
        tracks: Arc<dyn TrackProvider>,
    ) -> Result<Self, AppServicesError> {
        config.validate()?;
        let offset = config.utc_offset()?;
        let suggestions = build_suggestion_provider(&config.suggestion_source)?;
        let quiz_loop = Arc::new(QuizLoopService::new(
            clock,
            offset,
            config.rules,
            tracks,
            Arc::clone(&storage.progress),
        ));

        Ok(Self {
            config,
            quiz_loop,
            suggestions,
        })
    }

    #[must_use]
    pub fn config(&self) -> &QuizConfig {
        &self.config
    }

    #[must_use]
    pub fn quiz_loop(&self) -> Arc<QuizLoopService> {
        Arc::clone(&self.quiz_loop)
    }

    /// Live search provider, `None` when suggestions come from the playlist.
    #[must_use]
    pub fn suggestion_provider(&self) -> Option<Arc<dyn SuggestionProvider>> {
        self.suggestions.clone()
    }
}

fn build_track_provider(
    source: &TrackSource,
    clock: Clock,
    offset: FixedOffset,
) -> Result<Arc<dyn TrackProvider>, AppServicesError> {
    Ok(match source {
        TrackSource::Http { base_url } => Arc::new(HttpTrackProvider::new(base_url.clone())?),
        TrackSource::Deezer {
            schedule_path,
            api_base,
        } => {
            let schedule = WeeklySchedule::load(schedule_path)?;
            Arc::new(DeezerTrackProvider::new(
                api_base.clone(),
                schedule,
                clock,
                offset,
            )?)
        }
    })
}

fn build_suggestion_provider(
    source: &SuggestionSource,
) -> Result<Option<Arc<dyn SuggestionProvider>>, AppServicesError> {
    Ok(match source {
        SuggestionSource::Local => None,
        SuggestionSource::Http { base_url } => {
            Some(Arc::new(HttpSuggestionProvider::new(base_url.clone())?))
        }
        SuggestionSource::Spotify => {
            let provider = SpotifySuggestionProvider::from_env();
            if provider.enabled() {
                Some(Arc::new(provider))
            } else {
                tracing::warn!("spotify credentials missing, using playlist suggestions");
                None
            }
        }
    })
}
