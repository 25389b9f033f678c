use std::sync::Arc;

use chrono::FixedOffset;
use kviz_core::Clock;
use kviz_core::model::{DailyPlaylist, Track};
use kviz_core::quota::DailyProgress;
use kviz_core::time::next_local_midnight;
use rand::SeedableRng;
use rand::rngs::StdRng;
use storage::repository::{ProgressRepository, StorageError};

use super::service::{AttemptStep, GuessOutcome, QuizSession};
use crate::config::QuizRules;
use crate::error::SessionError;
use crate::providers::TrackProvider;

/// Orchestrates session start and persists progress after each action.
#[derive(Clone)]
pub struct QuizLoopService {
    clock: Clock,
    offset: FixedOffset,
    rules: QuizRules,
    tracks: Arc<dyn TrackProvider>,
    progress: Arc<dyn ProgressRepository>,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        offset: FixedOffset,
        rules: QuizRules,
        tracks: Arc<dyn TrackProvider>,
        progress: Arc<dyn ProgressRepository>,
    ) -> Self {
        Self {
            clock,
            offset,
            rules,
            tracks,
            progress,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    #[must_use]
    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Fetch today's playlist, restore stored progress and pick the first track.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Load` when the track provider fails, or
    /// `SessionError::Storage` when progress cannot be read or written.
    pub async fn start_session(&self) -> Result<QuizSession, SessionError> {
        self.start_session_with_rng(StdRng::from_os_rng()).await
    }

    /// Same as [`QuizLoopService::start_session`] with a caller-provided RNG.
    ///
    /// # Errors
    ///
    /// See [`QuizLoopService::start_session`].
    pub async fn start_session_with_rng(&self, rng: StdRng) -> Result<QuizSession, SessionError> {
        let playlist = self.tracks.today().await.map_err(|err| {
            tracing::warn!(%err, "could not load today's tracks");
            SessionError::Load(err)
        })?;

        let now = self.clock.now();
        let mut progress = self.load_progress().await?;
        progress.check_day_rollover(self.clock.today(self.offset));
        progress.poll_cooldown(now);

        let cooldown = self.cooldown_for(&playlist);
        let session = QuizSession::new(playlist, progress, self.rules, cooldown, rng);
        self.persist(&session).await?;
        tracing::info!(
            day = session.day(),
            played = session.progress().played_count(),
            "quiz session started"
        );
        Ok(session)
    }

    /// # Errors
    ///
    /// Returns `SessionError` for session or persistence failures.
    pub async fn submit_guess(
        &self,
        session: &mut QuizSession,
        guess: &str,
    ) -> Result<GuessOutcome, SessionError> {
        let outcome = session.submit_guess(guess)?;
        if outcome != GuessOutcome::Empty {
            self.persist(session).await?;
        }
        Ok(outcome)
    }

    /// # Errors
    ///
    /// Returns `SessionError` for session or persistence failures.
    pub async fn skip(&self, session: &mut QuizSession) -> Result<AttemptStep, SessionError> {
        let step = session.skip()?;
        self.persist(session).await?;
        Ok(step)
    }

    /// Move on to a new track once the current one is resolved.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InProgress` while the current track is unresolved.
    pub fn next_track(&self, session: &mut QuizSession) -> Result<Option<Track>, SessionError> {
        Ok(session.next_track()?.cloned())
    }

    /// Reopen the quota once the cooldown has passed, persisting the reset.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the reset cannot be stored.
    pub async fn poll_cooldown(&self, session: &mut QuizSession) -> Result<bool, SessionError> {
        if !session.poll_cooldown(self.clock.now()) {
            return Ok(false);
        }
        self.persist(session).await?;
        Ok(true)
    }

    /// Reset on a new calendar day and fetch that day's playlist.
    ///
    /// A failed fetch keeps the previous tracks.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the reset cannot be stored.
    pub async fn poll_day_change(&self, session: &mut QuizSession) -> Result<bool, SessionError> {
        if !session.check_day_rollover(self.clock.today(self.offset)) {
            return Ok(false);
        }
        match self.tracks.today().await {
            Ok(playlist) => {
                let cooldown = self.cooldown_for(&playlist);
                session.replace_playlist(playlist, cooldown);
            }
            Err(err) => {
                tracing::warn!(%err, "keeping yesterday's tracks");
                session.set_cooldown_until(next_local_midnight(self.clock.now(), self.offset));
            }
        }
        self.persist(session).await?;
        Ok(true)
    }

    /// Forget all stored progress.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the keys cannot be removed.
    pub async fn reset(&self) -> Result<(), SessionError> {
        self.progress.clear().await?;
        tracing::info!("stored progress cleared");
        Ok(())
    }

    async fn load_progress(&self) -> Result<DailyProgress, SessionError> {
        let max = self.rules.max_daily_attempts;
        let snapshot = match self.progress.load().await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => return Ok(DailyProgress::new(max)),
            Err(StorageError::Serialization(reason)) => {
                tracing::warn!(%reason, "unreadable stored progress, starting fresh");
                return Ok(DailyProgress::new(max));
            }
            Err(err) => return Err(err.into()),
        };

        match DailyProgress::from_snapshot(max, snapshot) {
            Ok(progress) => Ok(progress),
            Err(err) => {
                tracing::warn!(%err, "inconsistent stored progress, starting fresh");
                Ok(DailyProgress::new(max))
            }
        }
    }

    /// The playlist's cooldown, or the next local midnight when it is missing
    /// or already in the past.
    fn cooldown_for(&self, playlist: &DailyPlaylist) -> chrono::DateTime<chrono::Utc> {
        let now = self.clock.now();
        playlist
            .cooldown_until()
            .filter(|until| *until > now)
            .unwrap_or_else(|| next_local_midnight(now, self.offset))
    }

    async fn persist(&self, session: &QuizSession) -> Result<(), SessionError> {
        self.progress.save(&session.progress().snapshot()).await?;
        Ok(())
    }
}
