use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use kviz_core::DayKey;
use kviz_core::ladder::{AttemptLadder, LadderStep};
use kviz_core::matcher::{is_match, normalize};
use kviz_core::model::{DailyPlaylist, Resolution, Track, TrackKey};
use kviz_core::quota::DailyProgress;
use kviz_core::suggest::local_suggestions;
use rand::Rng;
use rand::rngs::StdRng;

use crate::config::QuizRules;
use crate::error::SessionError;

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

/// What the player is looking at right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizPhase {
    /// A track is playing at the given attempt index.
    Listening { index: usize },
    /// The current track is resolved and its answer is shown.
    Revealed { correct: bool },
    /// Today's quota is used; waiting for the cooldown or the next day.
    QuotaUsed,
    /// Every remaining track was resolved or could not be played.
    OutOfTracks,
}

/// Effect of moving the ladder up one rung.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptStep {
    /// A longer preview window starts.
    Advanced { index: usize, duration: Duration },
    /// The last window was already used; the track counts as played, not correct.
    Resolved { resolution: Resolution, played: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuessOutcome {
    /// Nothing was typed; no attempt is consumed.
    Empty,
    Correct { resolution: Resolution, played: u32 },
    /// `step` is `None` when wrong guesses do not advance the ladder.
    Rejected { shake: bool, step: Option<AttemptStep> },
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory quiz state for one day's playlist.
///
/// Owns the current track pointer, its attempt ladder and the daily progress.
/// Persisting the progress after each mutation is left to `QuizLoopService`.
pub struct QuizSession {
    tracks: Vec<Track>,
    day: String,
    cooldown_until: DateTime<Utc>,
    current: Option<usize>,
    ladder: AttemptLadder,
    progress: DailyProgress,
    unplayable: HashSet<TrackKey>,
    rules: QuizRules,
    rng: StdRng,
}

impl QuizSession {
    /// Start playing `playlist` on top of the already day-checked `progress`.
    ///
    /// `cooldown_until` is stamped into the progress once the quota is used up.
    #[must_use]
    pub fn new(
        playlist: DailyPlaylist,
        mut progress: DailyProgress,
        rules: QuizRules,
        cooldown_until: DateTime<Utc>,
        rng: StdRng,
    ) -> Self {
        let day = playlist.day().to_string();
        progress.restore_display_names(playlist.tracks());
        let mut session = Self {
            tracks: playlist.tracks().to_vec(),
            day,
            cooldown_until,
            current: None,
            ladder: AttemptLadder::new(),
            progress,
            unplayable: HashSet::new(),
            rules,
            rng,
        };
        session.stamp_cooldown();
        session.select_next();
        session
    }

    #[must_use]
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    #[must_use]
    pub fn day(&self) -> &str {
        &self.day
    }

    #[must_use]
    pub fn rules(&self) -> &QuizRules {
        &self.rules
    }

    #[must_use]
    pub fn progress(&self) -> &DailyProgress {
        &self.progress
    }

    /// Instant stamped into the progress once the quota is used up.
    #[must_use]
    pub fn cooldown_until(&self) -> DateTime<Utc> {
        self.cooldown_until
    }

    /// Replace the cooldown for the rest of the day without touching the tracks.
    pub fn set_cooldown_until(&mut self, until: DateTime<Utc>) {
        self.cooldown_until = until;
    }

    #[must_use]
    pub fn ladder(&self) -> &AttemptLadder {
        &self.ladder
    }

    #[must_use]
    pub fn current_track(&self) -> Option<&Track> {
        self.current.and_then(|index| self.tracks.get(index))
    }

    /// Preview window for the current attempt, while listening.
    #[must_use]
    pub fn attempt_duration(&self) -> Option<Duration> {
        self.current.and(self.ladder.duration())
    }

    #[must_use]
    pub fn is_unplayable(&self, key: &TrackKey) -> bool {
        self.unplayable.contains(key)
    }

    #[must_use]
    pub fn phase(&self) -> QuizPhase {
        if self.current.is_some() {
            return match (self.ladder.index(), self.ladder.outcome()) {
                (Some(index), _) => QuizPhase::Listening { index },
                (None, outcome) => QuizPhase::Revealed {
                    correct: outcome.unwrap_or(false),
                },
            };
        }
        if self.progress.is_exhausted() {
            QuizPhase::QuotaUsed
        } else {
            QuizPhase::OutOfTracks
        }
    }

    /// `HH:MM:SS` until the quota reopens, once it is used.
    #[must_use]
    pub fn countdown(&self, now: DateTime<Utc>) -> Option<String> {
        self.progress.countdown(now)
    }

    /// Check a free-text guess against the current track.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoCurrentTrack` when no track is being listened to,
    /// or a ladder/progress error if state is inconsistent.
    pub fn submit_guess(&mut self, guess: &str) -> Result<GuessOutcome, SessionError> {
        if normalize(guess).is_empty() {
            return Ok(GuessOutcome::Empty);
        }
        let track = self.listening_track()?.clone();

        if is_match(guess, track.artist(), track.name(), self.rules.match_policy()) {
            self.ladder.succeed()?;
            let resolution = Resolution::correct(&track);
            let played = self.resolve(resolution.clone())?;
            tracing::info!(track = %track.key(), played, "correct guess");
            return Ok(GuessOutcome::Correct { resolution, played });
        }

        tracing::debug!(track = %track.key(), "guess rejected");
        let step = if self.rules.wrong_guess_advances {
            Some(self.advance(&track)?)
        } else {
            None
        };
        Ok(GuessOutcome::Rejected { shake: true, step })
    }

    /// Give up the current window and move to the next one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoCurrentTrack` when no track is being listened to.
    pub fn skip(&mut self) -> Result<AttemptStep, SessionError> {
        let track = self.listening_track()?.clone();
        self.advance(&track)
    }

    /// Move on from a resolved track to a new random one.
    ///
    /// Returns the new track, or `None` when the quota is used or nothing is left.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InProgress` while the current track is unresolved.
    pub fn next_track(&mut self) -> Result<Option<&Track>, SessionError> {
        if matches!(self.phase(), QuizPhase::Listening { .. }) {
            return Err(SessionError::InProgress);
        }
        self.select_next();
        Ok(self.current_track())
    }

    /// The audio sink could not play the current track: drop it for this
    /// session and pick another one without charging an attempt.
    pub fn report_playback_failure(&mut self) -> Option<&Track> {
        if !matches!(self.phase(), QuizPhase::Listening { .. }) {
            return self.current_track();
        }
        if let Some(track) = self.current_track() {
            let key = track.key();
            tracing::warn!(track = %key, "playback failed, skipping track");
            self.unplayable.insert(key);
        }
        self.select_next();
        self.current_track()
    }

    /// Suggestions from today's playlist for a partial guess.
    pub fn suggestions(&mut self, guess: &str) -> Vec<String> {
        let current = self.current.and_then(|index| self.tracks.get(index));
        local_suggestions(guess, &self.tracks, current, &mut self.rng)
    }

    /// Reopen the quota once the cooldown has passed.
    ///
    /// Returns `true` when progress was reset.
    pub fn poll_cooldown(&mut self, now: DateTime<Utc>) -> bool {
        if !self.progress.poll_cooldown(now) {
            return false;
        }
        if self.current.is_none() {
            self.select_next();
        }
        true
    }

    /// Reset everything when the calendar day changed.
    ///
    /// Returns `true` when a reset happened.
    pub fn check_day_rollover(&mut self, today: DayKey) -> bool {
        if !self.progress.check_day_rollover(today) {
            return false;
        }
        self.unplayable.clear();
        self.select_next();
        true
    }

    /// Swap in a freshly fetched playlist, keeping today's progress.
    pub fn replace_playlist(&mut self, playlist: DailyPlaylist, cooldown_until: DateTime<Utc>) {
        tracing::info!(
            day = playlist.day(),
            tracks = playlist.tracks().len(),
            "playlist replaced"
        );
        self.tracks = playlist.tracks().to_vec();
        self.day = playlist.day().to_string();
        self.cooldown_until = cooldown_until;
        self.unplayable.clear();
        self.select_next();
    }

    fn listening_track(&self) -> Result<&Track, SessionError> {
        match (self.current_track(), self.ladder.is_resolved()) {
            (Some(track), false) => Ok(track),
            _ => Err(SessionError::NoCurrentTrack),
        }
    }

    fn advance(&mut self, track: &Track) -> Result<AttemptStep, SessionError> {
        match self.ladder.advance()? {
            LadderStep::Advanced { index, duration } => {
                tracing::debug!(track = %track.key(), index, "attempt advanced");
                Ok(AttemptStep::Advanced { index, duration })
            }
            LadderStep::Exhausted => {
                let resolution = Resolution::incorrect(track);
                let played = self.resolve(resolution.clone())?;
                tracing::info!(track = %track.key(), played, "attempts exhausted");
                Ok(AttemptStep::Resolved { resolution, played })
            }
        }
    }

    fn resolve(&mut self, resolution: Resolution) -> Result<u32, SessionError> {
        let played = self.progress.record(resolution)?;
        self.stamp_cooldown();
        Ok(played)
    }

    fn stamp_cooldown(&mut self) {
        if self.progress.is_exhausted() && self.progress.cooldown_until().is_none() {
            tracing::info!(until = %self.cooldown_until, "daily quota used");
            self.progress.set_cooldown_until(Some(self.cooldown_until));
        }
    }

    fn select_next(&mut self) {
        self.current = None;
        self.ladder = AttemptLadder::new();
        if self.progress.is_exhausted() {
            return;
        }

        loop {
            let eligible: Vec<usize> = self
                .tracks
                .iter()
                .enumerate()
                .filter(|(_, track)| {
                    let key = track.key();
                    !self.progress.is_resolved(&key) && !self.unplayable.contains(&key)
                })
                .map(|(index, _)| index)
                .collect();
            if eligible.is_empty() {
                tracing::info!(day = %self.day, "no tracks left to play");
                return;
            }

            let pick = eligible[self.rng.random_range(0..eligible.len())];
            let track = &self.tracks[pick];
            if track.has_preview() {
                tracing::debug!(track = %track.key(), "track selected");
                self.current = Some(pick);
                return;
            }
            tracing::warn!(track = %track.key(), "track has no preview, skipping");
            self.unplayable.insert(track.key());
        }
    }
}
