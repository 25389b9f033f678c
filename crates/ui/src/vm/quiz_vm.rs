use std::time::Duration;

use chrono::{DateTime, Utc};
use kviz_core::ladder::attempt_duration;
use services::{AttemptStep, GuessOutcome, QuizLoopService, QuizPhase, QuizSession};

use crate::state::ViewError;
use crate::vm::summary_vm::{SlotState, SummaryVm, progress_slots};
use crate::vm::time_fmt::format_seconds;

/// Label above the controls, e.g. `Pokušaj #1 - slušaj prvih 1.0 sekundi`.
#[must_use]
pub fn attempt_label(index: usize) -> Option<String> {
    attempt_duration(index).map(|window| {
        format!(
            "Pokušaj #{} - slušaj prvih {} sekundi",
            index + 1,
            format_seconds(window)
        )
    })
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QuizIntent {
    Guess(String),
    Skip,
    Next,
    PlaybackFailed,
}

/// What the audio gate should do after an intent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackCue {
    /// Start the current track's window from zero.
    Restart,
    /// Stop audio and cancel timers.
    Freeze,
    Keep,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Feedback {
    /// Empty input; nothing happened.
    Ignored,
    Correct,
    Wrong {
        shake: bool,
        advanced_to: Option<usize>,
        exhausted: bool,
    },
    Advanced { index: usize },
    Exhausted,
    NewTrack,
    NoTrack,
}

impl Feedback {
    fn from_step(step: &AttemptStep) -> Self {
        match step {
            AttemptStep::Advanced { index, .. } => Self::Advanced { index: *index },
            AttemptStep::Resolved { .. } => Self::Exhausted,
        }
    }

    #[must_use]
    pub fn message(self) -> Option<&'static str> {
        match self {
            Self::Correct => Some("Točno!"),
            Self::Wrong { exhausted: true, .. } | Self::Exhausted => {
                Some("Nema više pokušaja za ovu pjesmu.")
            }
            Self::Wrong { .. } => Some("Netočno! Pokušaj ponovo."),
            Self::Ignored | Self::Advanced { .. } | Self::NewTrack | Self::NoTrack => None,
        }
    }

    #[must_use]
    pub fn cue(self) -> PlaybackCue {
        match self {
            Self::Ignored
            | Self::Wrong {
                advanced_to: None,
                exhausted: false,
                ..
            } => PlaybackCue::Keep,
            Self::Wrong {
                exhausted: true, ..
            }
            | Self::Correct
            | Self::Exhausted
            | Self::NoTrack => PlaybackCue::Freeze,
            Self::Wrong { .. } | Self::Advanced { .. } | Self::NewTrack => PlaybackCue::Restart,
        }
    }
}

/// Everything one screen needs to render.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QuizScreen {
    Listening {
        attempt_label: String,
        window: Duration,
        slots: Vec<SlotState>,
    },
    Revealed {
        title: String,
        artist: String,
        album_image: String,
        correct: bool,
        slots: Vec<SlotState>,
    },
    QuotaUsed(SummaryVm),
    OutOfTracks {
        slots: Vec<SlotState>,
    },
}

pub struct QuizVm {
    session: QuizSession,
}

impl QuizVm {
    #[must_use]
    pub fn new(session: QuizSession) -> Self {
        Self { session }
    }

    #[must_use]
    pub fn session(&self) -> &QuizSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut QuizSession {
        &mut self.session
    }

    /// Preview URL and window to play right now, if a track is being guessed.
    #[must_use]
    pub fn now_playing(&self) -> Option<(&str, Duration)> {
        let track = self.session.current_track()?;
        let window = self.session.attempt_duration()?;
        Some((track.preview_url()?, window))
    }

    pub fn suggestions(&mut self, query: &str) -> Vec<String> {
        self.session.suggestions(query)
    }

    #[must_use]
    pub fn screen(&self, now: DateTime<Utc>) -> QuizScreen {
        let slots = progress_slots(self.session.progress());
        match self.session.phase() {
            QuizPhase::Listening { index } => QuizScreen::Listening {
                attempt_label: attempt_label(index).unwrap_or_default(),
                window: attempt_duration(index).unwrap_or_default(),
                slots,
            },
            QuizPhase::Revealed { correct } => {
                let (title, artist, album_image) = self
                    .session
                    .current_track()
                    .map(|t| {
                        (
                            t.name().to_string(),
                            t.artist().to_string(),
                            t.album_image().to_string(),
                        )
                    })
                    .unwrap_or_default();
                QuizScreen::Revealed {
                    title,
                    artist,
                    album_image,
                    correct,
                    slots,
                }
            }
            QuizPhase::QuotaUsed => {
                QuizScreen::QuotaUsed(SummaryVm::from_progress(self.session.progress(), now))
            }
            QuizPhase::OutOfTracks => QuizScreen::OutOfTracks { slots },
        }
    }

    /// # Errors
    ///
    /// Returns `ViewError::NotAvailable` when the intent does not fit the screen
    /// and `ViewError::Unknown` for storage failures.
    pub async fn apply(
        &mut self,
        quiz_loop: &QuizLoopService,
        intent: QuizIntent,
    ) -> Result<Feedback, ViewError> {
        let feedback = match intent {
            QuizIntent::Guess(guess) => {
                match quiz_loop
                    .submit_guess(&mut self.session, &guess)
                    .await
                    .map_err(|err| ViewError::from(&err))?
                {
                    GuessOutcome::Empty => Feedback::Ignored,
                    GuessOutcome::Correct { .. } => Feedback::Correct,
                    GuessOutcome::Rejected { shake, step } => Feedback::Wrong {
                        shake,
                        advanced_to: match step {
                            Some(AttemptStep::Advanced { index, .. }) => Some(index),
                            _ => None,
                        },
                        exhausted: matches!(step, Some(AttemptStep::Resolved { .. })),
                    },
                }
            }
            QuizIntent::Skip => {
                let step = quiz_loop
                    .skip(&mut self.session)
                    .await
                    .map_err(|err| ViewError::from(&err))?;
                Feedback::from_step(&step)
            }
            QuizIntent::Next => {
                match quiz_loop
                    .next_track(&mut self.session)
                    .map_err(|err| ViewError::from(&err))?
                {
                    Some(_) => Feedback::NewTrack,
                    None => Feedback::NoTrack,
                }
            }
            QuizIntent::PlaybackFailed => match self.session.report_playback_failure() {
                Some(_) => Feedback::NewTrack,
                None => Feedback::NoTrack,
            },
        };
        Ok(feedback)
    }
}

/// # Errors
///
/// Returns `ViewError::LoadFailed` when today's tracks cannot be fetched.
/// Returns `ViewError::Unknown` for other failures.
pub async fn start_quiz(quiz_loop: &QuizLoopService) -> Result<QuizVm, ViewError> {
    let session = quiz_loop
        .start_session()
        .await
        .map_err(|err| ViewError::from(&err))?;
    Ok(QuizVm::new(session))
}
