use std::time::Duration;

use thiserror::Error;

/// Preview length allowed at each attempt, in milliseconds.
pub const ATTEMPT_DURATIONS_MS: [u64; 6] = [1_000, 3_000, 5_000, 10_000, 15_000, 30_000];

/// Index of the final attempt; advancing past it resolves the track.
pub const LAST_ATTEMPT: usize = ATTEMPT_DURATIONS_MS.len() - 1;

/// Playback window for the given attempt index, if it exists.
#[must_use]
pub fn attempt_duration(index: usize) -> Option<Duration> {
    ATTEMPT_DURATIONS_MS.get(index).copied().map(Duration::from_millis)
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum LadderError {
    #[error("track is already resolved")]
    AlreadyResolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LadderState {
    Listening { index: usize },
    ResolvedCorrect { index: usize },
    ResolvedIncorrect,
}

/// Result of moving one rung up the ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LadderStep {
    /// A new, longer playback window starts.
    Advanced { index: usize, duration: Duration },
    /// The last rung was already reached; the track is resolved as incorrect.
    Exhausted,
}

/// Per-track attempt state machine.
///
/// Starts at index 0, moves up on skip (or a rejected guess) and ends either
/// correct (any index) or incorrect (advancing from the last index).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptLadder {
    state: LadderState,
}

impl Default for AttemptLadder {
    fn default() -> Self {
        Self::new()
    }
}

impl AttemptLadder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: LadderState::Listening { index: 0 },
        }
    }

    #[must_use]
    pub fn state(&self) -> LadderState {
        self.state
    }

    /// Current attempt index while the track is still being listened to.
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        match self.state {
            LadderState::Listening { index } => Some(index),
            LadderState::ResolvedCorrect { .. } | LadderState::ResolvedIncorrect => None,
        }
    }

    /// Playback window for the current attempt.
    #[must_use]
    pub fn duration(&self) -> Option<Duration> {
        self.index().and_then(attempt_duration)
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.index().is_none()
    }

    /// `Some(true)` / `Some(false)` once resolved, `None` while listening.
    #[must_use]
    pub fn outcome(&self) -> Option<bool> {
        match self.state {
            LadderState::Listening { .. } => None,
            LadderState::ResolvedCorrect { .. } => Some(true),
            LadderState::ResolvedIncorrect => Some(false),
        }
    }

    /// Move to the next, longer attempt or resolve as incorrect from the last one.
    ///
    /// # Errors
    ///
    /// Returns `LadderError::AlreadyResolved` on a terminal ladder.
    pub fn advance(&mut self) -> Result<LadderStep, LadderError> {
        let LadderState::Listening { index } = self.state else {
            return Err(LadderError::AlreadyResolved);
        };

        if index < LAST_ATTEMPT {
            let next = index + 1;
            self.state = LadderState::Listening { index: next };
            let duration = attempt_duration(next).unwrap_or_default();
            Ok(LadderStep::Advanced {
                index: next,
                duration,
            })
        } else {
            self.state = LadderState::ResolvedIncorrect;
            Ok(LadderStep::Exhausted)
        }
    }

    /// Resolve as correct from any attempt.
    ///
    /// # Errors
    ///
    /// Returns `LadderError::AlreadyResolved` on a terminal ladder.
    pub fn succeed(&mut self) -> Result<(), LadderError> {
        let LadderState::Listening { index } = self.state else {
            return Err(LadderError::AlreadyResolved);
        };
        self.state = LadderState::ResolvedCorrect { index };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_grow_along_the_ladder() {
        let mut ladder = AttemptLadder::new();
        assert_eq!(ladder.duration(), Some(Duration::from_secs(1)));

        let step = ladder.advance().unwrap();
        assert_eq!(
            step,
            LadderStep::Advanced {
                index: 1,
                duration: Duration::from_secs(3)
            }
        );
    }

    #[test]
    fn sixth_skip_resolves_incorrect_and_not_earlier() {
        let mut ladder = AttemptLadder::new();
        for expected in 1..=LAST_ATTEMPT {
            let step = ladder.advance().unwrap();
            assert!(matches!(step, LadderStep::Advanced { index, .. } if index == expected));
            assert!(!ladder.is_resolved());
        }
        assert_eq!(ladder.duration(), Some(Duration::from_secs(30)));

        assert_eq!(ladder.advance().unwrap(), LadderStep::Exhausted);
        assert_eq!(ladder.state(), LadderState::ResolvedIncorrect);
        assert_eq!(ladder.outcome(), Some(false));
    }

    #[test]
    fn correct_guess_resolves_from_any_index() {
        for k in 0..=LAST_ATTEMPT {
            let mut ladder = AttemptLadder::new();
            for _ in 0..k {
                ladder.advance().unwrap();
            }
            ladder.succeed().unwrap();
            assert_eq!(ladder.state(), LadderState::ResolvedCorrect { index: k });
            assert_eq!(ladder.outcome(), Some(true));
        }
    }

    #[test]
    fn terminal_ladder_rejects_transitions() {
        let mut ladder = AttemptLadder::new();
        ladder.succeed().unwrap();
        assert_eq!(ladder.advance().unwrap_err(), LadderError::AlreadyResolved);
        assert_eq!(ladder.succeed().unwrap_err(), LadderError::AlreadyResolved);
        assert_eq!(ladder.index(), None);
        assert_eq!(ladder.duration(), None);
    }
}
