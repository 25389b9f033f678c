mod service;
mod workflow;

// Public API of the quiz session subsystem.
pub use crate::error::SessionError;
pub use service::{AttemptStep, GuessOutcome, QuizPhase, QuizSession};
pub use workflow::QuizLoopService;
