#![forbid(unsafe_code)]

pub mod app_services;
pub mod config;
pub mod error;
pub mod playback;
pub mod providers;
pub mod sessions;
pub mod suggestions;

pub use kviz_core::Clock;

pub use app_services::AppServices;
pub use config::{ConfigOverrides, QuizConfig, QuizRules};
pub use error::{AppServicesError, ConfigError, PlaybackError, ProviderError, SessionError};
pub use playback::{AudioSink, PlaybackEvent, PlaybackGate};
pub use sessions::{AttemptStep, GuessOutcome, QuizLoopService, QuizPhase, QuizSession};
pub use suggestions::{SuggestionDebouncer, SuggestionEvent};
