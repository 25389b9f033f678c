//! Debounced suggestion requests.

use std::sync::Arc;
use std::time::Duration;

use kviz_core::suggest::remote_suggestions;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::providers::SuggestionProvider;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuggestionEvent {
    /// The input settled; compute playlist suggestions for `query` now.
    Local { generation: u64, query: String },
    /// Results from the live search provider.
    Remote {
        generation: u64,
        query: String,
        suggestions: Vec<String>,
    },
}

impl SuggestionEvent {
    #[must_use]
    pub fn generation(&self) -> u64 {
        match self {
            Self::Local { generation, .. } | Self::Remote { generation, .. } => *generation,
        }
    }
}

/// Waits for the input to settle before asking for suggestions.
///
/// Each request supersedes the previous one; events carry a generation so that
/// late answers for older input can be dropped with [`SuggestionDebouncer::is_current`].
pub struct SuggestionDebouncer {
    delay: Duration,
    provider: Option<Arc<dyn SuggestionProvider>>,
    events: mpsc::UnboundedSender<SuggestionEvent>,
    pending: Option<JoinHandle<()>>,
    generation: u64,
}

impl SuggestionDebouncer {
    /// `provider` of `None` means suggestions come from the local playlist.
    #[must_use]
    pub fn new(
        delay: Duration,
        provider: Option<Arc<dyn SuggestionProvider>>,
    ) -> (Self, mpsc::UnboundedReceiver<SuggestionEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let debouncer = Self {
            delay,
            provider,
            events,
            pending: None,
            generation: 0,
        };
        (debouncer, rx)
    }

    #[must_use]
    pub fn is_current(&self, event: &SuggestionEvent) -> bool {
        event.generation() == self.generation
    }

    /// Register new input. Must be called from within a tokio runtime.
    ///
    /// Returns the generation assigned to this input.
    pub fn request(&mut self, query: &str) -> u64 {
        self.cancel();
        self.generation += 1;
        let generation = self.generation;
        let query = query.to_string();
        let delay = self.delay;
        let provider = self.provider.clone();
        let events = self.events.clone();

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let event = match provider {
                None => SuggestionEvent::Local { generation, query },
                Some(provider) => {
                    let suggestions = match provider.search(&query).await {
                        Ok(found) => remote_suggestions(&query, found),
                        Err(err) => {
                            tracing::warn!(%err, %query, "suggestion search failed");
                            Vec::new()
                        }
                    };
                    SuggestionEvent::Remote {
                        generation,
                        query,
                        suggestions,
                    }
                }
            };
            // The receiver may be gone during shutdown.
            let _ = events.send(event);
        }));
        generation
    }

    /// Drop any request that has not fired yet.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl Drop for SuggestionDebouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
