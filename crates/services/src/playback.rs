//! Time-boxed preview playback.
//!
//! Every new window restarts the clip from zero and cuts it off after exactly
//! the window's length of wall-clock time. Pausing does not move the cutoff.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::error::PlaybackError;

/// Period of the cosmetic progress updates.
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Something that can play a preview clip.
pub trait AudioSink: Send + Sync {
    /// Start `url` from the beginning.
    ///
    /// # Errors
    ///
    /// Returns `PlaybackError` when the clip cannot be started.
    fn play_from_start(&self, url: &str) -> Result<(), PlaybackError>;

    fn pause(&self);

    /// # Errors
    ///
    /// Returns `PlaybackError` when playback cannot continue.
    fn resume(&self) -> Result<(), PlaybackError>;

    fn stop(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// The window for the given generation ran out and audio was stopped.
    CutOff { generation: u64 },
}

#[derive(Debug, Clone)]
struct Window {
    url: String,
    length: Duration,
    expired: bool,
}

pub struct PlaybackGate {
    sink: Arc<dyn AudioSink>,
    events: mpsc::UnboundedSender<PlaybackEvent>,
    elapsed: watch::Sender<Duration>,
    cutoff: Option<JoinHandle<()>>,
    ticker: Option<JoinHandle<()>>,
    generation: u64,
    window: Option<Window>,
    playing: bool,
}

impl PlaybackGate {
    #[must_use]
    pub fn new(sink: Arc<dyn AudioSink>) -> (Self, mpsc::UnboundedReceiver<PlaybackEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let (elapsed, _) = watch::channel(Duration::ZERO);
        let gate = Self {
            sink,
            events,
            elapsed,
            cutoff: None,
            ticker: None,
            generation: 0,
            window: None,
            playing: false,
        };
        (gate, rx)
    }

    /// Elapsed time in the current window, updated every [`TICK_INTERVAL`].
    #[must_use]
    pub fn elapsed(&self) -> watch::Receiver<Duration> {
        self.elapsed.subscribe()
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Play `url` from zero for `length`, replacing any running window.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `PlaybackError` when the sink cannot start; no timers are left running.
    pub fn start(&mut self, url: &str, length: Duration) -> Result<(), PlaybackError> {
        self.cancel_timers();
        self.generation += 1;
        self.window = Some(Window {
            url: url.to_string(),
            length,
            expired: false,
        });
        self.elapsed.send_replace(Duration::ZERO);

        if let Err(err) = self.sink.play_from_start(url) {
            self.playing = false;
            self.window = None;
            return Err(err);
        }
        self.playing = true;
        self.spawn_timers(length);
        tracing::debug!(generation = self.generation, ?length, "preview window started");
        Ok(())
    }

    /// Pause or resume inside the current window.
    ///
    /// Once the window has run out this replays it from zero. Returns whether
    /// audio is playing afterwards.
    ///
    /// # Errors
    ///
    /// Returns `PlaybackError` when the sink cannot resume or replay.
    pub fn toggle(&mut self) -> Result<bool, PlaybackError> {
        let Some(window) = self.window.clone() else {
            return Err(PlaybackError::NoSource);
        };
        if window.expired {
            self.start(&window.url, window.length)?;
        } else if self.playing {
            self.sink.pause();
            self.playing = false;
        } else {
            self.sink.resume()?;
            self.playing = true;
        }
        Ok(self.playing)
    }

    /// Apply an event from the receiver returned by [`PlaybackGate::new`].
    ///
    /// Returns `false` for events of a superseded window.
    pub fn handle(&mut self, event: PlaybackEvent) -> bool {
        let PlaybackEvent::CutOff { generation } = event;
        if generation != self.generation {
            return false;
        }
        self.playing = false;
        if let Some(window) = self.window.as_mut() {
            window.expired = true;
        }
        true
    }

    /// Stop audio and cancel the timers, e.g. once the track is resolved.
    pub fn freeze(&mut self) {
        self.cancel_timers();
        self.generation += 1;
        if self.playing {
            self.sink.stop();
        }
        self.playing = false;
        self.window = None;
    }

    fn spawn_timers(&mut self, length: Duration) {
        let generation = self.generation;
        let sink = Arc::clone(&self.sink);
        let events = self.events.clone();
        self.cutoff = Some(tokio::spawn(async move {
            tokio::time::sleep(length).await;
            sink.stop();
            // The receiver may be gone during shutdown.
            let _ = events.send(PlaybackEvent::CutOff { generation });
        }));

        let elapsed = self.elapsed.clone();
        self.ticker = Some(tokio::spawn(async move {
            let started = Instant::now();
            let mut interval = tokio::time::interval(TICK_INTERVAL);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let so_far = started.elapsed().min(length);
                elapsed.send_replace(so_far);
                if so_far >= length {
                    break;
                }
            }
        }));
    }

    fn cancel_timers(&mut self) {
        if let Some(handle) = self.cutoff.take() {
            handle.abort();
        }
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
    }
}

impl Drop for PlaybackGate {
    fn drop(&mut self) {
        self.cancel_timers();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        calls: Mutex<Vec<String>>,
        fail: bool,
    }

    impl RecordingSink {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn push(&self, call: impl Into<String>) {
            self.calls.lock().unwrap().push(call.into());
        }
    }

    impl AudioSink for RecordingSink {
        fn play_from_start(&self, url: &str) -> Result<(), PlaybackError> {
            if self.fail {
                return Err(PlaybackError::Failed("autoplay blocked".into()));
            }
            self.push(format!("play {url}"));
            Ok(())
        }

        fn pause(&self) {
            self.push("pause");
        }

        fn resume(&self) -> Result<(), PlaybackError> {
            self.push("resume");
            Ok(())
        }

        fn stop(&self) {
            self.push("stop");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cuts_off_after_exactly_the_window() {
        let sink = Arc::new(RecordingSink::default());
        let (mut gate, mut events) = PlaybackGate::new(sink.clone());

        let started = Instant::now();
        gate.start("a.mp3", Duration::from_secs(3)).unwrap();
        let event = events.recv().await.unwrap();

        assert_eq!(started.elapsed(), Duration::from_secs(3));
        assert!(gate.handle(event));
        assert!(!gate.is_playing());
        assert_eq!(sink.calls(), vec!["play a.mp3", "stop"]);
    }

    #[tokio::test(start_paused = true)]
    async fn pausing_does_not_extend_the_cutoff() {
        let sink = Arc::new(RecordingSink::default());
        let (mut gate, mut events) = PlaybackGate::new(sink.clone());
        let started = Instant::now();
        gate.start("a.mp3", Duration::from_secs(5)).unwrap();

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(!gate.toggle().unwrap());
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(gate.toggle().unwrap());

        let event = events.recv().await.unwrap();
        assert_eq!(started.elapsed(), Duration::from_secs(5));
        assert!(gate.handle(event));

        // An expired window replays from zero.
        assert!(gate.toggle().unwrap());
        assert_eq!(
            sink.calls(),
            vec!["play a.mp3", "pause", "resume", "stop", "play a.mp3"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn a_new_window_aborts_the_previous_one() {
        let sink = Arc::new(RecordingSink::default());
        let (mut gate, mut events) = PlaybackGate::new(sink.clone());
        let started = Instant::now();
        gate.start("a.mp3", Duration::from_secs(1)).unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;
        gate.start("a.mp3", Duration::from_secs(3)).unwrap();

        let event = events.recv().await.unwrap();
        assert_eq!(event, PlaybackEvent::CutOff { generation: 2 });
        assert_eq!(started.elapsed(), Duration::from_millis(3_500));
        assert_eq!(sink.calls(), vec!["play a.mp3", "play a.mp3", "stop"]);
    }

    #[tokio::test(start_paused = true)]
    async fn freeze_cancels_the_cutoff() {
        let sink = Arc::new(RecordingSink::default());
        let (mut gate, mut events) = PlaybackGate::new(sink.clone());
        gate.start("a.mp3", Duration::from_secs(1)).unwrap();
        gate.freeze();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(events.try_recv().is_err());
        assert_eq!(sink.calls(), vec!["play a.mp3", "stop"]);
        assert_eq!(gate.toggle(), Err(PlaybackError::NoSource));
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_reports_progress() {
        let sink = Arc::new(RecordingSink::default());
        let (mut gate, _events) = PlaybackGate::new(sink);
        let mut elapsed = gate.elapsed();
        gate.start("a.mp3", Duration::from_secs(1)).unwrap();

        tokio::time::sleep(Duration::from_millis(1_050)).await;
        elapsed.changed().await.unwrap();
        assert_eq!(*elapsed.borrow(), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn failing_sink_leaves_no_window() {
        let sink = Arc::new(RecordingSink {
            fail: true,
            ..RecordingSink::default()
        });
        let (mut gate, _events) = PlaybackGate::new(sink);
        assert!(gate.start("a.mp3", Duration::from_secs(1)).is_err());
        assert!(!gate.is_playing());
        assert_eq!(gate.toggle(), Err(PlaybackError::NoSource));
    }
}
