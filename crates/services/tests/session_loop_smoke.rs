use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use kviz_core::model::{DailyPlaylist, Track};
use kviz_core::quota::DailyProgress;
use kviz_core::time::{fixed_now, utc_offset};
use rand::SeedableRng;
use rand::rngs::StdRng;
use services::providers::{StaticTrackProvider, TrackProvider};
use services::{
    AttemptStep, Clock, GuessOutcome, ProviderError, QuizLoopService, QuizPhase, QuizRules,
    SessionError,
};
use storage::layout::{GUESSED_TRACKS, LAST_PLAYED_DATE, PLAYED_TRACKS_COUNT};
use storage::repository::{InMemoryKeyValueStore, KeyValueStore, ProgressRepository, ProgressStore};

fn track(artist: &str, name: &str) -> Track {
    Track::new(
        artist,
        name,
        Some(format!("https://cdn.example/{}.mp3", name.replace(' ', "-"))),
        "https://cdn.example/cover.jpg",
    )
    .unwrap()
}

fn friday() -> Vec<Track> {
    vec![
        track("Edita", "Slobodno me rani"),
        track("Sloba Radanović", "Zauvek"),
        track("Igor Garnier", "We Let It Go"),
        track("Zera", "Do zore"),
        track("Tanja Savić", "Suknjica"),
    ]
}

/// Serves the playlist once, then behaves like an unreachable service.
struct FailsAfterFirstFetch {
    playlist: DailyPlaylist,
    calls: AtomicUsize,
}

#[async_trait]
impl TrackProvider for FailsAfterFirstFetch {
    async fn today(&self) -> Result<DailyPlaylist, ProviderError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            Ok(self.playlist.clone())
        } else {
            Err(ProviderError::Remote("service unavailable".into()))
        }
    }
}

async fn resolve_by_skipping(service: &QuizLoopService, session: &mut services::QuizSession) {
    while matches!(session.phase(), QuizPhase::Listening { .. }) {
        service.skip(session).await.unwrap();
    }
}

struct Fixture {
    kv: Arc<InMemoryKeyValueStore>,
    store: Arc<ProgressStore>,
    service: QuizLoopService,
}

fn fixture() -> Fixture {
    let kv = Arc::new(InMemoryKeyValueStore::new());
    let store = Arc::new(ProgressStore::new(kv.clone()));
    let playlist = DailyPlaylist::new(
        friday(),
        "petak",
        Some(fixed_now() + Duration::hours(1)),
    )
    .unwrap();
    let tracks: Arc<dyn TrackProvider> = Arc::new(StaticTrackProvider::new(playlist));
    let service = QuizLoopService::new(
        Clock::fixed(fixed_now()),
        utc_offset(),
        QuizRules::default(),
        tracks,
        store.clone(),
    );
    Fixture { kv, store, service }
}

#[tokio::test]
async fn full_day_ends_with_three_of_five() {
    let Fixture { store, service, .. } = fixture();
    let mut session = service
        .start_session_with_rng(StdRng::seed_from_u64(11))
        .await
        .unwrap();

    let mut expected = Vec::new();
    for n in 0..5 {
        let current = session.current_track().cloned().expect("a track to play");
        if n % 2 == 0 {
            let guess = format!("{} - {}", current.name(), current.artist());
            let outcome = service.submit_guess(&mut session, &guess).await.unwrap();
            assert!(matches!(outcome, GuessOutcome::Correct { .. }));
            expected.push((current.key(), true));
        } else {
            loop {
                match service.skip(&mut session).await.unwrap() {
                    AttemptStep::Advanced { .. } => {}
                    AttemptStep::Resolved { .. } => break,
                }
            }
            expected.push((current.key(), false));
        }
        service.next_track(&mut session).unwrap();
    }

    assert_eq!(session.phase(), QuizPhase::QuotaUsed);
    let stored = store.load().await.unwrap().expect("saved progress");
    let restored = DailyProgress::from_snapshot(5, stored).unwrap();
    assert_eq!(restored.played_count(), 5);
    assert_eq!(restored.correct_count(), 3);
    let order: Vec<_> = restored
        .resolutions()
        .iter()
        .map(|r| (r.key().clone(), r.is_correct()))
        .collect();
    assert_eq!(order, expected);
    assert_eq!(
        restored.cooldown_until(),
        Some(fixed_now() + Duration::hours(1))
    );

    // A reload keeps the quota closed until the cooldown passes.
    let reloaded = service
        .start_session_with_rng(StdRng::seed_from_u64(12))
        .await
        .unwrap();
    assert_eq!(reloaded.phase(), QuizPhase::QuotaUsed);
    assert_eq!(
        reloaded.countdown(fixed_now()).as_deref(),
        Some("01:00:00")
    );

    let later = service
        .clone()
        .with_clock(Clock::fixed(fixed_now() + Duration::minutes(61)));
    let mut reopened = later
        .start_session_with_rng(StdRng::seed_from_u64(13))
        .await
        .unwrap();
    assert!(matches!(reopened.phase(), QuizPhase::Listening { index: 0 }));
    assert!(!later.poll_cooldown(&mut reopened).await.unwrap());
}

#[tokio::test]
async fn wrong_guess_advances_without_counting_as_played() {
    let Fixture { store, service, .. } = fixture();
    let mut session = service
        .start_session_with_rng(StdRng::seed_from_u64(3))
        .await
        .unwrap();

    let outcome = service.submit_guess(&mut session, "Inas - Karmin").await.unwrap();
    assert!(matches!(
        outcome,
        GuessOutcome::Rejected {
            shake: true,
            step: Some(AttemptStep::Advanced { index: 1, .. })
        }
    ));
    assert_eq!(service.submit_guess(&mut session, "  ").await.unwrap(), GuessOutcome::Empty);
    assert!(matches!(
        service.next_track(&mut session),
        Err(SessionError::InProgress)
    ));

    let stored = store.load().await.unwrap().unwrap();
    assert_eq!(stored.played_count, 0);
    assert_eq!(stored.last_played_date, Some(kviz_core::DayKey::from_instant(fixed_now(), utc_offset())));
}

#[tokio::test]
async fn legacy_progress_from_today_is_respected() {
    let Fixture { kv, service, .. } = fixture();
    kv.write_batch(&[
        (LAST_PLAYED_DATE, Some("14.11.2023.".to_string())),
        (GUESSED_TRACKS, Some(r#"["zera - do zore"]"#.to_string())),
        (PLAYED_TRACKS_COUNT, Some("1".to_string())),
    ])
    .await
    .unwrap();

    for seed in 0..5 {
        let session = service
            .start_session_with_rng(StdRng::seed_from_u64(seed))
            .await
            .unwrap();
        assert_eq!(session.progress().played_count(), 1);
        assert_ne!(session.current_track().map(Track::name), Some("Do zore"));
        let first = &session.progress().resolutions()[0];
        assert_eq!((first.artist(), first.name()), ("Zera", "Do zore"));
    }
}

#[tokio::test]
async fn inconsistent_progress_starts_fresh() {
    let Fixture { kv, service, .. } = fixture();
    kv.write_batch(&[
        (LAST_PLAYED_DATE, Some("14.11.2023.".to_string())),
        (GUESSED_TRACKS, Some(r#"["zera - do zore"]"#.to_string())),
        (PLAYED_TRACKS_COUNT, Some("4".to_string())),
    ])
    .await
    .unwrap();

    let session = service.start_session().await.unwrap();
    assert_eq!(session.progress().played_count(), 0);
    assert_eq!(
        kv.get(PLAYED_TRACKS_COUNT).await.unwrap().as_deref(),
        Some("0")
    );

    kv.write_batch(&[(PLAYED_TRACKS_COUNT, Some("many".to_string()))])
        .await
        .unwrap();
    let session = service.start_session().await.unwrap();
    assert_eq!(session.progress().played_count(), 0);
}

#[tokio::test]
async fn stored_progress_from_yesterday_is_discarded() {
    let Fixture { kv, service, .. } = fixture();
    kv.write_batch(&[
        (LAST_PLAYED_DATE, Some("13.11.2023.".to_string())),
        (GUESSED_TRACKS, Some(r#"["zera - do zore"]"#.to_string())),
        (PLAYED_TRACKS_COUNT, Some("1".to_string())),
    ])
    .await
    .unwrap();

    let session = service.start_session().await.unwrap();
    assert_eq!(session.progress().played_count(), 0);
    assert_eq!(
        kv.get(LAST_PLAYED_DATE).await.unwrap().as_deref(),
        Some("14.11.2023.")
    );
}

#[tokio::test]
async fn day_change_resets_and_reloads() {
    let Fixture { service, store, .. } = fixture();
    let mut session = service
        .start_session_with_rng(StdRng::seed_from_u64(5))
        .await
        .unwrap();
    while matches!(session.phase(), QuizPhase::Listening { .. }) {
        service.skip(&mut session).await.unwrap();
    }
    assert_eq!(session.progress().played_count(), 1);
    assert!(!service.poll_day_change(&mut session).await.unwrap());

    let tomorrow = service
        .clone()
        .with_clock(Clock::fixed(fixed_now() + Duration::days(1)));
    assert!(tomorrow.poll_day_change(&mut session).await.unwrap());
    assert_eq!(session.progress().played_count(), 0);
    assert!(matches!(session.phase(), QuizPhase::Listening { index: 0 }));
    assert_eq!(store.load().await.unwrap().unwrap().played_count, 0);
    // The fixture's cooldown belongs to yesterday, so the next midnight is used.
    assert_eq!(
        session.cooldown_until(),
        Utc.with_ymd_and_hms(2023, 11, 16, 0, 0, 0).unwrap()
    );
}

#[tokio::test]
async fn failed_fetch_on_a_new_day_keeps_tracks_and_a_future_cooldown() {
    let store = Arc::new(ProgressStore::new(Arc::new(InMemoryKeyValueStore::new())));
    let playlist = DailyPlaylist::new(friday(), "petak", None).unwrap();
    let tracks: Arc<dyn TrackProvider> = Arc::new(FailsAfterFirstFetch {
        playlist,
        calls: AtomicUsize::new(0),
    });
    let service = QuizLoopService::new(
        Clock::fixed(fixed_now()),
        utc_offset(),
        QuizRules::default(),
        tracks,
        store.clone(),
    );
    let mut session = service
        .start_session_with_rng(StdRng::seed_from_u64(21))
        .await
        .unwrap();
    resolve_by_skipping(&service, &mut session).await;
    assert_eq!(session.progress().played_count(), 1);

    let tomorrow = service
        .clone()
        .with_clock(Clock::fixed(fixed_now() + Duration::days(1)));
    assert!(tomorrow.poll_day_change(&mut session).await.unwrap());
    assert_eq!(session.progress().played_count(), 0);
    assert_eq!(session.day(), "petak");
    let kept: Vec<_> = session.tracks().iter().map(Track::key).collect();
    let expected: Vec<_> = friday().iter().map(Track::key).collect();
    assert_eq!(kept, expected);

    let now = tomorrow.clock().now();
    let midnight = Utc.with_ymd_and_hms(2023, 11, 16, 0, 0, 0).unwrap();
    assert!(session.cooldown_until() > now);
    assert_eq!(session.cooldown_until(), midnight);

    for _ in 0..5 {
        resolve_by_skipping(&tomorrow, &mut session).await;
        tomorrow.next_track(&mut session).unwrap();
    }
    assert_eq!(session.phase(), QuizPhase::QuotaUsed);
    assert_eq!(session.progress().cooldown_until(), Some(midnight));

    // The quota stays closed for the rest of the day.
    assert!(!tomorrow.poll_cooldown(&mut session).await.unwrap());
    assert_eq!(session.phase(), QuizPhase::QuotaUsed);
    let stored = store.load().await.unwrap().unwrap();
    assert_eq!(stored.played_count, 5);
    assert_eq!(stored.cooldown_until, Some(midnight));
}

#[tokio::test]
async fn reset_clears_storage() {
    let Fixture { store, service, .. } = fixture();
    service.start_session().await.unwrap();
    assert!(store.load().await.unwrap().is_some());
    service.reset().await.unwrap();
    assert!(store.load().await.unwrap().is_none());
}
