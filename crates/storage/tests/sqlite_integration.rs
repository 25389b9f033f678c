use std::sync::Arc;

use chrono::Duration;
use kviz_core::DayKey;
use kviz_core::model::{Resolution, Track};
use kviz_core::quota::DailyProgress;
use kviz_core::time::{fixed_now, utc_offset};
use storage::layout::{ALL_KEYS, GUESSED_TRACKS, LAST_PLAYED_DATE, PLAYED_TRACKS_COUNT};
use storage::sqlite::SqliteRepository;
use storage::{KeyValueStore, ProgressRepository, ProgressStore, Storage};

fn track(artist: &str, name: &str) -> Track {
    Track::new(artist, name, None, "").unwrap()
}

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn sqlite_round_trips_daily_progress() {
    let repo = connect("memdb_progress_roundtrip").await;
    let store = ProgressStore::new(Arc::new(repo));

    let now = fixed_now();
    let mut progress = DailyProgress::default();
    progress.check_day_rollover(DayKey::from_instant(now, utc_offset()));
    progress
        .record(Resolution::incorrect(&track("Coby", "Rambo")))
        .unwrap();
    progress
        .record(Resolution::correct(&track("Teodora", "Drama")))
        .unwrap();
    progress.set_cooldown_until(Some(now + Duration::hours(3)));

    store.save(&progress.snapshot()).await.unwrap();
    let loaded = store.load().await.unwrap().expect("stored progress");
    let restored = DailyProgress::from_snapshot(5, loaded).unwrap();

    assert_eq!(restored, progress);
    assert_eq!(restored.correct_count(), 1);
    assert_eq!(restored.resolutions()[0].name(), "Rambo");
}

#[tokio::test]
async fn sqlite_batch_overwrites_and_removes_keys() {
    let repo = connect("memdb_kv_batch").await;

    repo.write_batch(&[
        (LAST_PLAYED_DATE, Some("14.11.2023.".to_string())),
        (PLAYED_TRACKS_COUNT, Some("1".to_string())),
    ])
    .await
    .unwrap();
    repo.write_batch(&[
        (PLAYED_TRACKS_COUNT, Some("2".to_string())),
        (LAST_PLAYED_DATE, None),
    ])
    .await
    .unwrap();

    assert_eq!(repo.get(LAST_PLAYED_DATE).await.unwrap(), None);
    assert_eq!(
        repo.get(PLAYED_TRACKS_COUNT).await.unwrap().as_deref(),
        Some("2")
    );
}

#[tokio::test]
async fn sqlite_reads_values_written_by_the_three_key_layout() {
    let repo = connect("memdb_legacy_layout").await;
    repo.write_batch(&[
        (LAST_PLAYED_DATE, Some("14. 11. 2023.".to_string())),
        (
            GUESSED_TRACKS,
            Some(r#"["senidah - beli svemir","coby - rambo"]"#.to_string()),
        ),
        (PLAYED_TRACKS_COUNT, Some("2".to_string())),
    ])
    .await
    .unwrap();

    let store = ProgressStore::new(Arc::new(repo));
    let snapshot = store.load().await.unwrap().expect("legacy progress");
    let progress = DailyProgress::from_snapshot(5, snapshot).unwrap();
    assert_eq!(progress.played_count(), 2);
    assert_eq!(progress.correct_count(), 0);
    assert!(progress.is_resolved(&track("Coby", "Rambo").key()));
}

#[tokio::test]
async fn sqlite_storage_clear_and_reconnect() {
    let url = "sqlite:file:memdb_storage_clear?mode=memory&cache=shared";
    let storage = Storage::sqlite(url).await.expect("storage");
    let mut progress = DailyProgress::default();
    progress.check_day_rollover(DayKey::from_instant(fixed_now(), utc_offset()));
    progress
        .record(Resolution::correct(&track("Zera", "Do zore")))
        .unwrap();
    storage.progress.save(&progress.snapshot()).await.unwrap();

    // Migrations are idempotent on an existing database.
    let again = SqliteRepository::connect(url).await.unwrap();
    again.migrate().await.unwrap();
    assert!(again.get(GUESSED_TRACKS).await.unwrap().is_some());

    storage.progress.clear().await.unwrap();
    for key in ALL_KEYS {
        assert_eq!(again.get(key).await.unwrap(), None, "{key}");
    }
    assert!(storage.progress.load().await.unwrap().is_none());
}
