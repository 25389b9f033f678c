use async_trait::async_trait;
use kviz_core::quota::ProgressSnapshot;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::layout::{ALL_KEYS, ProgressRecord};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// String key/value storage, the shape of browser local storage.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a single value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Apply a batch of writes at once; `None` removes the key.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the batch cannot be stored.
    async fn write_batch(&self, entries: &[(&str, Option<String>)]) -> Result<(), StorageError>;
}

/// Persistence contract for the daily progress of the quiz.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Load stored progress, `None` on a first visit.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` for an unreadable layout, or other storage errors.
    async fn load(&self) -> Result<Option<ProgressSnapshot>, StorageError>;

    /// Replace stored progress with `snapshot`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the progress cannot be stored.
    async fn save(&self, snapshot: &ProgressSnapshot) -> Result<(), StorageError>;

    /// Remove every progress key.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the keys cannot be removed.
    async fn clear(&self) -> Result<(), StorageError>;
}

/// Simple in-memory key/value store for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryKeyValueStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryKeyValueStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    async fn write_batch(&self, entries: &[(&str, Option<String>)]) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        for (key, value) in entries {
            match value {
                Some(value) => {
                    guard.insert((*key).to_string(), value.clone());
                }
                None => {
                    guard.remove(*key);
                }
            }
        }
        Ok(())
    }
}

/// `ProgressRepository` over any key/value backend, using the `layout` keys.
#[derive(Clone)]
pub struct ProgressStore {
    kv: Arc<dyn KeyValueStore>,
}

impl ProgressStore {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    async fn read_record(&self) -> Result<ProgressRecord, StorageError> {
        use crate::layout::{
            COOLDOWN_UNTIL, CORRECT_TRACKS_COUNT, GUESSED_TRACKS, LAST_PLAYED_DATE,
            PLAYED_TRACKS_COUNT, RESOLUTION_ORDER,
        };

        Ok(ProgressRecord {
            last_played_date: self.kv.get(LAST_PLAYED_DATE).await?,
            guessed_tracks: self.kv.get(GUESSED_TRACKS).await?,
            played_tracks_count: self.kv.get(PLAYED_TRACKS_COUNT).await?,
            correct_tracks_count: self.kv.get(CORRECT_TRACKS_COUNT).await?,
            resolution_order: self.kv.get(RESOLUTION_ORDER).await?,
            cooldown_until: self.kv.get(COOLDOWN_UNTIL).await?,
        })
    }
}

#[async_trait]
impl ProgressRepository for ProgressStore {
    async fn load(&self) -> Result<Option<ProgressSnapshot>, StorageError> {
        let record = self.read_record().await?;
        if record.is_empty() {
            return Ok(None);
        }
        record.into_snapshot().map(Some)
    }

    async fn save(&self, snapshot: &ProgressSnapshot) -> Result<(), StorageError> {
        let entries = ProgressRecord::from_snapshot(snapshot)?.into_entries();
        self.kv.write_batch(&entries).await?;
        tracing::debug!(
            played = snapshot.played_count,
            resolved = snapshot.resolved.len(),
            "progress saved"
        );
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let entries: Vec<(&str, Option<String>)> =
            ALL_KEYS.iter().map(|key| (*key, None)).collect();
        self.kv.write_batch(&entries).await
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_key_value(Arc::new(InMemoryKeyValueStore::new()))
    }

    #[must_use]
    pub fn from_key_value(kv: Arc<dyn KeyValueStore>) -> Self {
        let progress: Arc<dyn ProgressRepository> = Arc::new(ProgressStore::new(kv));
        Self { progress }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{GUESSED_TRACKS, LAST_PLAYED_DATE, PLAYED_TRACKS_COUNT};
    use kviz_core::model::{Resolution, Track};
    use kviz_core::quota::DailyProgress;
    use kviz_core::time::{fixed_now, utc_offset};
    use kviz_core::DayKey;

    fn progress_with_one_guess() -> DailyProgress {
        let mut progress = DailyProgress::default();
        progress.check_day_rollover(DayKey::from_instant(fixed_now(), utc_offset()));
        let track = Track::new("Senidah", "Beli svemir", None, "").unwrap();
        progress.record(Resolution::correct(&track)).unwrap();
        progress
    }

    #[tokio::test]
    async fn first_visit_loads_nothing() {
        let storage = Storage::in_memory();
        assert!(storage.progress.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn round_trips_progress() {
        let storage = Storage::in_memory();
        let progress = progress_with_one_guess();
        storage.progress.save(&progress.snapshot()).await.unwrap();

        let loaded = storage.progress.load().await.unwrap().unwrap();
        let restored = DailyProgress::from_snapshot(5, loaded).unwrap();
        assert_eq!(restored, progress);
    }

    #[tokio::test]
    async fn reads_the_three_key_layout() {
        let kv = InMemoryKeyValueStore::new();
        kv.write_batch(&[
            (LAST_PLAYED_DATE, Some("14. 11. 2023.".to_string())),
            (GUESSED_TRACKS, Some(r#"["Zera - Do zore"]"#.to_string())),
            (PLAYED_TRACKS_COUNT, Some("1".to_string())),
        ])
        .await
        .unwrap();

        let store = ProgressStore::new(Arc::new(kv));
        let snapshot = store.load().await.unwrap().unwrap();
        assert_eq!(snapshot.played_count, 1);
        assert_eq!(snapshot.resolved[0].as_str(), "zera - do zore");
        assert_eq!(snapshot.resolution_order, None);
        assert_eq!(
            snapshot.last_played_date,
            Some(DayKey::from_instant(fixed_now(), utc_offset()))
        );
    }

    #[tokio::test]
    async fn clear_removes_every_key() {
        let kv = Arc::new(InMemoryKeyValueStore::new());
        let store = ProgressStore::new(kv.clone());
        store
            .save(&progress_with_one_guess().snapshot())
            .await
            .unwrap();
        store.clear().await.unwrap();

        for key in ALL_KEYS {
            assert_eq!(kv.get(key).await.unwrap(), None, "{key}");
        }
        assert!(store.load().await.unwrap().is_none());
    }
}
