use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;

use super::SqliteRepository;
use crate::repository::{KeyValueStore, StorageError};

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl KeyValueStore for SqliteRepository {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let row = sqlx::query("SELECT value FROM kv_entries WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };
        row.try_get::<String, _>("value")
            .map(Some)
            .map_err(|err| StorageError::Serialization(err.to_string()))
    }

    async fn write_batch(&self, entries: &[(&str, Option<String>)]) -> Result<(), StorageError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(conn)?;

        for (key, value) in entries {
            match value {
                Some(value) => {
                    sqlx::query(
                        r"
                        INSERT INTO kv_entries (key, value, updated_at)
                        VALUES (?1, ?2, ?3)
                        ON CONFLICT(key) DO UPDATE SET
                            value = excluded.value,
                            updated_at = excluded.updated_at
                        ",
                    )
                    .bind(*key)
                    .bind(value.as_str())
                    .bind(now)
                    .execute(&mut *tx)
                    .await
                    .map_err(conn)?;
                }
                None => {
                    sqlx::query("DELETE FROM kv_entries WHERE key = ?1")
                        .bind(*key)
                        .execute(&mut *tx)
                        .await
                        .map_err(conn)?;
                }
            }
        }

        tx.commit().await.map_err(conn)
    }
}
