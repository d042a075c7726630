//! SQLite-backed state store
//!
//! Persists the last-played record, the queue, and the active room id
//! as JSON documents in a single keyed table. Documents are small and
//! written whole; last writer wins.

use crate::error::{Result, StorageError};
use async_trait::async_trait;
use chorus_core::{LastPlayed, StateStore, Track};
use sqlx::{Row, SqlitePool};

const KEY_LAST_PLAYED: &str = "last_played";
const KEY_QUEUE: &str = "queue";
const KEY_ROOM_ID: &str = "room_id";

/// [`StateStore`] implementation over a `SQLite` pool
#[derive(Debug, Clone)]
pub struct SqliteStateStore {
    pool: SqlitePool,
}

impl SqliteStateStore {
    /// Wrap an already-migrated pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM app_state WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(Some(row.try_get("value").map_err(StorageError::from)?)),
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query(
            "INSERT INTO app_state (key, value, updated_at)
             VALUES (?, ?, ?)
             ON CONFLICT(key)
             DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM app_state WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl StateStore for SqliteStateStore {
    async fn load_last_played(&self) -> chorus_core::Result<Option<LastPlayed>> {
        match self.get(KEY_LAST_PLAYED).await? {
            Some(json) => {
                let record = serde_json::from_str(&json).map_err(StorageError::from)?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    async fn save_last_played(&self, record: &LastPlayed) -> chorus_core::Result<()> {
        let json = serde_json::to_string(record).map_err(StorageError::from)?;
        self.put(KEY_LAST_PLAYED, &json).await?;
        Ok(())
    }

    async fn load_queue(&self) -> chorus_core::Result<Vec<Track>> {
        match self.get(KEY_QUEUE).await? {
            Some(json) => {
                let tracks = serde_json::from_str(&json).map_err(StorageError::from)?;
                Ok(tracks)
            }
            None => Ok(Vec::new()),
        }
    }

    async fn save_queue(&self, tracks: &[Track]) -> chorus_core::Result<()> {
        let json = serde_json::to_string(tracks).map_err(StorageError::from)?;
        self.put(KEY_QUEUE, &json).await?;
        Ok(())
    }

    async fn load_room_id(&self) -> chorus_core::Result<Option<String>> {
        Ok(self.get(KEY_ROOM_ID).await?)
    }

    async fn save_room_id(&self, room_id: &str) -> chorus_core::Result<()> {
        self.put(KEY_ROOM_ID, room_id).await?;
        Ok(())
    }

    async fn clear_room_id(&self) -> chorus_core::Result<()> {
        self.delete(KEY_ROOM_ID).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_pool, run_migrations};
    use tempfile::TempDir;

    async fn store() -> (TempDir, SqliteStateStore) {
        let dir = TempDir::new().unwrap();
        let url = format!("sqlite://{}", dir.path().join("chorus.db").display());
        let pool = create_pool(&url).await.unwrap();
        run_migrations(&pool).await.unwrap();
        (dir, SqliteStateStore::new(pool))
    }

    fn track(id: &str) -> Track {
        Track::new(id, format!("Track {id}"), "Artist", format!("https://cdn.example/{id}.mp3"))
    }

    #[tokio::test]
    async fn empty_store_loads_nothing() {
        let (_dir, store) = store().await;

        assert!(store.load_last_played().await.unwrap().is_none());
        assert!(store.load_queue().await.unwrap().is_empty());
        assert!(store.load_room_id().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn last_played_round_trips() {
        let (_dir, store) = store().await;
        let record = LastPlayed {
            track: track("t1"),
            position_ms: 42_000,
            is_playing: true,
        };

        store.save_last_played(&record).await.unwrap();
        let loaded = store.load_last_played().await.unwrap().unwrap();

        assert_eq!(loaded.track.id, "t1");
        assert_eq!(loaded.position_ms, 42_000);
        assert!(loaded.is_playing);
    }

    #[tokio::test]
    async fn newer_last_played_overwrites_older() {
        let (_dir, store) = store().await;

        store
            .save_last_played(&LastPlayed {
                track: track("t1"),
                position_ms: 1_000,
                is_playing: true,
            })
            .await
            .unwrap();
        store
            .save_last_played(&LastPlayed {
                track: track("t2"),
                position_ms: 2_000,
                is_playing: false,
            })
            .await
            .unwrap();

        let loaded = store.load_last_played().await.unwrap().unwrap();
        assert_eq!(loaded.track.id, "t2");
        assert!(!loaded.is_playing);
    }

    #[tokio::test]
    async fn queue_is_saved_wholesale_in_order() {
        let (_dir, store) = store().await;

        store
            .save_queue(&[track("a"), track("b"), track("c")])
            .await
            .unwrap();
        store.save_queue(&[track("c"), track("a")]).await.unwrap();

        let ids: Vec<String> = store
            .load_queue()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, ["c", "a"]);
    }

    #[tokio::test]
    async fn room_id_saves_and_clears() {
        let (_dir, store) = store().await;

        store.save_room_id("room-42").await.unwrap();
        assert_eq!(store.load_room_id().await.unwrap().as_deref(), Some("room-42"));

        store.clear_room_id().await.unwrap();
        assert!(store.load_room_id().await.unwrap().is_none());

        // Clearing an already-clear id is fine
        store.clear_room_id().await.unwrap();
    }
}
