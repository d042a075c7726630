//! In-memory state store
//!
//! Drop-in [`StateStore`] for tests and ephemeral sessions; nothing
//! survives the process.

use async_trait::async_trait;
use chorus_core::{LastPlayed, Result, StateStore, Track};
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct State {
    last_played: Option<LastPlayed>,
    queue: Vec<Track>,
    room_id: Option<String>,
}

/// [`StateStore`] held entirely in memory
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    state: Mutex<State>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn load_last_played(&self) -> Result<Option<LastPlayed>> {
        Ok(self.state.lock().await.last_played.clone())
    }

    async fn save_last_played(&self, record: &LastPlayed) -> Result<()> {
        self.state.lock().await.last_played = Some(record.clone());
        Ok(())
    }

    async fn load_queue(&self) -> Result<Vec<Track>> {
        Ok(self.state.lock().await.queue.clone())
    }

    async fn save_queue(&self, tracks: &[Track]) -> Result<()> {
        self.state.lock().await.queue = tracks.to_vec();
        Ok(())
    }

    async fn load_room_id(&self) -> Result<Option<String>> {
        Ok(self.state.lock().await.room_id.clone())
    }

    async fn save_room_id(&self, room_id: &str) -> Result<()> {
        self.state.lock().await.room_id = Some(room_id.to_string());
        Ok(())
    }

    async fn clear_room_id(&self) -> Result<()> {
        self.state.lock().await.room_id = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn queue_round_trips() {
        let store = MemoryStateStore::new();
        let tracks = vec![Track::new("a", "A", "Artist", "https://cdn.example/a.mp3")];

        store.save_queue(&tracks).await.unwrap();
        let loaded = store.load_queue().await.unwrap();

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "a");
    }

    #[tokio::test]
    async fn room_id_clears() {
        let store = MemoryStateStore::new();

        store.save_room_id("r1").await.unwrap();
        store.clear_room_id().await.unwrap();

        assert!(store.load_room_id().await.unwrap().is_none());
    }
}
