//! Debounced last-played persistence
//!
//! Transport-affecting operations can arrive in bursts (seek bar
//! drags, rapid toggles). The saver coalesces them on a background
//! task so callers never wait on storage, and only the newest snapshot
//! within the debounce window is written.

use chorus_core::{LastPlayed, StateStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::warn;

/// Fire-and-forget writer for the last-played record
#[derive(Debug, Clone)]
pub(crate) struct Saver {
    tx: mpsc::UnboundedSender<LastPlayed>,
}

impl Saver {
    /// Spawn the background writer task
    pub(crate) fn spawn(store: Arc<dyn StateStore>, debounce: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run(store, rx, debounce));
        Self { tx }
    }

    /// Queue a snapshot for writing; never blocks
    pub(crate) fn save(&self, record: LastPlayed) {
        // Send only fails once the writer task is gone, at teardown.
        let _ = self.tx.send(record);
    }
}

async fn run(
    store: Arc<dyn StateStore>,
    mut rx: mpsc::UnboundedReceiver<LastPlayed>,
    debounce: Duration,
) {
    while let Some(first) = rx.recv().await {
        let mut latest = first;

        // Collapse everything that arrives within the quiet period.
        loop {
            match timeout(debounce, rx.recv()).await {
                Ok(Some(newer)) => latest = newer,
                Ok(None) => {
                    write(&store, &latest).await;
                    return;
                }
                Err(_) => break,
            }
        }

        write(&store, &latest).await;
    }
}

async fn write(store: &Arc<dyn StateStore>, record: &LastPlayed) {
    if let Err(e) = store.save_last_played(record).await {
        warn!("Failed to save last-played state: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chorus_core::{ChorusError, Result, Track};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingStore {
        writes: Mutex<Vec<LastPlayed>>,
    }

    #[async_trait::async_trait]
    impl StateStore for RecordingStore {
        async fn load_last_played(&self) -> Result<Option<LastPlayed>> {
            Ok(self.writes.lock().unwrap().last().cloned())
        }

        async fn save_last_played(&self, record: &LastPlayed) -> Result<()> {
            self.writes.lock().unwrap().push(record.clone());
            Ok(())
        }

        async fn load_queue(&self) -> Result<Vec<Track>> {
            Ok(Vec::new())
        }

        async fn save_queue(&self, _tracks: &[Track]) -> Result<()> {
            Ok(())
        }

        async fn load_room_id(&self) -> Result<Option<String>> {
            Ok(None)
        }

        async fn save_room_id(&self, _room_id: &str) -> Result<()> {
            Err(ChorusError::storage("not supported"))
        }

        async fn clear_room_id(&self) -> Result<()> {
            Ok(())
        }
    }

    fn record(position_ms: u64) -> LastPlayed {
        LastPlayed {
            track: Track::new("t1", "Song", "Artist", "url"),
            position_ms,
            is_playing: true,
        }
    }

    #[tokio::test]
    async fn burst_collapses_to_newest_write() {
        let store = Arc::new(RecordingStore::default());
        let saver = Saver::spawn(store.clone(), Duration::from_millis(20));

        saver.save(record(100));
        saver.save(record(200));
        saver.save(record(300));

        tokio::time::sleep(Duration::from_millis(120)).await;

        let writes = store.writes.lock().unwrap();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].position_ms, 300);
    }

    #[tokio::test]
    async fn separated_saves_each_land() {
        let store = Arc::new(RecordingStore::default());
        let saver = Saver::spawn(store.clone(), Duration::from_millis(10));

        saver.save(record(100));
        tokio::time::sleep(Duration::from_millis(60)).await;
        saver.save(record(200));
        tokio::time::sleep(Duration::from_millis(60)).await;

        let writes = store.writes.lock().unwrap();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[1].position_ms, 200);
    }
}
