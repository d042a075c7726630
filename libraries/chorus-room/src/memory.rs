//! In-memory mirror store
//!
//! Store semantics match the hosted document store: subscribers get
//! the current value immediately, then every subsequent write, and
//! writes overwrite the document wholesale. Used in tests and for
//! single-process demos.

use crate::error::Result;
use crate::store::{MirrorStore, Subscription};
use crate::types::MirrorDocument;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::{broadcast, mpsc, Mutex};
use tracing::warn;

struct RoomSlot {
    document: Option<MirrorDocument>,
    updates: broadcast::Sender<MirrorDocument>,
}

impl RoomSlot {
    fn new() -> Self {
        let (updates, _) = broadcast::channel(64);
        Self {
            document: None,
            updates,
        }
    }
}

/// [`MirrorStore`] held entirely in memory
#[derive(Default)]
pub struct MemoryMirrorStore {
    rooms: Mutex<HashMap<String, RoomSlot>>,
}

impl MemoryMirrorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current document of a room, if any (test helper)
    pub async fn document(&self, room_id: &str) -> Option<MirrorDocument> {
        self.rooms
            .lock()
            .await
            .get(room_id)
            .and_then(|slot| slot.document.clone())
    }
}

#[async_trait]
impl MirrorStore for MemoryMirrorStore {
    async fn write(&self, room_id: &str, document: &MirrorDocument) -> Result<()> {
        let mut rooms = self.rooms.lock().await;
        let slot = rooms.entry(room_id.to_string()).or_insert_with(RoomSlot::new);
        slot.document = Some(document.clone());
        // No subscribers is fine
        let _ = slot.updates.send(document.clone());
        Ok(())
    }

    async fn subscribe(&self, room_id: &str) -> Result<Subscription> {
        let (tx, rx) = mpsc::unbounded_channel();

        let mut source = {
            let mut rooms = self.rooms.lock().await;
            let slot = rooms.entry(room_id.to_string()).or_insert_with(RoomSlot::new);
            if let Some(document) = &slot.document {
                // Initial value, like a hosted store's first callback
                let _ = tx.send(document.clone());
            }
            slot.updates.subscribe()
        };

        tokio::spawn(async move {
            loop {
                match source.recv().await {
                    Ok(document) => {
                        if tx.send(document).is_err() {
                            // Subscriber dropped: unsubscribe
                            return;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Mirror subscriber lagged, skipping updates");
                    }
                    Err(broadcast::error::RecvError::Closed) => return,
                }
            }
        });

        Ok(Subscription::new(rx))
    }
}
