//! Room synchronization actor
//!
//! [`RoomSync`] keeps the local transport and a room's mirror document
//! converging: local mutations are pushed to the store wholesale, and
//! remote updates are reconciled back into the transport. At most one
//! room is joined at a time; joining another leaves the first.
//!
//! Both directions are advisory last-writer-wins. Remote play/seek
//! corrections go through the controller's non-publishing `sync_*`
//! paths to avoid write feedback loops; the seek deadband dampens the
//! rest.

use crate::error::Result;
use crate::reconcile::{self, RemoteAction};
use crate::store::MirrorStore;
use crate::types::MirrorDocument;
use chorus_core::StateStore;
use chorus_playback::{Controller, StatePublisher, TransportSnapshot};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Forwards snapshots from the player to the push task without
/// blocking inside the player lock
struct Publisher {
    tx: mpsc::UnboundedSender<TransportSnapshot>,
}

impl StatePublisher for Publisher {
    fn publish(&self, snapshot: TransportSnapshot) {
        // Fails only after leave(); the snapshot is then irrelevant
        let _ = self.tx.send(snapshot);
    }
}

struct ActiveRoom {
    room_id: String,
    push_task: JoinHandle<()>,
    apply_task: JoinHandle<()>,
}

/// Bidirectional mirror between the transport and one room document
pub struct RoomSync {
    controller: Controller,
    mirror: Arc<dyn MirrorStore>,
    store: Arc<dyn StateStore>,
    active: Mutex<Option<ActiveRoom>>,
}

impl RoomSync {
    /// Create a synchronizer over an existing controller
    pub fn new(
        controller: Controller,
        mirror: Arc<dyn MirrorStore>,
        store: Arc<dyn StateStore>,
    ) -> Self {
        Self {
            controller,
            mirror,
            store,
            active: Mutex::new(None),
        }
    }

    /// Join a room, leaving any previously joined one
    ///
    /// Subscribes to the room's document, registers the snapshot
    /// publisher on the controller, and persists the room id so the
    /// UI can offer rejoin after a restart.
    pub async fn join(&self, room_id: &str) -> Result<()> {
        // Hold the slot for the whole join; concurrent join/leave
        // calls serialize here, so a torn-down room can never leak
        // its tasks
        let mut active = self.active.lock().await;
        if let Some(previous) = active.take() {
            self.teardown(previous).await;
        }

        let mut subscription = self.mirror.subscribe(room_id).await?;

        let (tx, mut snapshots) = mpsc::unbounded_channel();
        self.controller
            .set_publisher(Some(Arc::new(Publisher { tx })))
            .await;

        let mirror = Arc::clone(&self.mirror);
        let push_room = room_id.to_string();
        let push_task = tokio::spawn(async move {
            while let Some(snapshot) = snapshots.recv().await {
                let document = MirrorDocument::from_snapshot(&snapshot);
                if let Err(e) = mirror.write(&push_room, &document).await {
                    warn!(room = %push_room, "Failed to push state to room: {e}");
                }
            }
        });

        let controller = self.controller.clone();
        let apply_room = room_id.to_string();
        let apply_task = tokio::spawn(async move {
            while let Some(document) = subscription.recv().await {
                let snapshot = controller.snapshot().await;
                for action in reconcile::plan(&document, &snapshot) {
                    apply(&controller, action).await;
                }
            }
            debug!(room = %apply_room, "Room update stream ended");
        });

        if let Err(e) = self.store.save_room_id(room_id).await {
            warn!("Failed to persist room id: {e}");
        }

        *active = Some(ActiveRoom {
            room_id: room_id.to_string(),
            push_task,
            apply_task,
        });
        info!(room = %room_id, "Joined room");
        Ok(())
    }

    /// Leave the joined room; idempotent
    pub async fn leave(&self) {
        let mut active = self.active.lock().await;
        if let Some(previous) = active.take() {
            self.teardown(previous).await;
        }
    }

    async fn teardown(&self, previous: ActiveRoom) {
        self.controller.set_publisher(None).await;
        previous.apply_task.abort();
        previous.push_task.abort();

        if let Err(e) = self.store.clear_room_id().await {
            warn!("Failed to clear persisted room id: {e}");
        }
        info!(room = %previous.room_id, "Left room");
    }

    /// Id of the currently joined room, if any
    pub async fn active_room(&self) -> Option<String> {
        self.active
            .lock()
            .await
            .as_ref()
            .map(|a| a.room_id.clone())
    }

    /// Room id persisted by the last join, for rejoin prompts
    pub async fn last_room_id(&self) -> Result<Option<String>> {
        Ok(self.store.load_room_id().await?)
    }
}

async fn apply(controller: &Controller, action: RemoteAction) {
    match action {
        RemoteAction::LoadTrack(track) => {
            // Goes through the normal load path; the resulting push
            // converges under last-writer-wins
            if let Err(e) = controller.load_and_play(track).await {
                warn!("Failed to apply remote track change: {e}");
            }
        }
        RemoteAction::SetPlaying(playing) => controller.sync_set_playing(playing).await,
        RemoteAction::Seek(position_ms) => controller.sync_seek(position_ms).await,
    }
}
