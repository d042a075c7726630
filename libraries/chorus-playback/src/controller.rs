//! Playback controller
//!
//! [`Controller`] is the concurrency wrapper around [`Player`]: a
//! shared handle whose methods serialize access through a single
//! mutex and drive the status stream of each load on a background
//! task. Clones share the same player.

use crate::{
    device::{AudioBackend, HandleStatus},
    error::Result,
    events::PlaybackEvent,
    player::{CompletionAction, Player, StatusWatch},
    types::{AppLifecycle, PlaybackConfig, StatePublisher, TransportSnapshot, TransportState},
};
use chorus_core::{StateStore, Track};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Shared, clonable handle to the transport
#[derive(Clone)]
pub struct Controller {
    player: Arc<Mutex<Player>>,
    config: PlaybackConfig,
}

impl Controller {
    /// Create a controller over a fresh player; must be called within
    /// a tokio runtime
    pub fn new(
        backend: Arc<dyn AudioBackend>,
        store: Arc<dyn StateStore>,
        config: PlaybackConfig,
    ) -> Self {
        let player = Player::new(backend, store, config.clone());
        Self {
            player: Arc::new(Mutex::new(player)),
            config,
        }
    }

    // === Transport ===

    /// Load a track and start playing it
    pub async fn load_and_play(&self, track: Track) -> Result<()> {
        let watch = self.player.lock().await.load_and_play(track).await?;
        self.spawn_watch(watch);
        Ok(())
    }

    /// Flip play/pause
    pub async fn toggle_play_pause(&self) -> Result<()> {
        self.player.lock().await.toggle_play_pause().await
    }

    /// Seek to a position in milliseconds
    pub async fn seek(&self, position_ms: u64) -> Result<()> {
        self.player.lock().await.seek(position_ms).await
    }

    /// Skip to the next queue track
    pub async fn next(&self) -> Result<()> {
        let watch = self.player.lock().await.next().await?;
        if let Some(watch) = watch {
            self.spawn_watch(watch);
        }
        Ok(())
    }

    /// Step back to the previous queue track
    pub async fn previous(&self) -> Result<()> {
        let watch = self.player.lock().await.previous().await?;
        if let Some(watch) = watch {
            self.spawn_watch(watch);
        }
        Ok(())
    }

    /// Restore persisted queue and last-played state; run once at
    /// startup
    pub async fn restore(&self) -> Result<()> {
        let watch = self.player.lock().await.restore().await?;
        if let Some(watch) = watch {
            self.spawn_watch(watch);
        }
        Ok(())
    }

    /// Feed an app lifecycle transition into the player
    pub async fn on_app_state(&self, lifecycle: AppLifecycle) {
        let action = self.player.lock().await.on_app_state(lifecycle).await;
        if let Some(action) = action {
            self.run_completion(action).await;
        }
    }

    // === Queue ===

    /// Add tracks to the queue
    pub async fn add_to_queue(&self, tracks: Vec<Track>) -> Result<usize> {
        self.player.lock().await.add_to_queue(tracks).await
    }

    /// Remove a track from the queue
    pub async fn remove_from_queue(&self, track_id: &str) {
        self.player.lock().await.remove_from_queue(track_id).await;
    }

    /// Empty the queue
    pub async fn clear_queue(&self) {
        self.player.lock().await.clear_queue().await;
    }

    /// Set the shuffle flag
    pub async fn set_shuffle(&self, shuffle: bool) {
        self.player.lock().await.set_shuffle(shuffle);
    }

    /// Set the repeat flag
    pub async fn set_repeat(&self, repeat: bool) {
        self.player.lock().await.set_repeat(repeat);
    }

    /// Record whether the queue came from a named playlist
    pub async fn set_playlist_context(&self, playlist_id: Option<String>) {
        self.player.lock().await.set_playlist_context(playlist_id);
    }

    /// Tracks currently queued, in order
    pub async fn queue_tracks(&self) -> Vec<Track> {
        self.player.lock().await.queue().tracks().to_vec()
    }

    // === State ===

    /// Current transport state
    pub async fn state(&self) -> TransportState {
        self.player.lock().await.state().clone()
    }

    /// Snapshot for publishers and the room mirror
    pub async fn snapshot(&self) -> TransportSnapshot {
        self.player.lock().await.snapshot()
    }

    /// Drain pending events for the embedding layer
    pub async fn take_events(&self) -> Vec<PlaybackEvent> {
        self.player.lock().await.take_events()
    }

    /// Register (or clear) the snapshot publisher
    pub async fn set_publisher(&self, publisher: Option<Arc<dyn StatePublisher>>) {
        self.player.lock().await.set_publisher(publisher);
    }

    // === Remote-applied mutations (room sync) ===

    /// Apply a remote play/pause decision without re-publishing
    pub async fn sync_set_playing(&self, playing: bool) {
        self.player.lock().await.sync_set_playing(playing).await;
    }

    /// Apply a remote seek without re-publishing
    pub async fn sync_seek(&self, position_ms: u64) {
        self.player.lock().await.sync_seek(position_ms).await;
    }

    // === Internals ===

    fn spawn_watch(&self, watch: StatusWatch) {
        let player = Arc::clone(&self.player);
        let completion_delay = Duration::from_millis(self.config.completion_delay_ms);
        tokio::spawn(watch_loop(player, completion_delay, watch));
    }

    async fn run_completion(&self, action: CompletionAction) {
        let player = Arc::clone(&self.player);
        let completion_delay = Duration::from_millis(self.config.completion_delay_ms);
        if let WatchStep::Switch(watch) = complete(&player, completion_delay, action).await {
            self.spawn_watch(watch);
        }
    }
}

/// What the watch loop does after running a completion action
enum WatchStep {
    /// The handle is unchanged: keep consuming the same stream
    /// (repeat restart, queue exhausted, failed advance)
    Continue,

    /// A new load took over: follow its stream
    Switch(StatusWatch),
}

/// Consume the status stream of one load, following completion
/// advances onto the streams of the loads they trigger
///
/// A completion that keeps the current handle (repeat restart, queue
/// exhausted) keeps this loop on the same stream, so later resumes of
/// that handle still get position updates and end-of-track detection.
/// The loop ends only when its stream closes (handle released,
/// superseded by a manual load).
async fn watch_loop(
    player: Arc<Mutex<Player>>,
    completion_delay: Duration,
    mut watch: StatusWatch,
) {
    loop {
        let Some(status) = watch.statuses.recv().await else {
            debug!(generation = watch.generation, "Status stream closed");
            return;
        };
        let action = apply_status(&player, watch.generation, status).await;
        let Some(action) = action else { continue };

        match complete(&player, completion_delay, action).await {
            WatchStep::Continue => {}
            WatchStep::Switch(next_watch) => watch = next_watch,
        }
    }
}

async fn apply_status(
    player: &Arc<Mutex<Player>>,
    generation: u64,
    status: HandleStatus,
) -> Option<CompletionAction> {
    player.lock().await.on_status(generation, status)
}

/// Run a completion action
///
/// The delay before advancing lets the device settle after end of
/// media instead of tearing the handle down mid-callback.
async fn complete(
    player: &Arc<Mutex<Player>>,
    completion_delay: Duration,
    action: CompletionAction,
) -> WatchStep {
    match action {
        CompletionAction::Restart => {
            let mut guard = player.lock().await;
            if let Err(e) = guard.restart_current().await {
                warn!("Failed to restart after completion: {e}");
            }
            WatchStep::Continue
        }
        CompletionAction::Advance => {
            sleep(completion_delay).await;
            let mut guard = player.lock().await;
            match guard.next().await {
                Ok(Some(watch)) => WatchStep::Switch(watch),
                Ok(None) => WatchStep::Continue,
                Err(e) => {
                    warn!("Failed to advance after completion: {e}");
                    WatchStep::Continue
                }
            }
        }
    }
}
