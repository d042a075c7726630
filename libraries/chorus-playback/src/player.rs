//! Transport state machine
//!
//! [`Player`] owns the single live audio handle, the queue, and the
//! UI-visible transport state. State is updated optimistically before
//! device I/O; device failures are recorded in `last_error` and never
//! leave the player inoperable. All methods assume exclusive access —
//! [`Controller`](crate::controller::Controller) provides the actor
//! lock and drives status streams.

use crate::{
    device::{AudioBackend, AudioHandle, HandleStatus},
    error::Result,
    events::PlaybackEvent,
    persist::Saver,
    queue::Queue,
    stall::StallDetector,
    types::{AppLifecycle, PlaybackConfig, StatePublisher, TransportSnapshot, TransportState},
};
use chorus_core::{LastPlayed, StateStore, Track};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// What the driver must do after a completed track was detected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionAction {
    /// Repeat is on: restart the same track from position zero
    Restart,

    /// Advance to the next queue track after the completion delay
    Advance,
}

/// Status stream of one load, tagged with its generation
///
/// Status updates carrying a generation older than the player's
/// current one are stale (an overlapping load superseded them) and
/// must be dropped.
pub struct StatusWatch {
    /// Generation of the load that produced this stream
    pub generation: u64,

    /// Push-based device status updates
    pub statuses: mpsc::UnboundedReceiver<HandleStatus>,
}

/// The transport state machine
pub struct Player {
    state: TransportState,
    queue: Queue,

    handle: Option<Box<dyn AudioHandle>>,
    generation: u64,
    completion_handled: bool,
    stall: StallDetector,

    backend: Arc<dyn AudioBackend>,
    store: Arc<dyn StateStore>,
    saver: Saver,
    config: PlaybackConfig,

    publisher: Option<Arc<dyn StatePublisher>>,
    pending_events: Vec<PlaybackEvent>,
}

impl Player {
    /// Create a player; must be called within a tokio runtime (the
    /// debounced saver task is spawned here)
    pub fn new(
        backend: Arc<dyn AudioBackend>,
        store: Arc<dyn StateStore>,
        config: PlaybackConfig,
    ) -> Self {
        let saver = Saver::spawn(
            store.clone(),
            Duration::from_millis(config.save_debounce_ms),
        );
        Self {
            state: TransportState::default(),
            queue: Queue::new(),
            handle: None,
            generation: 0,
            completion_handled: false,
            stall: StallDetector::new(config.stall_ticks, config.stall_window_ms),
            backend,
            store,
            saver,
            config,
            publisher: None,
            pending_events: Vec::new(),
        }
    }

    // === Transport operations ===

    /// Load `track` and start playing it
    ///
    /// The UI-visible state flips before any device I/O; the previous
    /// handle is released unconditionally. On handle-creation failure
    /// the play flag reverts, the error lands in `last_error`, and the
    /// player stays operable.
    pub async fn load_and_play(&mut self, track: Track) -> Result<StatusWatch> {
        let previous_id = self.state.current_track.as_ref().map(|t| t.id.clone());

        self.state.current_track = Some(track.clone());
        self.state.is_playing = true;
        self.state.is_loading = true;
        self.state.last_error = None;
        self.state.position_ms = 0;
        self.state.duration_ms = track.duration_ms.unwrap_or(0);
        if previous_id.as_deref() != Some(track.id.as_str()) {
            self.pending_events.push(PlaybackEvent::TrackChanged {
                track_id: track.id.clone(),
                previous_track_id: previous_id,
            });
        }
        self.pending_events
            .push(PlaybackEvent::StateChanged { is_playing: true });
        self.push_state();

        self.release_handle().await;

        self.generation += 1;
        let generation = self.generation;
        self.completion_handled = false;
        self.stall.reset();

        let interval = Duration::from_millis(self.config.status_interval_ms);
        match self.backend.load(&track.url, true, interval).await {
            Ok(loaded) => {
                self.handle = Some(loaded.handle);
                self.state.is_loading = false;
                info!(track_id = %track.id, "Track loaded");
                self.queue_last_played();
                self.push_state();
                Ok(StatusWatch {
                    generation,
                    statuses: loaded.statuses,
                })
            }
            Err(e) => {
                self.state.is_loading = false;
                self.state.is_playing = false;
                warn!(track_id = %track.id, "Failed to load track: {e}");
                self.record_error(format!("Failed to play the track: {e}"));
                self.pending_events
                    .push(PlaybackEvent::StateChanged { is_playing: false });
                self.push_state();
                Err(e)
            }
        }
    }

    /// Flip play/pause; no-op without a loaded track
    ///
    /// The flag flips before the device command so a tap never waits
    /// on device latency; a failed command reverts it and records the
    /// error.
    pub async fn toggle_play_pause(&mut self) -> Result<()> {
        if self.state.current_track.is_none() || self.handle.is_none() {
            return Ok(());
        }

        let previous = self.state.is_playing;
        let target = !previous;
        self.state.is_playing = target;
        if target {
            // Resuming re-arms end-of-track detection; a track replayed
            // after the exhausted-queue stop can complete again
            self.completion_handled = false;
            self.stall.reset();
        }
        self.pending_events
            .push(PlaybackEvent::StateChanged { is_playing: target });
        self.push_state();
        self.queue_last_played();

        let command = match self.handle.as_mut() {
            Some(handle) => {
                if target {
                    handle.play().await
                } else {
                    handle.pause().await
                }
            }
            None => Ok(()),
        };

        if let Err(e) = command {
            self.state.is_playing = previous;
            warn!("Device {} failed: {e}", if target { "play" } else { "pause" });
            self.record_error(format!("Failed to {}: {e}", if target { "play" } else { "pause" }));
            self.pending_events
                .push(PlaybackEvent::StateChanged { is_playing: previous });
            self.push_state();
        }
        Ok(())
    }

    /// Seek to `position_ms`; no-op without a handle
    ///
    /// Local position updates immediately; a failed device seek is
    /// recorded without reverting it (best effort).
    pub async fn seek(&mut self, position_ms: u64) -> Result<()> {
        if self.handle.is_none() {
            return Ok(());
        }

        self.state.position_ms = position_ms;
        self.stall.reset();
        self.pending_events.push(PlaybackEvent::PositionUpdate {
            position_ms,
            duration_ms: self.state.duration_ms,
        });
        self.push_state();
        self.queue_last_played();

        let command = match self.handle.as_mut() {
            Some(handle) => handle.seek(position_ms).await,
            None => Ok(()),
        };
        if let Err(e) = command {
            warn!("Device seek failed: {e}");
            self.record_error(format!("Failed to seek: {e}"));
        }
        Ok(())
    }

    /// Advance to the next queue track
    ///
    /// With nothing left to play, pauses and resets the position to
    /// zero instead of leaving the finished track frozen mid-way.
    pub async fn next(&mut self) -> Result<Option<StatusWatch>> {
        let current = self.state.current_track.clone();
        match self.queue.next_of(current.as_ref()) {
            Some(track) => Ok(Some(self.load_and_play(track).await?)),
            None => {
                self.stop_at_end().await;
                Ok(None)
            }
        }
    }

    /// Step back to the previous queue track; no-op at a hard boundary
    pub async fn previous(&mut self) -> Result<Option<StatusWatch>> {
        let current = self.state.current_track.clone();
        match self.queue.previous_of(current.as_ref()) {
            Some(track) => Ok(Some(self.load_and_play(track).await?)),
            None => Ok(None),
        }
    }

    async fn stop_at_end(&mut self) {
        let command = match self.handle.as_mut() {
            Some(handle) => {
                let paused = handle.pause().await;
                let rewound = handle.seek(0).await;
                paused.and(rewound)
            }
            None => Ok(()),
        };
        if let Err(e) = command {
            warn!("Failed to reset device at queue end: {e}");
        }

        self.state.is_playing = false;
        self.state.position_ms = 0;
        self.stall.reset();
        self.pending_events
            .push(PlaybackEvent::StateChanged { is_playing: false });
        self.push_state();
        self.queue_last_played();
        info!("Queue exhausted, playback stopped");
    }

    /// Restart the current track from position zero (repeat path)
    pub async fn restart_current(&mut self) -> Result<()> {
        let command = match self.handle.as_mut() {
            Some(handle) => match handle.seek(0).await {
                Ok(()) => handle.play().await,
                Err(e) => Err(e),
            },
            None => Ok(()),
        };

        self.state.position_ms = 0;
        self.state.is_playing = true;
        self.completion_handled = false;
        self.stall.reset();
        self.pending_events
            .push(PlaybackEvent::StateChanged { is_playing: true });
        self.push_state();
        self.queue_last_played();

        if let Err(e) = command {
            warn!("Failed to restart track: {e}");
            self.record_error(format!("Failed to restart track: {e}"));
        }
        Ok(())
    }

    // === Status stream ===

    /// Apply one device status update
    ///
    /// Updates tagged with a stale generation are dropped. Completion
    /// (platform signal or stall heuristic) is handled exactly once
    /// per load; the returned action tells the driver what to do.
    pub fn on_status(
        &mut self,
        generation: u64,
        status: HandleStatus,
    ) -> Option<CompletionAction> {
        if generation != self.generation {
            debug!(
                stale = generation,
                current = self.generation,
                "Dropping stale status update"
            );
            return None;
        }
        if !status.is_loaded {
            return None;
        }

        self.state.position_ms = status.position_ms;
        if status.duration_ms > 0 {
            self.state.duration_ms = status.duration_ms;
        }
        self.pending_events.push(PlaybackEvent::PositionUpdate {
            position_ms: self.state.position_ms,
            duration_ms: self.state.duration_ms,
        });

        let stalled = self.stall.observe(&status);
        if (status.just_finished || stalled) && !self.completion_handled {
            self.completion_handled = true;
            if stalled && !status.just_finished {
                debug!(
                    position_ms = status.position_ms,
                    duration_ms = status.duration_ms,
                    "Treating stalled near-end position as completion"
                );
            }
            if let Some(track) = &self.state.current_track {
                self.pending_events.push(PlaybackEvent::TrackFinished {
                    track_id: track.id.clone(),
                });
            }
            return Some(self.completion_action());
        }
        None
    }

    fn completion_action(&self) -> CompletionAction {
        if self.queue.repeat() {
            CompletionAction::Restart
        } else {
            CompletionAction::Advance
        }
    }

    // === Lifecycle reconciliation ===

    /// Reconcile with the device across app lifecycle transitions
    ///
    /// Leaving the foreground captures and persists the device
    /// position. Returning re-reads device status: a track the device
    /// finished while backgrounded goes through normal completion
    /// handling; a device that silently dropped playback gets play
    /// re-issued.
    pub async fn on_app_state(&mut self, lifecycle: AppLifecycle) -> Option<CompletionAction> {
        match lifecycle {
            AppLifecycle::Inactive | AppLifecycle::Background => {
                if self.state.is_playing {
                    let status = match self.handle.as_mut() {
                        Some(handle) => handle.status().await.ok(),
                        None => None,
                    };
                    if let Some(status) = status {
                        if status.is_loaded {
                            self.state.position_ms = status.position_ms;
                        }
                    }
                    if let Some(track) = self.state.current_track.clone() {
                        let record = LastPlayed {
                            track,
                            position_ms: self.state.position_ms,
                            is_playing: self.state.is_playing,
                        };
                        if let Err(e) = self.store.save_last_played(&record).await {
                            warn!("Failed to persist state while backgrounding: {e}");
                        }
                    }
                }
                None
            }
            AppLifecycle::Active => {
                let status = match self.handle.as_mut() {
                    Some(handle) => handle.status().await.ok(),
                    None => None,
                };
                let status = status?;
                if !status.is_loaded {
                    return None;
                }

                self.state.position_ms = status.position_ms;
                if status.duration_ms > 0 {
                    self.state.duration_ms = status.duration_ms;
                }

                if status.just_finished && !self.completion_handled {
                    self.completion_handled = true;
                    if let Some(track) = &self.state.current_track {
                        self.pending_events.push(PlaybackEvent::TrackFinished {
                            track_id: track.id.clone(),
                        });
                    }
                    return Some(self.completion_action());
                }

                if self.state.is_playing && !status.is_playing {
                    debug!("Device paused while backgrounded, re-issuing play");
                    let command = match self.handle.as_mut() {
                        Some(handle) => handle.play().await,
                        None => Ok(()),
                    };
                    if let Err(e) = command {
                        warn!("Failed to resume after foregrounding: {e}");
                        self.record_error(format!("Failed to resume playback: {e}"));
                    }
                }
                None
            }
        }
    }

    // === Persistence ===

    /// Restore queue and last-played state; run once at startup
    ///
    /// Re-establishes a handle for the recorded track at the recorded
    /// position and resumes playback only if it was marked playing.
    /// All failures are non-fatal.
    pub async fn restore(&mut self) -> Result<Option<StatusWatch>> {
        match self.store.load_queue().await {
            Ok(tracks) => self.queue.replace(tracks),
            Err(e) => warn!("Failed to load persisted queue: {e}"),
        }

        let record = match self.store.load_last_played().await {
            Ok(Some(record)) => record,
            Ok(None) => return Ok(None),
            Err(e) => {
                warn!("Failed to load last-played state: {e}");
                return Ok(None);
            }
        };

        self.state.current_track = Some(record.track.clone());
        self.state.position_ms = record.position_ms;
        self.state.is_playing = record.is_playing;
        self.state.duration_ms = record.track.duration_ms.unwrap_or(0);

        self.generation += 1;
        let generation = self.generation;
        self.completion_handled = false;
        self.stall.reset();

        let interval = Duration::from_millis(self.config.status_interval_ms);
        match self
            .backend
            .load(&record.track.url, record.is_playing, interval)
            .await
        {
            Ok(loaded) => {
                self.handle = Some(loaded.handle);
                if record.is_playing && record.position_ms > 0 {
                    let command = match self.handle.as_mut() {
                        Some(handle) => handle.seek(record.position_ms).await,
                        None => Ok(()),
                    };
                    if let Err(e) = command {
                        warn!("Failed to seek to restored position: {e}");
                    }
                }
                info!(track_id = %record.track.id, "Restored last-played state");
                Ok(Some(StatusWatch {
                    generation,
                    statuses: loaded.statuses,
                }))
            }
            Err(e) => {
                self.state.is_playing = false;
                warn!("Failed to restore last-played track: {e}");
                self.record_error(format!("Failed to restore playback: {e}"));
                Ok(None)
            }
        }
    }

    // === Queue operations ===

    /// Add tracks to the queue and persist it
    pub async fn add_to_queue(&mut self, tracks: Vec<Track>) -> Result<usize> {
        let added = self.queue.add(tracks)?;
        self.pending_events.push(PlaybackEvent::QueueChanged {
            length: self.queue.len(),
        });
        self.persist_queue().await;
        Ok(added)
    }

    /// Remove a track from the queue and persist it
    pub async fn remove_from_queue(&mut self, track_id: &str) {
        if self.queue.remove(track_id) {
            self.pending_events.push(PlaybackEvent::QueueChanged {
                length: self.queue.len(),
            });
            self.persist_queue().await;
        }
    }

    /// Empty the queue and persist it
    pub async fn clear_queue(&mut self) {
        self.queue.clear();
        self.pending_events
            .push(PlaybackEvent::QueueChanged { length: 0 });
        self.persist_queue().await;
    }

    /// Set the shuffle flag
    pub fn set_shuffle(&mut self, shuffle: bool) {
        self.queue.set_shuffle(shuffle);
    }

    /// Set the repeat flag
    pub fn set_repeat(&mut self, repeat: bool) {
        self.queue.set_repeat(repeat);
    }

    /// Record whether the queue came from a named playlist
    pub fn set_playlist_context(&mut self, playlist_id: Option<String>) {
        self.queue.set_playlist_context(playlist_id);
    }

    /// Read access to the queue
    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    // === Remote-applied mutations (room sync) ===

    /// Apply a remote play/pause decision without re-publishing
    pub async fn sync_set_playing(&mut self, playing: bool) {
        if self.state.is_playing == playing {
            return;
        }
        let command = match self.handle.as_mut() {
            Some(handle) => {
                if playing {
                    handle.play().await
                } else {
                    handle.pause().await
                }
            }
            None => Ok(()),
        };
        match command {
            Ok(()) => {
                self.state.is_playing = playing;
                if playing {
                    self.completion_handled = false;
                    self.stall.reset();
                }
                self.pending_events
                    .push(PlaybackEvent::StateChanged { is_playing: playing });
                self.queue_last_played();
            }
            Err(e) => {
                warn!("Remote-driven {} failed: {e}", if playing { "play" } else { "pause" });
                self.record_error(format!("Failed to apply room state: {e}"));
            }
        }
    }

    /// Apply a remote seek without re-publishing
    pub async fn sync_seek(&mut self, position_ms: u64) {
        let command = match self.handle.as_mut() {
            Some(handle) => handle.seek(position_ms).await,
            None => Ok(()),
        };
        if let Err(e) = command {
            warn!("Remote-driven seek failed: {e}");
            self.record_error(format!("Failed to apply room position: {e}"));
        }
        self.state.position_ms = position_ms;
        self.stall.reset();
        self.pending_events.push(PlaybackEvent::PositionUpdate {
            position_ms,
            duration_ms: self.state.duration_ms,
        });
        self.queue_last_played();
    }

    // === Accessors ===

    /// Current transport state
    pub fn state(&self) -> &TransportState {
        &self.state
    }

    /// Snapshot for publishers and the room mirror
    pub fn snapshot(&self) -> TransportSnapshot {
        TransportSnapshot {
            current_track: self.state.current_track.clone(),
            is_playing: self.state.is_playing,
            position_ms: self.state.position_ms,
        }
    }

    /// Register (or clear) the snapshot publisher
    pub fn set_publisher(&mut self, publisher: Option<Arc<dyn StatePublisher>>) {
        self.publisher = publisher;
    }

    /// Drain pending events for the embedding layer
    pub fn take_events(&mut self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut self.pending_events)
    }

    // === Internals ===

    async fn release_handle(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            if let Err(e) = handle.release().await {
                warn!("Failed to release previous audio handle: {e}");
            }
        }
    }

    fn push_state(&mut self) {
        if let Some(publisher) = &self.publisher {
            publisher.publish(self.snapshot());
        }
    }

    fn queue_last_played(&mut self) {
        if let Some(track) = &self.state.current_track {
            self.saver.save(LastPlayed {
                track: track.clone(),
                position_ms: self.state.position_ms,
                is_playing: self.state.is_playing,
            });
        }
    }

    async fn persist_queue(&mut self) {
        if let Err(e) = self.store.save_queue(self.queue.tracks()).await {
            warn!("Failed to persist queue: {e}");
        }
    }

    fn record_error(&mut self, message: String) {
        self.state.last_error = Some(message.clone());
        self.pending_events.push(PlaybackEvent::Error { message });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlaybackError;
    use chorus_core::Result as CoreResult;
    use mockall::mock;
    use std::sync::Mutex as StdMutex;

    mock! {
        Backend {}

        #[async_trait::async_trait]
        impl AudioBackend for Backend {
            async fn load(
                &self,
                url: &str,
                autoplay: bool,
                status_interval: Duration,
            ) -> Result<crate::device::LoadedHandle>;
        }
    }

    mock! {
        Handle {}

        #[async_trait::async_trait]
        impl AudioHandle for Handle {
            async fn play(&mut self) -> Result<()>;
            async fn pause(&mut self) -> Result<()>;
            async fn seek(&mut self, position_ms: u64) -> Result<()>;
            async fn status(&mut self) -> Result<HandleStatus>;
            async fn release(&mut self) -> Result<()>;
        }
    }

    #[derive(Default)]
    struct NullStore {
        last_played: StdMutex<Option<LastPlayed>>,
    }

    #[async_trait::async_trait]
    impl StateStore for NullStore {
        async fn load_last_played(&self) -> CoreResult<Option<LastPlayed>> {
            Ok(self.last_played.lock().unwrap().clone())
        }
        async fn save_last_played(&self, record: &LastPlayed) -> CoreResult<()> {
            *self.last_played.lock().unwrap() = Some(record.clone());
            Ok(())
        }
        async fn load_queue(&self) -> CoreResult<Vec<Track>> {
            Ok(Vec::new())
        }
        async fn save_queue(&self, _tracks: &[Track]) -> CoreResult<()> {
            Ok(())
        }
        async fn load_room_id(&self) -> CoreResult<Option<String>> {
            Ok(None)
        }
        async fn save_room_id(&self, _room_id: &str) -> CoreResult<()> {
            Ok(())
        }
        async fn clear_room_id(&self) -> CoreResult<()> {
            Ok(())
        }
    }

    fn track(id: &str) -> Track {
        Track::new(id, format!("Track {id}"), "Artist", format!("https://cdn.example/{id}.mp3"))
    }

    fn loaded(handle: MockHandle) -> crate::device::LoadedHandle {
        let (_tx, statuses) = mpsc::unbounded_channel();
        crate::device::LoadedHandle {
            handle: Box::new(handle),
            statuses,
        }
    }

    fn player_with(backend: MockBackend) -> Player {
        Player::new(
            Arc::new(backend),
            Arc::new(NullStore::default()),
            PlaybackConfig::default(),
        )
    }

    #[tokio::test]
    async fn toggle_without_track_is_a_noop() {
        let backend = MockBackend::new();
        let mut player = player_with(backend);

        player.toggle_play_pause().await.unwrap();

        assert!(!player.state().is_playing);
        assert!(player.state().last_error.is_none());
        assert!(player.take_events().is_empty());
    }

    #[tokio::test]
    async fn load_failure_records_error_and_reverts_play_flag() {
        let mut backend = MockBackend::new();
        backend
            .expect_load()
            .returning(|_, _, _| Err(PlaybackError::Device("no codec".into())));
        let mut player = player_with(backend);

        let result = player.load_and_play(track("a")).await;

        assert!(result.is_err());
        assert!(!player.state().is_playing);
        assert!(!player.state().is_loading);
        assert!(player.state().last_error.as_deref().unwrap().contains("no codec"));
        // Player stays operable: a later toggle is still a clean no-op
        player.toggle_play_pause().await.unwrap();
    }

    #[tokio::test]
    async fn toggle_failure_reverts_the_optimistic_flag() {
        let mut backend = MockBackend::new();
        backend.expect_load().returning(|_, _, _| {
            let mut handle = MockHandle::new();
            handle
                .expect_pause()
                .returning(|| Err(PlaybackError::Device("device busy".into())));
            Ok(loaded(handle))
        });
        let mut player = player_with(backend);

        player.load_and_play(track("a")).await.unwrap();
        assert!(player.state().is_playing);

        player.toggle_play_pause().await.unwrap();

        // Pause failed, so the flag reverted to playing
        assert!(player.state().is_playing);
        assert!(player.state().last_error.is_some());
    }

    #[tokio::test]
    async fn stale_generation_updates_are_dropped() {
        let mut backend = MockBackend::new();
        backend.expect_load().returning(|_, _, _| {
            let mut handle = MockHandle::new();
            handle.expect_release().returning(|| Ok(()));
            Ok(loaded(handle))
        });
        let mut player = player_with(backend);

        let first = player.load_and_play(track("a")).await.unwrap();
        let second = player.load_and_play(track("b")).await.unwrap();
        assert_ne!(first.generation, second.generation);

        let stale = HandleStatus {
            is_loaded: true,
            position_ms: 120_000,
            duration_ms: 180_000,
            is_playing: true,
            just_finished: false,
        };
        player.on_status(first.generation, stale);
        assert_eq!(player.state().position_ms, 0);

        player.on_status(second.generation, stale);
        assert_eq!(player.state().position_ms, 120_000);
    }

    #[tokio::test]
    async fn completion_fires_exactly_once_per_load() {
        let mut backend = MockBackend::new();
        backend.expect_load().returning(|_, _, _| Ok(loaded(MockHandle::new())));
        let mut player = player_with(backend);

        let watch = player.load_and_play(track("a")).await.unwrap();

        let frozen = HandleStatus {
            is_loaded: true,
            position_ms: 179_000,
            duration_ms: 180_000,
            is_playing: true,
            just_finished: false,
        };

        assert!(player.on_status(watch.generation, frozen).is_none());
        assert!(player.on_status(watch.generation, frozen).is_none());
        assert_eq!(
            player.on_status(watch.generation, frozen),
            Some(CompletionAction::Advance)
        );

        // Still frozen on later ticks: no second completion
        assert!(player.on_status(watch.generation, frozen).is_none());
        assert!(player.on_status(watch.generation, frozen).is_none());
    }

    #[tokio::test]
    async fn repeat_turns_completion_into_restart() {
        let mut backend = MockBackend::new();
        backend.expect_load().returning(|_, _, _| Ok(loaded(MockHandle::new())));
        let mut player = player_with(backend);
        player.set_repeat(true);

        let watch = player.load_and_play(track("a")).await.unwrap();

        let finished = HandleStatus {
            is_loaded: true,
            position_ms: 180_000,
            duration_ms: 180_000,
            is_playing: false,
            just_finished: true,
        };
        assert_eq!(
            player.on_status(watch.generation, finished),
            Some(CompletionAction::Restart)
        );
    }

    #[tokio::test]
    async fn next_with_exhausted_queue_pauses_and_rewinds() {
        let mut backend = MockBackend::new();
        backend.expect_load().returning(|_, _, _| {
            let mut handle = MockHandle::new();
            handle.expect_pause().times(1).returning(|| Ok(()));
            handle.expect_seek().times(1).returning(|_| Ok(()));
            Ok(loaded(handle))
        });
        let mut player = player_with(backend);

        player.add_to_queue(vec![track("a")]).await.unwrap();
        player.load_and_play(track("a")).await.unwrap();

        let watch = player.next().await.unwrap();

        assert!(watch.is_none());
        assert!(!player.state().is_playing);
        assert_eq!(player.state().position_ms, 0);
        // The finished track is still current, just reset
        assert_eq!(player.state().current_track.as_ref().unwrap().id, "a");
    }

    #[tokio::test]
    async fn foregrounding_reissues_play_when_device_dropped_it() {
        let mut backend = MockBackend::new();
        backend.expect_load().returning(|_, _, _| {
            let mut handle = MockHandle::new();
            handle.expect_status().returning(|| {
                Ok(HandleStatus {
                    is_loaded: true,
                    position_ms: 30_000,
                    duration_ms: 180_000,
                    is_playing: false,
                    just_finished: false,
                })
            });
            handle.expect_play().times(1).returning(|| Ok(()));
            Ok(loaded(handle))
        });
        let mut player = player_with(backend);

        player.load_and_play(track("a")).await.unwrap();
        let action = player.on_app_state(AppLifecycle::Active).await;

        assert!(action.is_none());
        assert_eq!(player.state().position_ms, 30_000);
        assert!(player.state().is_playing);
    }

    #[tokio::test]
    async fn backgrounding_persists_the_device_position() {
        let mut backend = MockBackend::new();
        backend.expect_load().returning(|_, _, _| {
            let mut handle = MockHandle::new();
            handle.expect_status().returning(|| {
                Ok(HandleStatus {
                    is_loaded: true,
                    position_ms: 45_000,
                    duration_ms: 180_000,
                    is_playing: true,
                    just_finished: false,
                })
            });
            Ok(loaded(handle))
        });
        let store = Arc::new(NullStore::default());
        let mut player = Player::new(Arc::new(backend), store.clone(), PlaybackConfig::default());

        player.load_and_play(track("a")).await.unwrap();
        player.on_app_state(AppLifecycle::Background).await;

        let saved = store.last_played.lock().unwrap().clone().unwrap();
        assert_eq!(saved.position_ms, 45_000);
        assert!(saved.is_playing);
    }

    #[tokio::test]
    async fn device_finishing_while_backgrounded_triggers_completion() {
        let mut backend = MockBackend::new();
        backend.expect_load().returning(|_, _, _| {
            let mut handle = MockHandle::new();
            handle.expect_status().returning(|| {
                Ok(HandleStatus {
                    is_loaded: true,
                    position_ms: 180_000,
                    duration_ms: 180_000,
                    is_playing: false,
                    just_finished: true,
                })
            });
            handle.expect_play().returning(|| Ok(()));
            Ok(loaded(handle))
        });
        let mut player = player_with(backend);

        player.load_and_play(track("a")).await.unwrap();
        let action = player.on_app_state(AppLifecycle::Active).await;

        assert_eq!(action, Some(CompletionAction::Advance));
        // Completion is latched; a second foreground event is quiet
        assert!(player.on_app_state(AppLifecycle::Active).await.is_none());
    }
}
