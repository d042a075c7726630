//! Core types for transport control

use chorus_core::Track;
use serde::{Deserialize, Serialize};

/// Transport phase derived from the state fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportPhase {
    /// No track loaded
    Idle,

    /// Track selected, audio handle being created
    Loading,

    /// Handle loaded and commanded to play
    Playing,

    /// Handle loaded, paused
    Paused,
}

/// UI-visible transport state
///
/// `is_playing` is updated optimistically and may transiently disagree
/// with the underlying device until the device operation resolves or
/// fails.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransportState {
    /// Currently loaded track, if any
    pub current_track: Option<Track>,

    /// Whether playback was last commanded to play
    pub is_playing: bool,

    /// Playback position in milliseconds
    pub position_ms: u64,

    /// Reported track duration in milliseconds (0 until known)
    pub duration_ms: u64,

    /// Whether a handle is currently being created
    pub is_loading: bool,

    /// Most recent non-fatal error, surfaced to the UI
    pub last_error: Option<String>,
}

impl TransportState {
    /// Derive the transport phase
    pub fn phase(&self) -> TransportPhase {
        if self.current_track.is_none() {
            TransportPhase::Idle
        } else if self.is_loading {
            TransportPhase::Loading
        } else if self.is_playing {
            TransportPhase::Playing
        } else {
            TransportPhase::Paused
        }
    }
}

/// Snapshot of transport state pushed to a registered publisher
///
/// This is what the room synchronizer mirrors to the remote document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportSnapshot {
    /// Currently loaded track, if any
    pub current_track: Option<Track>,

    /// Whether playback is commanded to play
    pub is_playing: bool,

    /// Playback position in milliseconds
    pub position_ms: u64,
}

/// Sink for transport snapshots
///
/// Registered by the room synchronizer while a room is joined. The
/// implementation must not block: it is called while the player actor
/// lock is held.
pub trait StatePublisher: Send + Sync {
    /// Receive the latest transport snapshot
    fn publish(&self, snapshot: TransportSnapshot);
}

/// Application lifecycle transitions fed into the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppLifecycle {
    /// App in the foreground, interactive
    Active,

    /// App transitioning away from the foreground
    Inactive,

    /// App fully backgrounded
    Background,
}

/// Configuration for the transport controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Device status update interval in milliseconds (default: 300)
    pub status_interval_ms: u64,

    /// Delay before advancing after natural completion (default: 300)
    pub completion_delay_ms: u64,

    /// Consecutive frozen status ticks that count as a stall (default: 3)
    pub stall_ticks: u32,

    /// Stall only counts within this distance of the duration, in
    /// milliseconds (default: 3000)
    pub stall_window_ms: u64,

    /// Debounce for background last-played writes, in milliseconds
    /// (default: 200)
    pub save_debounce_ms: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            status_interval_ms: 300,
            completion_delay_ms: 300,
            stall_ticks: 3,
            stall_window_ms: 3000,
            save_debounce_ms: 200,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = PlaybackConfig::default();
        assert_eq!(config.status_interval_ms, 300);
        assert_eq!(config.completion_delay_ms, 300);
        assert_eq!(config.stall_ticks, 3);
        assert_eq!(config.stall_window_ms, 3000);
    }

    #[test]
    fn phase_derivation() {
        let mut state = TransportState::default();
        assert_eq!(state.phase(), TransportPhase::Idle);

        state.current_track = Some(Track::new("t1", "Song", "Artist", "url"));
        state.is_loading = true;
        assert_eq!(state.phase(), TransportPhase::Loading);

        state.is_loading = false;
        state.is_playing = true;
        assert_eq!(state.phase(), TransportPhase::Playing);

        state.is_playing = false;
        assert_eq!(state.phase(), TransportPhase::Paused);
    }
}
