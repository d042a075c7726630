//! Playback events
//!
//! Event-based communication for UI synchronization. The player pushes
//! events into a pending queue that the embedding layer drains after
//! each command.

use serde::{Deserialize, Serialize};

/// Events emitted by the transport controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlaybackEvent {
    /// Play/pause flag changed (optimistic; emitted before the device
    /// confirms)
    StateChanged {
        /// The new play flag
        is_playing: bool,
    },

    /// A different track was loaded
    TrackChanged {
        /// ID of the new (current) track
        track_id: String,
        /// ID of the previous track (if any)
        previous_track_id: Option<String>,
    },

    /// Track finished playing naturally (platform signal or stall
    /// heuristic)
    TrackFinished {
        /// ID of the finished track
        track_id: String,
    },

    /// Periodic position update from the device
    PositionUpdate {
        /// Current playback position
        position_ms: u64,
        /// Total track duration
        duration_ms: u64,
    },

    /// Queue contents changed
    QueueChanged {
        /// New queue length
        length: usize,
    },

    /// A non-fatal error was recorded
    Error {
        /// Human-readable message, also stored in `last_error`
        message: String,
    },
}
