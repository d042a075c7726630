//! Error types for playback

use thiserror::Error;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// None of the tracks offered to the queue carried a valid id and title
    #[error("No valid tracks to add")]
    NoValidTracks,

    /// Every offered track was already in the queue
    #[error("All tracks are already in the queue")]
    DuplicateTracks,

    /// Device audio error (handle creation, play, pause, seek)
    #[error("Device error: {0}")]
    Device(String),

    /// Error from the core layer (persistence, serialization)
    #[error(transparent)]
    Core(#[from] chorus_core::ChorusError),
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
