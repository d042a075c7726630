//! Device audio seams
//!
//! The platform audio subsystem is reached only through these traits.
//! Exactly one handle is live at a time; the player releases the old
//! handle before creating a new one.

use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;

/// Status reported by a live audio handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HandleStatus {
    /// Whether the handle finished loading its media
    pub is_loaded: bool,

    /// Device-reported position in milliseconds
    pub position_ms: u64,

    /// Device-reported duration in milliseconds (0 if unknown)
    pub duration_ms: u64,

    /// Whether the device is actually playing
    pub is_playing: bool,

    /// Platform end-of-media signal; not fully trusted (see the stall
    /// detector)
    pub just_finished: bool,
}

/// A freshly created handle plus its status stream
///
/// The status stream closes when the handle is released; watch tasks
/// consuming it terminate on their own.
pub struct LoadedHandle {
    /// The live handle, exclusively owned by the player
    pub handle: Box<dyn AudioHandle>,

    /// Push-based status updates at the configured interval
    pub statuses: mpsc::UnboundedReceiver<HandleStatus>,
}

/// Platform audio backend: creates handles bound to a URL
#[async_trait]
pub trait AudioBackend: Send + Sync {
    /// Create a handle for `url`, optionally starting playback
    /// immediately, pushing status updates every `status_interval`
    async fn load(
        &self,
        url: &str,
        autoplay: bool,
        status_interval: Duration,
    ) -> Result<LoadedHandle>;
}

/// One loaded, playable instance of a track on the device
#[async_trait]
pub trait AudioHandle: Send {
    /// Start or resume playback
    async fn play(&mut self) -> Result<()>;

    /// Pause playback
    async fn pause(&mut self) -> Result<()>;

    /// Seek to a position in milliseconds
    async fn seek(&mut self, position_ms: u64) -> Result<()>;

    /// Read the current status on demand
    async fn status(&mut self) -> Result<HandleStatus>;

    /// Release the underlying device resource and close the status
    /// stream
    async fn release(&mut self) -> Result<()>;
}
