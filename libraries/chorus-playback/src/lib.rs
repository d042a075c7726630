//! Chorus - Playback Engine
//!
//! Platform-agnostic queue and transport management for Chorus.
//!
//! This crate provides:
//! - Queue management (id-deduplicated, shuffle/repeat, playlist
//!   wraparound)
//! - Optimistic transport control with revert-on-failure
//! - Generation-fenced device status streams
//! - Completion detection (platform signal plus a stalled-position
//!   heuristic)
//! - App lifecycle reconciliation
//! - Debounced last-played persistence and restore
//!
//! # Architecture
//!
//! The platform audio subsystem is reached only through the
//! [`AudioBackend`] and [`AudioHandle`] traits; persistence goes
//! through `chorus_core::StateStore`. [`Player`] is the synchronous
//! core state machine; [`Controller`] wraps it in a shared mutex and
//! drives each load's status stream on a background task.
//!
//! # Example
//!
//! ```rust,no_run
//! use chorus_playback::{Controller, PlaybackConfig};
//! use chorus_core::Track;
//! use std::sync::Arc;
//!
//! # async fn demo(
//! #     backend: Arc<dyn chorus_playback::AudioBackend>,
//! #     store: Arc<dyn chorus_core::StateStore>,
//! # ) -> chorus_playback::Result<()> {
//! let controller = Controller::new(backend, store, PlaybackConfig::default());
//! controller.restore().await?;
//!
//! let track = Track::new("t1", "My Song", "Artist", "https://cdn.example/t1.mp3");
//! controller.add_to_queue(vec![track.clone()]).await?;
//! controller.load_and_play(track).await?;
//! controller.seek(30_000).await?;
//! controller.toggle_play_pause().await?;
//! # Ok(())
//! # }
//! ```

pub mod controller;
pub mod device;
pub mod error;
pub mod events;
mod persist;
pub mod player;
pub mod queue;
pub mod stall;
pub mod testing;
pub mod types;

pub use controller::Controller;
pub use device::{AudioBackend, AudioHandle, HandleStatus, LoadedHandle};
pub use error::{PlaybackError, Result};
pub use events::PlaybackEvent;
pub use player::{CompletionAction, Player, StatusWatch};
pub use queue::Queue;
pub use stall::StallDetector;
pub use types::{
    AppLifecycle, PlaybackConfig, StatePublisher, TransportPhase, TransportSnapshot,
    TransportState,
};
