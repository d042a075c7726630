//! Chorus - Room Synchronization
//!
//! Shared listening rooms for Chorus: each room has one remote mirror
//! document holding the room's transport state. Joined participants
//! push their local transport changes to it wholesale and reconcile
//! remote changes back into their own transport.
//!
//! This crate provides:
//! - Mirror document types and well-formedness checks
//! - The [`MirrorStore`] seam with scoped subscriptions
//! - A pure reconciliation planner ([`reconcile::plan`])
//! - The [`RoomSync`] actor tying it to a playback [`Controller`]
//! - An in-memory store for tests and single-process demos
//!
//! Synchronization is soft real-time by design: last-writer-wins
//! writes plus a seek deadband, no locking, eventual convergence.
//!
//! [`Controller`]: chorus_playback::Controller

pub mod error;
pub mod memory;
pub mod reconcile;
pub mod store;
pub mod sync;
pub mod types;

pub use error::{Result, RoomError};
pub use memory::MemoryMirrorStore;
pub use reconcile::{RemoteAction, SEEK_DEADBAND_MS};
pub use store::{MirrorStore, Subscription};
pub use sync::RoomSync;
pub use types::{MirrorDocument, MirrorTrack};
