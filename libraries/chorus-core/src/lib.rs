//! Chorus Core
//!
//! Platform-agnostic core types, traits, and error handling for Chorus.
//!
//! This crate provides the foundational building blocks shared by the
//! playback, room-sync, and storage crates:
//! - **Domain Types**: [`Track`], [`LastPlayed`], [`TrackPage`]
//! - **Collaborator Traits**: [`Catalog`], [`StateStore`]
//! - **Error Handling**: unified [`ChorusError`] and [`Result`] types
//!
//! # Example
//!
//! ```rust
//! use chorus_core::Track;
//!
//! let track = Track::new("t1", "My Favorite Song", "Some Artist", "https://cdn.example/t1.mp3");
//! assert!(track.is_valid());
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod traits;
pub mod types;

pub use error::{ChorusError, Result};
pub use traits::{Catalog, StateStore};
pub use types::{LastPlayed, Track, TrackPage};
