//! Domain types shared across the workspace

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single playable audio item with catalog metadata
///
/// Tracks are immutable once fetched from the catalog and are stored
/// by value wherever they travel (queue, last-played record, mirror
/// document).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Unique catalog identifier
    pub id: String,

    /// Track title
    pub title: String,

    /// Artist name
    pub artist: String,

    /// Playable URL (remote or local file)
    pub url: String,

    /// Cover art URL (optional)
    pub cover_url: Option<String>,

    /// Nominal duration in milliseconds; may be stale or unknown
    pub duration_ms: Option<u64>,

    /// Catalog creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Track {
    /// Create a track with the required fields; cover and duration unset
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        artist: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            url: url.into(),
            cover_url: None,
            duration_ms: None,
            created_at: Utc::now(),
        }
    }

    /// A track is queueable only with a non-empty id and title
    pub fn is_valid(&self) -> bool {
        !self.id.is_empty() && !self.title.is_empty()
    }
}

/// One page of catalog results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackPage {
    /// Tracks in this page, ordered by creation time
    pub tracks: Vec<Track>,

    /// Total number of tracks matching the query
    pub total: u64,
}

/// Persisted snapshot of the last-played transport state
///
/// Written (debounced) on every transport-affecting operation and read
/// once at startup to resume playback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastPlayed {
    /// The track that was loaded
    pub track: Track,

    /// Playback position in milliseconds
    pub position_ms: u64,

    /// Whether playback was running
    pub is_playing: bool,
}
