/// Collaborator traits for Chorus
///
/// The catalog and local persistence layers live outside the playback
/// core; these traits are the only surface the core sees.
use crate::error::Result;
use crate::types::{LastPlayed, Track, TrackPage};
use async_trait::async_trait;

/// Read-only song catalog
///
/// Implementers query the remote catalog, ordered by creation time,
/// with offset/limit pagination.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Fetch one page of tracks
    async fn list_tracks(&self, offset: u64, limit: u64) -> Result<TrackPage>;
}

/// Local key-value persistence for playback state
///
/// Backs three records: the last-played snapshot, the serialized
/// queue, and the last-joined room id. Failures are expected to be
/// non-fatal to playback; callers log and continue.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Read the last-played record, if any
    async fn load_last_played(&self) -> Result<Option<LastPlayed>>;

    /// Write the last-played record
    async fn save_last_played(&self, record: &LastPlayed) -> Result<()>;

    /// Read the persisted queue (empty if never saved)
    async fn load_queue(&self) -> Result<Vec<Track>>;

    /// Write the queue
    async fn save_queue(&self, tracks: &[Track]) -> Result<()>;

    /// Read the last-joined room id, if any
    async fn load_room_id(&self) -> Result<Option<String>>;

    /// Write the last-joined room id
    async fn save_room_id(&self, room_id: &str) -> Result<()>;

    /// Clear the last-joined room id
    async fn clear_room_id(&self) -> Result<()>;
}
