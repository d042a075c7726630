//! Mirror document types
//!
//! The mirror document is the remote shared record of a room's
//! transport state, keyed by room id. It is written wholesale by
//! whichever participant last changed state (last-writer-wins) and
//! read continuously by all joined participants.

use chorus_core::Track;
use chorus_playback::TransportSnapshot;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Track fields carried by the mirror document
///
/// The document does not carry the catalog id; a participant applying
/// a remote track change synthesizes a transient identity instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MirrorTrack {
    pub url: String,
    pub title: String,
    pub artist: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl MirrorTrack {
    /// Whether all required string fields are present and non-empty
    pub fn is_well_formed(&self) -> bool {
        !self.url.is_empty() && !self.title.is_empty() && !self.artist.is_empty()
    }

    /// Build a transient [`Track`] with a synthesized identity
    pub fn to_track(&self) -> Track {
        let mut track = Track::new(
            format!("room:{}", Uuid::new_v4()),
            self.title.clone(),
            self.artist.clone(),
            self.url.clone(),
        );
        track.cover_url = self.cover_url.clone();
        track.duration_ms = self.duration_ms;
        track
    }

    /// Mirror fields of a local track
    pub fn from_track(track: &Track) -> Self {
        Self {
            url: track.url.clone(),
            title: track.title.clone(),
            artist: track.artist.clone(),
            cover_url: track.cover_url.clone(),
            duration_ms: track.duration_ms,
        }
    }
}

/// The shared transport state of one room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MirrorDocument {
    pub current_track: Option<MirrorTrack>,
    pub is_playing: bool,
    pub current_time_ms: u64,
    /// Unix timestamp in milliseconds of the last write
    pub last_updated: i64,
}

impl MirrorDocument {
    /// Capture the local transport state as a fresh document
    pub fn from_snapshot(snapshot: &TransportSnapshot) -> Self {
        Self {
            current_track: snapshot.current_track.as_ref().map(MirrorTrack::from_track),
            is_playing: snapshot.is_playing,
            current_time_ms: snapshot.position_ms,
            last_updated: chrono::Utc::now().timestamp_millis(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_requires_all_string_fields() {
        let mut track = MirrorTrack {
            url: "https://cdn.example/a.mp3".to_string(),
            title: "Song".to_string(),
            artist: "Artist".to_string(),
            cover_url: None,
            duration_ms: None,
        };
        assert!(track.is_well_formed());

        track.title = String::new();
        assert!(!track.is_well_formed());
    }

    #[test]
    fn synthesized_tracks_get_fresh_room_ids() {
        let mirror = MirrorTrack {
            url: "https://cdn.example/a.mp3".to_string(),
            title: "Song".to_string(),
            artist: "Artist".to_string(),
            cover_url: Some("https://cdn.example/a.jpg".to_string()),
            duration_ms: Some(180_000),
        };

        let a = mirror.to_track();
        let b = mirror.to_track();

        assert!(a.id.starts_with("room:"));
        assert_ne!(a.id, b.id);
        assert_eq!(a.url, mirror.url);
        assert_eq!(a.duration_ms, Some(180_000));
    }
}
