//! Remote reconciliation planning
//!
//! Deciding how to react to a remote document is a pure function from
//! (document, local snapshot) to a list of actions, so the logic is
//! testable without a device or network. Applying the actions is the
//! [`RoomSync`](crate::RoomSync) actor's job.

use crate::types::MirrorDocument;
use chorus_playback::TransportSnapshot;
use tracing::debug;

/// Seek only when remote and local positions differ by more than this;
/// dampens write feedback loops between participants
pub const SEEK_DEADBAND_MS: u64 = 1000;

/// One transport correction derived from a remote update
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteAction {
    /// Remote plays a different url: load the synthesized track
    LoadTrack(chorus_core::Track),

    /// Remote play/pause flag differs: apply without re-publishing
    SetPlaying(bool),

    /// Remote position differs beyond the deadband: seek without
    /// re-publishing
    Seek(u64),
}

/// Compare a remote document against the local snapshot
///
/// A document whose track is missing or malformed produces no actions
/// at all; partial remote data never mutates local state.
pub fn plan(document: &MirrorDocument, local: &TransportSnapshot) -> Vec<RemoteAction> {
    let Some(remote_track) = &document.current_track else {
        debug!("Remote document has no track, ignoring");
        return Vec::new();
    };
    if !remote_track.is_well_formed() {
        debug!("Remote document track is malformed, ignoring");
        return Vec::new();
    }

    let mut actions = Vec::new();

    let local_url = local.current_track.as_ref().map(|t| t.url.as_str());
    if local_url != Some(remote_track.url.as_str()) {
        actions.push(RemoteAction::LoadTrack(remote_track.to_track()));
    }

    if document.is_playing != local.is_playing {
        actions.push(RemoteAction::SetPlaying(document.is_playing));
    }

    let drift = document.current_time_ms.abs_diff(local.position_ms);
    if drift > SEEK_DEADBAND_MS {
        actions.push(RemoteAction::Seek(document.current_time_ms));
    }

    actions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MirrorTrack;
    use chorus_core::Track;

    fn mirror_track(url: &str) -> MirrorTrack {
        MirrorTrack {
            url: url.to_string(),
            title: "Song".to_string(),
            artist: "Artist".to_string(),
            cover_url: None,
            duration_ms: Some(180_000),
        }
    }

    fn document(url: &str, is_playing: bool, current_time_ms: u64) -> MirrorDocument {
        MirrorDocument {
            current_track: Some(mirror_track(url)),
            is_playing,
            current_time_ms,
            last_updated: 0,
        }
    }

    fn local(url: &str, is_playing: bool, position_ms: u64) -> TransportSnapshot {
        TransportSnapshot {
            current_track: Some(Track::new("t1", "Song", "Artist", url)),
            is_playing,
            position_ms,
        }
    }

    #[test]
    fn matching_states_need_no_actions() {
        let doc = document("https://cdn.example/a.mp3", true, 30_000);
        let snap = local("https://cdn.example/a.mp3", true, 30_200);

        assert!(plan(&doc, &snap).is_empty());
    }

    #[test]
    fn differing_url_loads_a_synthesized_track() {
        let doc = document("https://cdn.example/b.mp3", true, 0);
        let snap = local("https://cdn.example/a.mp3", true, 0);

        let actions = plan(&doc, &snap);
        assert_eq!(actions.len(), 1);
        match &actions[0] {
            RemoteAction::LoadTrack(track) => {
                assert_eq!(track.url, "https://cdn.example/b.mp3");
                assert!(track.id.starts_with("room:"));
            }
            other => panic!("unexpected action: {other:?}"),
        }
    }

    #[test]
    fn no_local_track_also_loads() {
        let doc = document("https://cdn.example/a.mp3", false, 0);
        let snap = TransportSnapshot {
            current_track: None,
            is_playing: false,
            position_ms: 0,
        };

        let actions = plan(&doc, &snap);
        assert!(matches!(actions[0], RemoteAction::LoadTrack(_)));
    }

    #[test]
    fn play_flag_mismatch_is_applied() {
        let doc = document("https://cdn.example/a.mp3", false, 0);
        let snap = local("https://cdn.example/a.mp3", true, 0);

        assert_eq!(plan(&doc, &snap), vec![RemoteAction::SetPlaying(false)]);
    }

    #[test]
    fn seek_fires_beyond_the_deadband_only() {
        let snap = local("https://cdn.example/a.mp3", true, 30_000);

        let far = document("https://cdn.example/a.mp3", true, 31_500);
        assert_eq!(plan(&far, &snap), vec![RemoteAction::Seek(31_500)]);

        let near = document("https://cdn.example/a.mp3", true, 30_500);
        assert!(plan(&near, &snap).is_empty());

        // Exactly at the deadband: no seek
        let edge = document("https://cdn.example/a.mp3", true, 31_000);
        assert!(plan(&edge, &snap).is_empty());

        // Remote behind local counts too
        let behind = document("https://cdn.example/a.mp3", true, 28_000);
        assert_eq!(plan(&behind, &snap), vec![RemoteAction::Seek(28_000)]);
    }

    #[test]
    fn malformed_documents_produce_nothing() {
        let mut doc = document("https://cdn.example/b.mp3", false, 99_000);
        doc.current_track.as_mut().unwrap().artist = String::new();
        let snap = local("https://cdn.example/a.mp3", true, 0);

        assert!(plan(&doc, &snap).is_empty());

        let empty = MirrorDocument {
            current_track: None,
            is_playing: false,
            current_time_ms: 99_000,
            last_updated: 0,
        };
        assert!(plan(&empty, &snap).is_empty());
    }

    #[test]
    fn track_play_and_seek_can_all_fire_together() {
        let doc = document("https://cdn.example/b.mp3", false, 60_000);
        let snap = local("https://cdn.example/a.mp3", true, 10_000);

        let actions = plan(&doc, &snap);
        assert_eq!(actions.len(), 3);
        assert!(matches!(actions[0], RemoteAction::LoadTrack(_)));
        assert_eq!(actions[1], RemoteAction::SetPlaying(false));
        assert_eq!(actions[2], RemoteAction::Seek(60_000));
    }
}
