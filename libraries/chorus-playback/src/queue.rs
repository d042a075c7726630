//! Queue management
//!
//! An ordered working set of tracks with shuffle/repeat policy and
//! playlist-context wraparound. Add is a set-union keyed on track id:
//! the queue never holds two tracks with the same id.

use crate::error::{PlaybackError, Result};
use chorus_core::Track;
use rand::Rng;
use tracing::warn;

/// The ordered working set the transport plays through
#[derive(Debug, Clone, Default)]
pub struct Queue {
    tracks: Vec<Track>,

    shuffle: bool,
    repeat: bool,

    /// Set when the queue was derived from a named playlist; enables
    /// wraparound at the queue boundaries
    playlist_context: Option<String>,
}

impl Queue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Append tracks, skipping invalid entries and ids already queued
    ///
    /// Returns the number of tracks appended. Rejects the whole call
    /// if no track survives filtering, leaving the queue unchanged.
    pub fn add(&mut self, tracks: Vec<Track>) -> Result<usize> {
        let valid: Vec<Track> = tracks.into_iter().filter(Track::is_valid).collect();
        if valid.is_empty() {
            warn!("No valid tracks to add to queue");
            return Err(PlaybackError::NoValidTracks);
        }

        let mut fresh: Vec<Track> = Vec::new();
        for track in valid {
            let seen = self.tracks.iter().any(|t| t.id == track.id)
                || fresh.iter().any(|t: &Track| t.id == track.id);
            if !seen {
                fresh.push(track);
            }
        }

        if fresh.is_empty() {
            warn!("All tracks are already in the queue");
            return Err(PlaybackError::DuplicateTracks);
        }

        let added = fresh.len();
        self.tracks.extend(fresh);
        Ok(added)
    }

    /// Remove at most one track by id; returns whether one was removed
    pub fn remove(&mut self, track_id: &str) -> bool {
        if let Some(pos) = self.tracks.iter().position(|t| t.id == track_id) {
            self.tracks.remove(pos);
            true
        } else {
            false
        }
    }

    /// Empty the queue
    pub fn clear(&mut self) {
        self.tracks.clear();
    }

    /// Replace the contents wholesale (restore path); invalid entries
    /// are dropped
    pub fn replace(&mut self, tracks: Vec<Track>) {
        self.tracks = tracks.into_iter().filter(Track::is_valid).collect();
    }

    /// Set the shuffle flag (in-memory only)
    pub fn set_shuffle(&mut self, shuffle: bool) {
        self.shuffle = shuffle;
    }

    /// Set the repeat flag (in-memory only)
    pub fn set_repeat(&mut self, repeat: bool) {
        self.repeat = repeat;
    }

    /// Record whether the queue came from a named playlist
    pub fn set_playlist_context(&mut self, playlist_id: Option<String>) {
        self.playlist_context = playlist_id;
    }

    /// Current shuffle flag
    pub fn shuffle(&self) -> bool {
        self.shuffle
    }

    /// Current repeat flag
    pub fn repeat(&self) -> bool {
        self.repeat
    }

    /// Current playlist context
    pub fn playlist_context(&self) -> Option<&str> {
        self.playlist_context.as_deref()
    }

    /// Tracks in queue order
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Number of queued tracks
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Resolve the track after `current`
    ///
    /// Repeat returns `current` unchanged (the caller replays it).
    /// Shuffle returns a uniformly random member; immediate repeats
    /// are allowed. Otherwise linear traversal by id: an absent
    /// current falls back to the first track, and the forward boundary
    /// wraps to the first track only under a playlist context.
    pub fn next_of(&self, current: Option<&Track>) -> Option<Track> {
        self.neighbor_of(current, Direction::Forward)
    }

    /// Resolve the track before `current`
    ///
    /// Mirror of [`next_of`](Self::next_of): the backward boundary
    /// wraps to the last track only under a playlist context. An
    /// absent current falls back to the first track here too.
    pub fn previous_of(&self, current: Option<&Track>) -> Option<Track> {
        self.neighbor_of(current, Direction::Backward)
    }

    fn neighbor_of(&self, current: Option<&Track>, direction: Direction) -> Option<Track> {
        if self.tracks.is_empty() {
            return None;
        }

        if self.repeat {
            return current.cloned();
        }

        if self.shuffle {
            let index = rand::thread_rng().gen_range(0..self.tracks.len());
            return Some(self.tracks[index].clone());
        }

        let position = current.and_then(|c| self.tracks.iter().position(|t| t.id == c.id));
        let Some(index) = position else {
            return self.tracks.first().cloned();
        };

        match direction {
            Direction::Forward => {
                if index + 1 == self.tracks.len() {
                    if self.playlist_context.is_some() {
                        self.tracks.first().cloned()
                    } else {
                        None
                    }
                } else {
                    Some(self.tracks[index + 1].clone())
                }
            }
            Direction::Backward => {
                if index == 0 {
                    if self.playlist_context.is_some() {
                        self.tracks.last().cloned()
                    } else {
                        None
                    }
                } else {
                    Some(self.tracks[index - 1].clone())
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Forward,
    Backward,
}
