//! Stalled-position completion heuristic
//!
//! Some platforms fail to fire a definitive end-of-media signal near
//! track end: playback stays "active" while the position freezes just
//! short of the duration. The detector treats a position frozen across
//! N consecutive status ticks, within a window of the duration, as a
//! completed track.

use crate::device::HandleStatus;

/// Detects a track stuck near its end
#[derive(Debug)]
pub struct StallDetector {
    /// Consecutive ticks required at the same position
    threshold_ticks: u32,

    /// Maximum distance from the duration, in milliseconds
    window_ms: u64,

    /// Position seen on the previous tick
    last_position: Option<u64>,

    /// Ticks observed at `last_position`
    frozen_ticks: u32,
}

impl StallDetector {
    /// Create a detector with the given threshold and near-end window
    pub fn new(threshold_ticks: u32, window_ms: u64) -> Self {
        Self {
            threshold_ticks,
            window_ms,
            last_position: None,
            frozen_ticks: 0,
        }
    }

    /// Feed one status tick; returns true when the stall condition is
    /// met
    ///
    /// The caller is responsible for acting on the first true only;
    /// the detector keeps reporting the condition until reset.
    pub fn observe(&mut self, status: &HandleStatus) -> bool {
        if !status.is_loaded || !status.is_playing || status.duration_ms == 0 {
            self.last_position = None;
            self.frozen_ticks = 0;
            return false;
        }

        if self.last_position == Some(status.position_ms) {
            self.frozen_ticks += 1;
        } else {
            self.last_position = Some(status.position_ms);
            self.frozen_ticks = 1;
        }

        let near_end = status
            .duration_ms
            .saturating_sub(status.position_ms)
            <= self.window_ms;

        self.frozen_ticks >= self.threshold_ticks && near_end
    }

    /// Forget accumulated ticks; call on load, seek, or restart
    pub fn reset(&mut self) {
        self.last_position = None;
        self.frozen_ticks = 0;
    }
}
