//! Playback statistics

use std::time::{Duration, Instant};

/// Session-level statistics
#[derive(Debug, Clone)]
pub struct PlaybackStats {
    /// When playback started
    pub started_at: Instant,
    /// Ticks executed
    pub ticks: u64,
    /// Ticks that read fresh frames
    pub fresh_ticks: u64,
    /// Ticks that re-showed a cached frame set
    pub replayed_ticks: u64,
    /// Fresh reads triggered by stepping past the newest frame while frozen
    pub peeks: u64,
    /// Operator commands applied
    pub commands: u64,
    /// Commands answered with a notice instead of a state change
    pub notices: u64,
    /// Frames shown across all windows
    pub frames_shown: u64,
}

impl Default for PlaybackStats {
    fn default() -> Self {
        Self {
            started_at: Instant::now(),
            ticks: 0,
            fresh_ticks: 0,
            replayed_ticks: 0,
            peeks: 0,
            commands: 0,
            notices: 0,
            frames_shown: 0,
        }
    }
}

impl PlaybackStats {
    /// Create new stats tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Time since playback started
    pub fn duration(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Achieved tick rate
    pub fn tick_rate(&self) -> f64 {
        let secs = self.duration().as_secs_f64();
        if secs > 0.0 {
            self.ticks as f64 / secs
        } else {
            0.0
        }
    }

    /// Share of ticks spent replaying history, in percent
    pub fn replay_ratio(&self) -> f64 {
        if self.ticks > 0 {
            self.replayed_ticks as f64 * 100.0 / self.ticks as f64
        } else {
            0.0
        }
    }
}
