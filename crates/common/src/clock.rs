//! Tick clock for the fixed-rate host loop.
//!
//! The presence pipeline is designed for a fixed tick rate. Gesture windows
//! are measured in elapsed frame time, cooldowns in ticks; this clock keeps
//! both views consistent.

use std::time::Duration;

/// Frame timing information for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickInfo {
    /// Zero-based tick counter.
    pub index: u64,

    /// Seconds of frame time covered by this tick.
    pub elapsed_secs: f64,

    /// Seconds since the clock started, at the end of this tick.
    pub time_secs: f64,
}

/// A fixed-rate tick clock anchored to a wall-clock epoch.
#[derive(Debug, Clone)]
pub struct TickClock {
    rate_hz: u32,
    next_index: u64,

    /// Wall-clock time at epoch (RFC 3339 string).
    epoch_wall: String,
}

impl TickClock {
    /// Create a clock ticking at `rate_hz`, anchored to now.
    ///
    /// A rate of zero is treated as 1 Hz.
    pub fn start(rate_hz: u32) -> Self {
        Self {
            rate_hz: rate_hz.max(1),
            next_index: 0,
            epoch_wall: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Ticks per second.
    pub fn rate_hz(&self) -> u32 {
        self.rate_hz
    }

    /// Frame time of one tick in seconds.
    pub fn fixed_delta_secs(&self) -> f64 {
        1.0 / self.rate_hz as f64
    }

    /// Frame time of one tick as a `Duration` (for timer scheduling).
    pub fn fixed_delta(&self) -> Duration {
        Duration::from_secs_f64(self.fixed_delta_secs())
    }

    /// Advance by one tick.
    pub fn advance(&mut self) -> TickInfo {
        let index = self.next_index;
        self.next_index += 1;
        TickInfo {
            index,
            elapsed_secs: self.fixed_delta_secs(),
            time_secs: self.next_index as f64 * self.fixed_delta_secs(),
        }
    }

    /// Number of ticks issued so far.
    pub fn ticks_elapsed(&self) -> u64 {
        self.next_index
    }

    /// Seconds of frame time issued so far.
    pub fn elapsed_secs(&self) -> f64 {
        self.next_index as f64 * self.fixed_delta_secs()
    }

    /// Number of whole ticks needed to cover `secs` of frame time.
    pub fn ticks_for(&self, secs: f64) -> u64 {
        if secs <= 0.0 {
            return 0;
        }
        (secs * self.rate_hz as f64).ceil() as u64
    }

    /// Wall-clock time at clock start.
    pub fn epoch_wall(&self) -> &str {
        &self.epoch_wall
    }
}
