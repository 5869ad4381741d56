//! Varispeed stage parameters
//!
//! Resampling speed control: the player's read cursor advances by this
//! rate, so pitch shifts along with playback speed. The stage holds and
//! validates the parameter; the interpolated read itself happens in the
//! player.

/// Lowest supported rate (quarter speed).
pub const MIN_RATE: f32 = 0.25;
/// Highest supported rate (quadruple speed).
pub const MAX_RATE: f32 = 4.0;

#[derive(Debug, Clone, Copy)]
pub struct Varispeed {
    rate: f32,
}

impl Varispeed {
    pub fn new() -> Self {
        Self { rate: 1.0 }
    }

    /// Set the playback rate multiplier, clamped to the supported range.
    pub fn set_rate(&mut self, rate: f32) {
        self.rate = rate.clamp(MIN_RATE, MAX_RATE);
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    /// True at exactly 1.0, where the read degenerates to a copy.
    pub fn is_neutral(&self) -> bool {
        self.rate == 1.0
    }
}

impl Default for Varispeed {
    fn default() -> Self {
        Self::new()
    }
}
