//! Distortion stage
//!
//! Tanh waveshaper with a dB pre-gain ahead of the curve and a wet/dry
//! blend behind it. Output is normalized by 1/tanh(gain) so a full-scale
//! input still peaks at full scale regardless of drive.

/// Pre-gain range in dB
const MIN_PRE_GAIN_DB: f32 = -80.0;
const MAX_PRE_GAIN_DB: f32 = 20.0;

#[derive(Debug, Clone, Copy)]
pub struct Distortion {
    pre_gain_db: f32,
    /// Wet/dry percentage, 0 = fully dry
    mix: f32,
    // Cached per parameter change, not per sample
    gain: f32,
    norm: f32,
}

impl Distortion {
    pub fn new() -> Self {
        let mut d = Self {
            pre_gain_db: 0.0,
            mix: 0.0,
            gain: 1.0,
            norm: 1.0,
        };
        d.set_pre_gain_db(-6.0);
        d
    }

    /// Set the pre-gain in dB, clamped to [-80, 20].
    pub fn set_pre_gain_db(&mut self, db: f32) {
        self.pre_gain_db = db.clamp(MIN_PRE_GAIN_DB, MAX_PRE_GAIN_DB);
        self.gain = 10.0f32.powf(self.pre_gain_db / 20.0);
        self.norm = 1.0 / self.gain.tanh();
    }

    /// Set the wet/dry mix percentage, clamped to [0, 100].
    pub fn set_mix(&mut self, mix: f32) {
        self.mix = mix.clamp(0.0, 100.0);
    }

    pub fn pre_gain_db(&self) -> f32 {
        self.pre_gain_db
    }

    pub fn mix(&self) -> f32 {
        self.mix
    }

    pub fn is_bypassed(&self) -> bool {
        self.mix == 0.0
    }

    /// Shape one interleaved block in place.
    pub fn process(&mut self, samples: &mut [f32]) {
        if self.is_bypassed() {
            return;
        }

        let wet = self.mix / 100.0;
        let dry = 1.0 - wet;
        for sample in samples.iter_mut() {
            let shaped = (*sample * self.gain).tanh() * self.norm;
            *sample = *sample * dry + shaped * wet;
        }
    }
}

impl Default for Distortion {
    fn default() -> Self {
        Self::new()
    }
}
