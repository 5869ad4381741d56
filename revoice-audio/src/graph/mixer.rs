//! Output mixer - master gain and mix-bus limiting

/// Final gain stage before the output device or render sink.
pub struct OutputMixer {
    /// Master volume
    master_volume: f32,
    /// Smoothed master volume (interpolates toward master_volume to prevent clicks)
    smoothed_master_volume: f32,
}

impl OutputMixer {
    /// Smoothing coefficient for master volume (~5ms at 44.1kHz)
    const MASTER_VOLUME_SMOOTH_COEFF: f32 = 0.995;
}

impl Default for OutputMixer {
    fn default() -> Self {
        Self {
            master_volume: 1.0,
            smoothed_master_volume: 1.0,
        }
    }
}

impl OutputMixer {
    /// Create a new mixer at unity gain
    pub fn new() -> Self {
        Self::default()
    }

    /// Set master volume
    pub fn set_master_volume(&mut self, volume: f32) {
        self.master_volume = volume.clamp(0.0, 2.0);
    }

    /// Get master volume
    pub fn master_volume(&self) -> f32 {
        self.master_volume
    }

    /// Snap the smoother to its target. Call before an offline pass so the
    /// first rendered block is identical run to run.
    pub fn reset_smoothing(&mut self) {
        self.smoothed_master_volume = self.master_volume;
    }

    /// Apply master gain and soft clipping to an interleaved stereo block.
    /// Uses per-sample smoothing to prevent clicks during volume changes.
    pub fn process(&mut self, samples: &mut [f32]) {
        for frame in samples.chunks_exact_mut(2) {
            // Smooth master volume toward target
            self.smoothed_master_volume = Self::MASTER_VOLUME_SMOOTH_COEFF
                * self.smoothed_master_volume
                + (1.0 - Self::MASTER_VOLUME_SMOOTH_COEFF) * self.master_volume;

            frame[0] = soft_clip(frame[0] * self.smoothed_master_volume);
            frame[1] = soft_clip(frame[1] * self.smoothed_master_volume);
        }
    }
}

/// Safety clipper for the mix bus
///
/// Identity through the whole legal range: anything inside [-1, 1] passes
/// bit-exact, so unity gain never colors a clean source. Overs compress
/// back inside full scale.
#[inline(always)]
fn soft_clip(x: f32) -> f32 {
    if x > 1.0 {
        1.0 - 1.0 / (1.0 + (x - 1.0) * 2.0)
    } else if x < -1.0 {
        -1.0 + 1.0 / (1.0 + (-x - 1.0) * 2.0)
    } else {
        x
    }
}
