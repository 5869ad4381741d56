//! Reverb stage
//!
//! Freeverb topology: eight parallel lowpass-feedback combs into four
//! series allpasses per channel, right channel detuned by a small spread.
//! Room size and damping are fixed at a hall-like setting; the only
//! parameter is the wet/dry mix percentage.

/// Comb delay lengths in samples at 44.1 kHz (Freeverb tunings)
const COMB_TUNINGS: [usize; 8] = [1116, 1188, 1277, 1356, 1422, 1491, 1557, 1617];

/// Allpass delay lengths in samples at 44.1 kHz
const ALLPASS_TUNINGS: [usize; 4] = [556, 441, 341, 225];

/// Stereo spread in samples
const STEREO_SPREAD: usize = 23;

/// Fixed hall character
const ROOM_SIZE: f32 = 0.75;
const DAMPING: f32 = 0.4;
const WIDTH: f32 = 1.0;

/// Lowpass-feedback comb filter
struct CombFilter {
    buffer: Vec<f32>,
    index: usize,
    filter_store: f32,
}

impl CombFilter {
    fn new(size: usize) -> Self {
        Self {
            buffer: vec![0.0; size],
            index: 0,
            filter_store: 0.0,
        }
    }

    fn process(&mut self, input: f32, feedback: f32, damping: f32) -> f32 {
        let output = self.buffer[self.index];

        // Lowpass in the feedback path
        self.filter_store = output * (1.0 - damping) + self.filter_store * damping;
        self.buffer[self.index] = input + self.filter_store * feedback;

        self.index = (self.index + 1) % self.buffer.len();
        output
    }

    fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.filter_store = 0.0;
        self.index = 0;
    }
}

/// Schroeder allpass diffuser
struct AllpassFilter {
    buffer: Vec<f32>,
    index: usize,
}

impl AllpassFilter {
    fn new(size: usize) -> Self {
        Self {
            buffer: vec![0.0; size],
            index: 0,
        }
    }

    fn process(&mut self, input: f32) -> f32 {
        let buffered = self.buffer[self.index];
        let output = -input + buffered;

        self.buffer[self.index] = input + buffered * 0.5;

        self.index = (self.index + 1) % self.buffer.len();
        output
    }

    fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.index = 0;
    }
}

/// Stereo reverb stage
pub struct Reverb {
    comb_l: [CombFilter; 8],
    allpass_l: [AllpassFilter; 4],
    comb_r: [CombFilter; 8],
    allpass_r: [AllpassFilter; 4],

    /// Wet/dry percentage as applied (clamped to 0-100)
    mix: f32,

    // Cached on parameter change
    feedback: f32,
    wet1: f32,
    wet2: f32,
    dry: f32,
}

impl Reverb {
    pub fn new() -> Self {
        let comb_l = std::array::from_fn(|i| CombFilter::new(COMB_TUNINGS[i]));
        let allpass_l = std::array::from_fn(|i| AllpassFilter::new(ALLPASS_TUNINGS[i]));
        let comb_r = std::array::from_fn(|i| CombFilter::new(COMB_TUNINGS[i] + STEREO_SPREAD));
        let allpass_r =
            std::array::from_fn(|i| AllpassFilter::new(ALLPASS_TUNINGS[i] + STEREO_SPREAD));

        let mut reverb = Self {
            comb_l,
            allpass_l,
            comb_r,
            allpass_r,
            mix: 0.0,
            feedback: 0.0,
            wet1: 0.0,
            wet2: 0.0,
            dry: 1.0,
        };
        reverb.update_cached();
        reverb
    }

    fn update_cached(&mut self) {
        self.feedback = ROOM_SIZE * 0.24 + 0.6;
        let wet = self.mix / 100.0;
        self.wet1 = wet * (WIDTH * 0.5 + 0.5);
        self.wet2 = wet * ((1.0 - WIDTH) * 0.5);
        self.dry = 1.0 - wet;
    }

    /// Set the wet/dry mix percentage. Values outside 0-100 clamp, so an
    /// over-range preset value pins the stage fully wet.
    pub fn set_mix(&mut self, mix: f32) {
        self.mix = mix.clamp(0.0, 100.0);
        self.update_cached();
    }

    pub fn mix(&self) -> f32 {
        self.mix
    }

    pub fn is_bypassed(&self) -> bool {
        self.mix == 0.0
    }

    fn process_sample(&mut self, left: f32, right: f32) -> (f32, f32) {
        // Attenuated mono sum feeds both comb banks
        let input = (left + right) * 0.25;

        let mut out_l = 0.0;
        let mut out_r = 0.0;
        for comb in &mut self.comb_l {
            out_l += comb.process(input, self.feedback, DAMPING);
        }
        for comb in &mut self.comb_r {
            out_r += comb.process(input, self.feedback, DAMPING);
        }

        // Eight combs summed
        out_l *= 0.125;
        out_r *= 0.125;

        for allpass in &mut self.allpass_l {
            out_l = allpass.process(out_l);
        }
        for allpass in &mut self.allpass_r {
            out_r = allpass.process(out_r);
        }

        let final_l = out_l * self.wet1 + out_r * self.wet2 + left * self.dry;
        let final_r = out_r * self.wet1 + out_l * self.wet2 + right * self.dry;

        (soft_clip(final_l), soft_clip(final_r))
    }

    /// Process one interleaved stereo block in place.
    pub fn process(&mut self, samples: &mut [f32]) {
        if self.is_bypassed() {
            return;
        }

        for chunk in samples.chunks_exact_mut(2) {
            let (l, r) = self.process_sample(chunk[0], chunk[1]);
            chunk[0] = l;
            chunk[1] = r;
        }
    }

    /// Flush all delay lines. The mix parameter is untouched.
    pub fn reset(&mut self) {
        for comb in &mut self.comb_l {
            comb.reset();
        }
        for comb in &mut self.comb_r {
            comb.reset();
        }
        for allpass in &mut self.allpass_l {
            allpass.reset();
        }
        for allpass in &mut self.allpass_r {
            allpass.reset();
        }
    }
}

impl Default for Reverb {
    fn default() -> Self {
        Self::new()
    }
}

/// Soft clipper, identity inside [-1, 1]
fn soft_clip(x: f32) -> f32 {
    if x > 1.0 {
        1.0 - 1.0 / (1.0 + (x - 1.0) * 2.0)
    } else if x < -1.0 {
        -1.0 + 1.0 / (1.0 + (-x - 1.0) * 2.0)
    } else {
        x
    }
}
