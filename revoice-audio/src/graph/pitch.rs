//! Phase vocoder pitch shifter
//!
//! Classic STFT bin-shifting vocoder: analyze overlapping windowed frames,
//! turn bin phase deltas into true frequencies, remap bins by the pitch
//! ratio, then resynthesize with accumulated phases and overlap-add.
//!
//! The stage is parameterized in cents. Zero cents bypasses it entirely,
//! which keeps the neutral chain bit-exact and skips the FFT latency.

use revoice_media::{CHANNELS, SAMPLE_RATE};
use rustfft::num_complex::Complex32;
use rustfft::{Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

const TWO_PI: f32 = 2.0 * PI;

/// Analysis/synthesis frame length in samples
const FFT_SIZE: usize = 1024;
/// Overlap factor; the hop is FFT_SIZE / OVERSAMPLE
const OVERSAMPLE: usize = 4;
const STEP: usize = FFT_SIZE / OVERSAMPLE;
/// Input FIFO latency before the first synthesized sample emerges
const LATENCY: usize = FFT_SIZE - STEP;
const HALF: usize = FFT_SIZE / 2;

/// Ratio clamp, two octaves either way
const MIN_RATIO: f32 = 0.25;
const MAX_RATIO: f32 = 4.0;

/// Sum of the squared Hann window across the hop grid at 4x overlap
const WINDOW_OVERLAP_SUM: f32 = 1.5;

/// Overlap-add gain: 1/FFT_SIZE normalizes the unnormalized inverse FFT,
/// 2/OVERSAMPLE spreads a frame across its hops, and the squared-window
/// overlap sum is divided out so a steady tone resynthesizes near unity.
const ACCUM_SCALE: f32 = 2.0 / (FFT_SIZE as f32 * OVERSAMPLE as f32 * WINDOW_OVERLAP_SUM);

/// Convert a shift in cents to a frequency ratio (100 cents = 1 semitone).
pub fn ratio_for_cents(cents: f32) -> f32 {
    2.0f32.powf(cents / 1200.0).clamp(MIN_RATIO, MAX_RATIO)
}

/// Per-channel vocoder state
struct PitchChannel {
    rover: usize,
    in_fifo: [f32; FFT_SIZE],
    out_fifo: [f32; FFT_SIZE],
    output_accum: [f32; FFT_SIZE],
    fft_buffer: Vec<Complex32>,
    window: [f32; FFT_SIZE],
    last_phase: [f32; HALF + 1],
    sum_phase: [f32; HALF + 1],
    ana_magn: [f32; HALF + 1],
    ana_freq: [f32; HALF + 1],
    syn_magn: [f32; HALF + 1],
    syn_freq: [f32; HALF + 1],
    syn_weight: [f32; HALF + 1],
    temp_input: Vec<f32>,
    temp_output: Vec<f32>,
    fft_forward: Arc<dyn Fft<f32>>,
    fft_inverse: Arc<dyn Fft<f32>>,
}

impl PitchChannel {
    fn new(fft_forward: Arc<dyn Fft<f32>>, fft_inverse: Arc<dyn Fft<f32>>) -> Self {
        let mut window = [0.0f32; FFT_SIZE];
        for (i, w) in window.iter_mut().enumerate() {
            let phase = TWO_PI * i as f32 / FFT_SIZE as f32;
            *w = 0.5 * (1.0 - phase.cos());
        }

        Self {
            rover: LATENCY,
            in_fifo: [0.0; FFT_SIZE],
            out_fifo: [0.0; FFT_SIZE],
            output_accum: [0.0; FFT_SIZE],
            fft_buffer: vec![Complex32::new(0.0, 0.0); FFT_SIZE],
            window,
            last_phase: [0.0; HALF + 1],
            sum_phase: [0.0; HALF + 1],
            ana_magn: [0.0; HALF + 1],
            ana_freq: [0.0; HALF + 1],
            syn_magn: [0.0; HALF + 1],
            syn_freq: [0.0; HALF + 1],
            syn_weight: [0.0; HALF + 1],
            temp_input: Vec::new(),
            temp_output: Vec::new(),
            fft_forward,
            fft_inverse,
        }
    }

    fn reset(&mut self) {
        self.rover = LATENCY;
        self.in_fifo.fill(0.0);
        self.out_fifo.fill(0.0);
        self.output_accum.fill(0.0);
        self.last_phase.fill(0.0);
        self.sum_phase.fill(0.0);
    }

    fn ensure_capacity(&mut self, frames: usize) {
        if self.temp_input.len() < frames {
            self.temp_input.resize(frames, 0.0);
            self.temp_output.resize(frames, 0.0);
        }
    }

    /// Run `frames` samples from temp_input through the FIFO into
    /// temp_output, transforming whenever a full analysis frame lands.
    fn run(&mut self, frames: usize, ratio: f32) {
        for i in 0..frames {
            self.in_fifo[self.rover] = self.temp_input[i];
            self.temp_output[i] = self.out_fifo[self.rover - LATENCY];
            self.rover += 1;

            if self.rover >= FFT_SIZE {
                self.transform(ratio);
                self.rover = LATENCY;
            }
        }
    }

    fn transform(&mut self, ratio: f32) {
        let freq_per_bin = SAMPLE_RATE as f32 / FFT_SIZE as f32;
        let expct = TWO_PI * STEP as f32 / FFT_SIZE as f32;
        let oversample = OVERSAMPLE as f32;

        // Analysis: window, transform, phase-difference to true frequency
        for k in 0..FFT_SIZE {
            self.fft_buffer[k] = Complex32::new(self.in_fifo[k] * self.window[k], 0.0);
        }
        self.fft_forward.process(&mut self.fft_buffer);

        for k in 0..=HALF {
            let bin = self.fft_buffer[k];
            let magn = 2.0 * (bin.re * bin.re + bin.im * bin.im).sqrt();
            let phase = bin.im.atan2(bin.re);

            let mut delta = phase - self.last_phase[k];
            self.last_phase[k] = phase;

            // Subtract expected advance and wrap into +/- pi
            delta -= k as f32 * expct;
            let mut qpd = (delta / PI).round() as i32;
            if qpd >= 0 {
                qpd += qpd & 1;
            } else {
                qpd -= qpd & 1;
            }
            delta -= PI * qpd as f32;

            let deviation = oversample * delta / TWO_PI;

            self.ana_magn[k] = magn;
            self.ana_freq[k] = (k as f32 + deviation) * freq_per_bin;
        }

        // Remap bins by the pitch ratio; merged bins average their
        // frequencies and sum their magnitudes
        self.syn_magn.fill(0.0);
        self.syn_freq.fill(0.0);
        self.syn_weight.fill(0.0);

        for k in 0..=HALF {
            let index = (k as f32 * ratio).round() as usize;
            if index <= HALF {
                self.syn_magn[index] += self.ana_magn[k];
                self.syn_freq[index] += self.ana_freq[k] * ratio;
                self.syn_weight[index] += 1.0;
            }
        }
        for k in 0..=HALF {
            if self.syn_weight[k] > 0.0 {
                self.syn_freq[k] /= self.syn_weight[k];
            } else {
                self.syn_freq[k] = k as f32 * freq_per_bin;
            }
        }

        // Synthesis: accumulated phases, conjugate-mirrored spectrum
        self.fft_buffer.fill(Complex32::new(0.0, 0.0));
        for k in 0..=HALF {
            let magn = self.syn_magn[k];
            let mut delta = (self.syn_freq[k] - k as f32 * freq_per_bin) / freq_per_bin;
            delta = TWO_PI * delta / oversample;
            delta += k as f32 * expct;
            self.sum_phase[k] += delta;

            let phase = self.sum_phase[k];
            let re = magn * phase.cos();
            let im = magn * phase.sin();

            if k == 0 || k == HALF {
                self.fft_buffer[k] = Complex32::new(re, 0.0);
            } else {
                self.fft_buffer[k] = Complex32::new(re, im);
                self.fft_buffer[FFT_SIZE - k] = Complex32::new(re, -im);
            }
        }

        self.fft_inverse.process(&mut self.fft_buffer);

        for k in 0..FFT_SIZE {
            self.output_accum[k] += self.fft_buffer[k].re * self.window[k] * ACCUM_SCALE;
        }

        self.out_fifo[..STEP].copy_from_slice(&self.output_accum[..STEP]);
        self.output_accum.copy_within(STEP.., 0);
        self.output_accum[FFT_SIZE - STEP..].fill(0.0);
        self.in_fifo.copy_within(STEP.., 0);
    }
}

/// Pitch shift stage: one vocoder per channel, shared FFT plans.
pub struct PitchShifter {
    cents: f32,
    ratio: f32,
    channels: [PitchChannel; CHANNELS],
}

impl PitchShifter {
    pub fn new() -> Self {
        let mut planner = FftPlanner::<f32>::new();
        let forward = planner.plan_fft_forward(FFT_SIZE);
        let inverse = planner.plan_fft_inverse(FFT_SIZE);

        Self {
            cents: 0.0,
            ratio: 1.0,
            channels: std::array::from_fn(|_| {
                PitchChannel::new(Arc::clone(&forward), Arc::clone(&inverse))
            }),
        }
    }

    /// Set the shift in cents.
    pub fn set_cents(&mut self, cents: f32) {
        self.cents = cents;
        self.ratio = ratio_for_cents(cents);
    }

    pub fn cents(&self) -> f32 {
        self.cents
    }

    pub fn ratio(&self) -> f32 {
        self.ratio
    }

    pub fn is_bypassed(&self) -> bool {
        self.cents == 0.0
    }

    /// Shift one interleaved stereo block in place.
    pub fn process(&mut self, samples: &mut [f32]) {
        if self.is_bypassed() {
            return;
        }

        let frames = samples.len() / CHANNELS;
        for (ch, state) in self.channels.iter_mut().enumerate() {
            state.ensure_capacity(frames);
            for f in 0..frames {
                state.temp_input[f] = samples[f * CHANNELS + ch];
            }
            state.run(frames, self.ratio);
            for f in 0..frames {
                samples[f * CHANNELS + ch] = state.temp_output[f];
            }
        }
    }

    /// Clear FIFOs and phase accumulators. Parameters are untouched.
    pub fn reset(&mut self) {
        for channel in &mut self.channels {
            channel.reset();
        }
    }
}

impl Default for PitchShifter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;

    fn sine_block(freq: f32, frames: usize) -> Vec<f32> {
        let mut samples = Vec::with_capacity(frames * CHANNELS);
        for i in 0..frames {
            let s = (TAU * freq * i as f32 / SAMPLE_RATE as f32).sin() * 0.5;
            samples.push(s);
            samples.push(s);
        }
        samples
    }

    fn left_sign_changes(samples: &[f32], from_frame: usize) -> usize {
        let mut count = 0;
        let mut prev = samples[from_frame * CHANNELS];
        for f in from_frame + 1..samples.len() / CHANNELS {
            let s = samples[f * CHANNELS];
            if (s > 0.0) != (prev > 0.0) {
                count += 1;
            }
            prev = s;
        }
        count
    }

    #[test]
    fn test_ratio_for_cents() {
        assert_eq!(ratio_for_cents(0.0), 1.0);
        assert!((ratio_for_cents(1200.0) - 2.0).abs() < 1e-6);
        assert!((ratio_for_cents(-1200.0) - 0.5).abs() < 1e-6);
        let five_up = 2.0f32.powf(5.0 / 12.0);
        assert!((ratio_for_cents(500.0) - five_up).abs() < 1e-5);
        // Clamped at two octaves
        assert_eq!(ratio_for_cents(90_000.0), MAX_RATIO);
        assert_eq!(ratio_for_cents(-90_000.0), MIN_RATIO);
    }

    #[test]
    fn test_zero_cents_is_bypass() {
        let mut shifter = PitchShifter::new();
        shifter.set_cents(0.0);

        let original = sine_block(440.0, 512);
        let mut samples = original.clone();
        shifter.process(&mut samples);
        assert_eq!(samples, original);
    }

    #[test]
    fn test_octave_up_doubles_frequency() {
        let mut shifter = PitchShifter::new();
        shifter.set_cents(1200.0);

        let frames = 16_384;
        let mut samples = sine_block(440.0, frames);
        shifter.process(&mut samples);

        assert!(samples.iter().all(|s| s.is_finite()));

        // Past the FIFO latency the tone should oscillate at ~880 Hz
        let skip = FFT_SIZE * 4;
        let counted_frames = frames - skip;
        let crossings = left_sign_changes(&samples, skip);
        let expected = (2.0 * 880.0 * counted_frames as f32 / SAMPLE_RATE as f32) as usize;
        let tolerance = expected / 4;
        assert!(
            crossings.abs_diff(expected) < tolerance,
            "expected ~{} sign changes, got {}",
            expected,
            crossings
        );
    }

    #[test]
    fn test_shifted_level_near_unity() {
        let mut shifter = PitchShifter::new();
        shifter.set_cents(-500.0);

        let frames = 16_384;
        let mut samples = sine_block(440.0, frames);
        shifter.process(&mut samples);

        let skip = FFT_SIZE * 4 * CHANNELS;
        let tail = &samples[skip..];
        let rms = (tail.iter().map(|s| s * s).sum::<f32>() / tail.len() as f32).sqrt();
        // Input RMS is 0.5/sqrt(2) ~ 0.354; allow generous vocoder slop
        assert!(
            rms > 0.1 && rms < 0.8,
            "shifted RMS out of range: {}",
            rms
        );
    }

    #[test]
    fn test_small_shift_gain_stays_near_unity() {
        let mut shifter = PitchShifter::new();
        shifter.set_cents(100.0);

        let frames = 16_384;
        let mut samples = sine_block(440.0, frames);
        shifter.process(&mut samples);

        let skip = FFT_SIZE * 4 * CHANNELS;
        let tail = &samples[skip..];
        let out_rms = (tail.iter().map(|s| s * s).sum::<f32>() / tail.len() as f32).sqrt();
        let in_rms = 0.5 / 2.0f32.sqrt();

        // A semitone up must not add audible level; a hot source that was
        // legal going in has to stay close to legal coming out
        let gain = out_rms / in_rms;
        assert!(
            gain > 0.7 && gain < 1.2,
            "steady tone gain out of range: {}",
            gain
        );
    }

    #[test]
    fn test_reset_restores_determinism() {
        let mut shifter = PitchShifter::new();
        shifter.set_cents(700.0);

        let mut first = sine_block(330.0, 4096);
        shifter.process(&mut first);

        shifter.reset();
        let mut second = sine_block(330.0, 4096);
        shifter.process(&mut second);

        assert_eq!(first, second);
    }
}
