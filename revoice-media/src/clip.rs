//! Fixed-format PCM clips shared between the loader and the engine

use std::sync::Arc;

/// Processing sample rate in Hz. The whole graph runs at this rate.
pub const SAMPLE_RATE: u32 = 44_100;

/// Interleaved channel count. The graph is stereo end to end.
pub const CHANNELS: usize = 2;

/// A decoded audio source: interleaved stereo f32 at [`SAMPLE_RATE`].
///
/// Cloning is cheap; the sample data is shared behind an `Arc` so the
/// player can hold the clip while callers keep their own handle.
#[derive(Debug, Clone)]
pub struct AudioClip {
    samples: Arc<Vec<f32>>,
}

impl AudioClip {
    /// Wrap interleaved stereo samples. An odd trailing sample is dropped
    /// so the buffer always holds whole frames.
    pub fn new(mut samples: Vec<f32>) -> Self {
        let whole = samples.len() - samples.len() % CHANNELS;
        samples.truncate(whole);
        Self {
            samples: Arc::new(samples),
        }
    }

    /// Interleaved stereo samples.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Number of stereo frames.
    pub fn frames(&self) -> u64 {
        (self.samples.len() / CHANNELS) as u64
    }

    /// Clip length in seconds at the fixed rate.
    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / SAMPLE_RATE as f64
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_and_duration() {
        let clip = AudioClip::new(vec![0.0; SAMPLE_RATE as usize * CHANNELS]);
        assert_eq!(clip.frames(), SAMPLE_RATE as u64);
        assert!((clip.duration_secs() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_odd_tail_dropped() {
        let clip = AudioClip::new(vec![0.1, 0.2, 0.3]);
        assert_eq!(clip.samples().len(), 2);
        assert_eq!(clip.frames(), 1);
    }

    #[test]
    fn test_empty() {
        let clip = AudioClip::new(Vec::new());
        assert!(clip.is_empty());
        assert_eq!(clip.frames(), 0);
        assert_eq!(clip.duration_secs(), 0.0);
    }
}
