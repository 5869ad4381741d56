//! Incremental WAV output for offline renders
//!
//! The render loop appends one block at a time, so the sink wraps a
//! streaming `hound` writer instead of buffering the whole take.

use crate::clip::{CHANNELS, SAMPLE_RATE};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from creating or writing the output file
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("WAV write error: {0}")]
    Wav(#[from] hound::Error),
}

/// Streaming 16-bit PCM WAV writer in the engine's fixed format.
pub struct WavSink {
    writer: hound::WavWriter<BufWriter<File>>,
    frames_written: u64,
    path: PathBuf,
}

impl WavSink {
    /// Create the output file. An existing file at `path` is truncated.
    pub fn create(path: &Path) -> Result<Self, SinkError> {
        let spec = hound::WavSpec {
            channels: CHANNELS as u16,
            sample_rate: SAMPLE_RATE,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let writer = hound::WavWriter::create(path, spec)?;
        Ok(Self {
            writer,
            frames_written: 0,
            path: path.to_path_buf(),
        })
    }

    /// Append interleaved stereo samples, clamped to [-1, 1] and scaled
    /// to 16-bit integers.
    pub fn write_frames(&mut self, interleaved: &[f32]) -> Result<(), SinkError> {
        for &sample in interleaved {
            let clamped = sample.clamp(-1.0, 1.0);
            self.writer.write_sample((clamped * 32767.0) as i16)?;
        }
        self.frames_written += (interleaved.len() / CHANNELS) as u64;
        Ok(())
    }

    /// Frames appended so far.
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Finish the header and close the file, returning the frame count.
    pub fn finalize(self) -> Result<u64, SinkError> {
        let frames = self.frames_written;
        self.writer.finalize()?;
        Ok(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_and_finalize() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");

        let mut sink = WavSink::create(&path).unwrap();
        let block = vec![0.25f32; 512 * CHANNELS];
        sink.write_frames(&block).unwrap();
        sink.write_frames(&block).unwrap();
        assert_eq!(sink.frames_written(), 1024);

        let frames = sink.finalize().unwrap();
        assert_eq!(frames, 1024);

        let reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, CHANNELS as u16);
        assert_eq!(spec.sample_rate, SAMPLE_RATE);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(reader.len() as u64, 1024 * CHANNELS as u64);
    }

    #[test]
    fn test_samples_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hot.wav");

        let mut sink = WavSink::create(&path).unwrap();
        sink.write_frames(&[2.0, -2.0]).unwrap();
        sink.finalize().unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![32767, -32767]);
    }

    #[test]
    fn test_create_in_missing_directory_fails() {
        // No Debug on the sink (hound's writer has none), so match the
        // Result directly instead of unwrap_err
        let result = WavSink::create(Path::new("/nonexistent/dir/out.wav"));
        assert!(matches!(result, Err(SinkError::Wav(_))));
    }
}
