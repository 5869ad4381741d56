//! Audio source loading and decoding
//!
//! Decodes any Symphonia-supported container/codec and converts the result
//! to the engine's fixed format: interleaved stereo f32 at 44.1 kHz.

use crate::clip::{AudioClip, CHANNELS, SAMPLE_RATE};
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while opening or decoding a source
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("No audio track found in file")]
    NoAudioTrack,
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("Decode error: {0}")]
    Decode(String),
    #[error("Resample error: {0}")]
    Resample(String),
}

/// Load and decode an audio file into the fixed engine format.
pub fn load_clip(path: &Path) -> Result<AudioClip, LoadError> {
    let file = std::fs::File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| LoadError::Decode(e.to_string()))?;

    let mut format = probed.format;

    // First decodable audio track wins
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(LoadError::NoAudioTrack)?;

    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let source_rate = codec_params.sample_rate.unwrap_or(SAMPLE_RATE);
    let channels = codec_params
        .channels
        .map(|c| c.count())
        .unwrap_or(CHANNELS);
    if channels == 0 {
        return Err(LoadError::UnsupportedFormat(
            "track reports zero channels".into(),
        ));
    }

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| LoadError::Decode(e.to_string()))?;

    let mut samples: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(_) => break,
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(_) => continue,
        };

        let spec = *decoded.spec();
        let capacity = decoded.capacity() as u64;

        let mut sample_buf = SampleBuffer::<f32>::new(capacity, spec);
        sample_buf.copy_interleaved_ref(decoded);
        samples.extend_from_slice(sample_buf.samples());
    }

    let stereo = fold_to_stereo(samples, channels);
    let stereo = if source_rate != SAMPLE_RATE {
        resample_stereo(&stereo, source_rate)?
    } else {
        stereo
    };

    debug!(
        path = %path.display(),
        frames = stereo.len() / CHANNELS,
        source_rate,
        source_channels = channels,
        "decoded source"
    );

    Ok(AudioClip::new(stereo))
}

/// Convert an interleaved buffer of `channels` channels to interleaved
/// stereo. Mono is duplicated; wider layouts keep the first two channels.
fn fold_to_stereo(samples: Vec<f32>, channels: usize) -> Vec<f32> {
    match channels {
        2 => samples,
        1 => {
            let mut stereo = Vec::with_capacity(samples.len() * 2);
            for s in samples {
                stereo.push(s);
                stereo.push(s);
            }
            stereo
        }
        n => {
            let frames = samples.len() / n;
            let mut stereo = Vec::with_capacity(frames * 2);
            for f in 0..frames {
                stereo.push(samples[f * n]);
                stereo.push(samples[f * n + 1]);
            }
            stereo
        }
    }
}

/// Resample interleaved stereo to the fixed engine rate.
fn resample_stereo(samples: &[f32], source_rate: u32) -> Result<Vec<f32>, LoadError> {
    use rubato::{FftFixedInOut, Resampler};

    let frames = samples.len() / CHANNELS;

    let mut resampler = FftFixedInOut::<f32>::new(
        source_rate as usize,
        SAMPLE_RATE as usize,
        1024,
        CHANNELS,
    )
    .map_err(|e| LoadError::Resample(e.to_string()))?;

    // Deinterleave into per-channel buffers
    let deinterleaved: Vec<Vec<f32>> = (0..CHANNELS)
        .map(|ch| {
            (0..frames)
                .map(|f| samples[f * CHANNELS + ch])
                .collect()
        })
        .collect();

    let chunk_size = resampler.input_frames_next();
    let mut output: Vec<Vec<f32>> = vec![Vec::new(); CHANNELS];

    let mut pos = 0;
    while pos + chunk_size <= frames {
        let input_refs: Vec<&[f32]> = deinterleaved
            .iter()
            .map(|ch| &ch[pos..pos + chunk_size])
            .collect();

        let resampled = resampler
            .process(&input_refs, None)
            .map_err(|e| LoadError::Resample(e.to_string()))?;

        for (ch, data) in resampled.into_iter().enumerate() {
            output[ch].extend(data);
        }

        pos += chunk_size;
    }

    // Pad the tail chunk with zeros, keep only the proportional output
    if pos < frames {
        let remaining = frames - pos;
        let padded: Vec<Vec<f32>> = deinterleaved
            .iter()
            .map(|ch| {
                let mut v = ch[pos..].to_vec();
                v.resize(chunk_size, 0.0);
                v
            })
            .collect();

        let input_refs: Vec<&[f32]> = padded.iter().map(|v| v.as_slice()).collect();

        let resampled = resampler
            .process(&input_refs, None)
            .map_err(|e| LoadError::Resample(e.to_string()))?;

        let keep = (remaining * SAMPLE_RATE as usize) / source_rate as usize;
        for (ch, data) in resampled.into_iter().enumerate() {
            output[ch].extend(&data[..keep.min(data.len())]);
        }
    }

    // Reinterleave
    let out_frames = output[0].len();
    let mut interleaved = Vec::with_capacity(out_frames * CHANNELS);
    for f in 0..out_frames {
        for channel in &output {
            interleaved.push(channel[f]);
        }
    }

    Ok(interleaved)
}
