//! Media I/O for revoice - source decoding and rendered output
//!
//! Everything that enters or leaves the engine passes through this crate:
//! - `AudioClip`: decoded PCM in the engine's one fixed format
//! - `load_clip`: Symphonia decode, channel fold, resample to 44.1 kHz
//! - `WavSink`: incremental 16-bit WAV writer for offline renders

mod clip;
mod loader;
mod writer;

pub use clip::{AudioClip, CHANNELS, SAMPLE_RATE};
pub use loader::{load_clip, LoadError};
pub use writer::{SinkError, WavSink};
