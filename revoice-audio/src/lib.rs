//! Voice filter engine for revoice - presets, filter graph, offline render
//!
//! This crate provides the processing pipeline behind playback and export:
//! - Preset: Named parameter bundles for the built-in voice filters
//! - FilterGraph: Fixed chain of player, speed, pitch, distortion, reverb, mixer
//! - AudioEngine: Transport, device output and the offline render entry point
//! - RenderHandle: Awaitable result of a file render

mod engine;
mod error;
mod graph;
pub mod preset;
mod render;

pub use engine::{AudioEngine, EngineConfig, PlaybackState};
pub use error::EngineError;
pub use graph::{BlockStatus, FilterGraph};
pub use preset::{DistortionParams, Preset};
pub use render::{RenderHandle, RenderOutput};
