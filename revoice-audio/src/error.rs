//! Engine error taxonomy

use revoice_media::LoadError;
use thiserror::Error;

/// Errors surfaced by engine operations
#[derive(Error, Debug)]
pub enum EngineError {
    /// The source file could not be decoded into a clip
    #[error("Source unreadable: {0}")]
    SourceUnreadable(#[from] LoadError),

    /// The operation needs a loaded source and none is present
    #[error("No active source")]
    NoActiveSource,

    /// The output device or stream could not be brought up
    #[error("Engine start failed: {0}")]
    EngineStartFailed(String),

    /// The render destination could not be created
    #[error("Render setup failed: {0}")]
    RenderSetupFailed(String),

    /// A rendered block could not be written to the destination
    #[error("Render write failed: {0}")]
    RenderWriteFailed(String),

    /// The renderer made no progress for too many consecutive passes
    #[error("Render stalled after {passes} empty passes")]
    RenderStalled { passes: u32 },

    /// A render is already in flight
    #[error("Engine busy: render in progress")]
    EngineBusy,
}
