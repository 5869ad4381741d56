//! Offline rendering
//!
//! An offline pass pulls the same graph the device callback pulls, but as
//! fast as the disk allows and with nothing reaching the speakers. The
//! pass is framed by `begin_offline`/`end_offline`, which flush DSP state
//! on both sides so the output depends only on the clip and the applied
//! preset. Equal inputs produce byte-identical files.

use std::path::{Path, PathBuf};

use crossbeam_channel::Receiver;
use parking_lot::Mutex;
use revoice_media::{WavSink, CHANNELS, SAMPLE_RATE};

use crate::engine::EngineConfig;
use crate::error::EngineError;
use crate::graph::{BlockStatus, FilterGraph};

/// Summary of a finished render
#[derive(Debug, Clone)]
pub struct RenderOutput {
    /// Destination file as requested
    pub path: PathBuf,
    /// Frames written to the file
    pub frames: u64,
    /// File duration in seconds
    pub duration_secs: f64,
}

/// Handle to an in-flight render.
///
/// The render runs on its own worker thread; `wait` parks the caller
/// until the worker reports. Dropping the handle does not cancel the
/// render, it only discards the result.
#[derive(Debug)]
pub struct RenderHandle {
    rx: Receiver<Result<RenderOutput, EngineError>>,
}

impl RenderHandle {
    pub(crate) fn new(rx: Receiver<Result<RenderOutput, EngineError>>) -> Self {
        Self { rx }
    }

    /// Block until the render finishes and return its outcome.
    pub fn wait(self) -> Result<RenderOutput, EngineError> {
        match self.rx.recv() {
            Ok(result) => result,
            // Worker died without reporting (panic); surface it as a failure
            Err(_) => Err(EngineError::RenderSetupFailed(
                "Render worker exited without a result".into(),
            )),
        }
    }
}

/// Drive one complete offline pass over the graph.
///
/// The pass target is the source length in frames. Each iteration asks
/// for `min(remaining, max_render_block)` frames; a rendered block goes
/// to the sink, a starved block only bumps the stall counter. The graph
/// lock is taken per block, so a concurrent preset change lands between
/// blocks instead of waiting for the whole file.
pub(crate) fn run_offline(
    graph: &Mutex<FilterGraph>,
    dest: &Path,
    config: EngineConfig,
) -> Result<RenderOutput, EngineError> {
    let target_frames = graph.lock().begin_offline();
    let result = render_to_sink(graph, dest, config, target_frames);
    graph.lock().end_offline();

    if let Ok(output) = &result {
        tracing::info!(
            path = %output.path.display(),
            frames = output.frames,
            "offline render complete"
        );
    }
    result
}

fn render_to_sink(
    graph: &Mutex<FilterGraph>,
    dest: &Path,
    config: EngineConfig,
    target_frames: u64,
) -> Result<RenderOutput, EngineError> {
    let mut sink =
        WavSink::create(dest).map_err(|e| EngineError::RenderSetupFailed(e.to_string()))?;

    let mut block = vec![0.0f32; config.max_render_block * CHANNELS];
    let mut rendered: u64 = 0;
    let mut stalled_passes: u32 = 0;

    while rendered < target_frames {
        let remaining = target_frames - rendered;
        let want = remaining.min(config.max_render_block as u64) as usize;
        let out = &mut block[..want * CHANNELS];

        let status = graph.lock().render_block(out);
        match status {
            BlockStatus::Rendered(frames) => {
                stalled_passes = 0;
                sink.write_frames(out)
                    .map_err(|e| EngineError::RenderWriteFailed(e.to_string()))?;
                rendered += frames as u64;
            }
            BlockStatus::Starved => {
                stalled_passes += 1;
                if stalled_passes >= config.stall_limit {
                    return Err(EngineError::RenderStalled {
                        passes: stalled_passes,
                    });
                }
            }
        }
    }

    let frames = sink
        .finalize()
        .map_err(|e| EngineError::RenderWriteFailed(e.to_string()))?;

    Ok(RenderOutput {
        path: dest.to_path_buf(),
        frames,
        duration_secs: frames as f64 / f64::from(SAMPLE_RATE),
    })
}
