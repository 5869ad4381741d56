//! Engine facade - transport, device output and offline render entry
//!
//! One engine owns one filter graph behind a mutex. The cpal device
//! callback and the offline render worker are the only block producers,
//! and the playback state plus the render flag decide which of them is
//! allowed to touch the schedule at any moment.

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::Sender;
use parking_lot::Mutex;
use revoice_media::{load_clip, CHANNELS, SAMPLE_RATE};

use crate::error::EngineError;
use crate::graph::FilterGraph;
use crate::preset::Preset;
use crate::render::{run_offline, RenderHandle};

/// Engine tuning knobs
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Largest frame count pulled per offline pass iteration
    pub max_render_block: usize,
    /// Consecutive empty offline passes tolerated before the render aborts
    pub stall_limit: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_render_block: 4096,
            stall_limit: 32,
        }
    }
}

/// Transport state as seen by the device callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PlaybackState {
    Idle = 0,
    Playing = 1,
    Looping = 2,
}

impl PlaybackState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => PlaybackState::Playing,
            2 => PlaybackState::Looping,
            _ => PlaybackState::Idle,
        }
    }
}

/// Voice filter engine
pub struct AudioEngine {
    graph: Arc<Mutex<FilterGraph>>,
    state: Arc<AtomicU8>,
    render_active: Arc<AtomicBool>,
    shutdown: Arc<AtomicBool>,
    stream_thread: Option<JoinHandle<()>>,
    config: EngineConfig,
}

impl AudioEngine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            graph: Arc::new(Mutex::new(FilterGraph::new())),
            state: Arc::new(AtomicU8::new(PlaybackState::Idle as u8)),
            render_active: Arc::new(AtomicBool::new(false)),
            shutdown: Arc::new(AtomicBool::new(false)),
            stream_thread: None,
            config,
        }
    }

    /// Decode a source file and hand it to the player. Stops playback;
    /// the new clip is loaded but not scheduled.
    pub fn load(&mut self, path: &Path) -> Result<(), EngineError> {
        if self.is_rendering() {
            return Err(EngineError::EngineBusy);
        }

        let clip = load_clip(path)?;
        self.state
            .store(PlaybackState::Idle as u8, Ordering::SeqCst);

        let mut graph = self.graph.lock();
        graph.halt();
        graph.load(clip);
        Ok(())
    }

    /// Load a source and play it once from the start.
    pub fn play(&mut self, path: &Path) -> Result<(), EngineError> {
        self.load(path)?;
        self.ensure_output_running()?;

        self.graph.lock().schedule_from_start();
        self.state
            .store(PlaybackState::Playing as u8, Ordering::SeqCst);
        Ok(())
    }

    /// Restart the loaded source looping until `stop`.
    pub fn replay(&mut self) -> Result<(), EngineError> {
        if self.is_rendering() {
            return Err(EngineError::EngineBusy);
        }
        if !self.graph.lock().has_source() {
            return Err(EngineError::NoActiveSource);
        }
        self.ensure_output_running()?;

        self.graph.lock().schedule_from_start();
        self.state
            .store(PlaybackState::Looping as u8, Ordering::SeqCst);
        Ok(())
    }

    /// Stop playback. Safe to call at any time, including when already
    /// stopped or while a render is in flight.
    pub fn stop(&mut self) {
        self.state
            .store(PlaybackState::Idle as u8, Ordering::SeqCst);

        // The render worker owns the schedule until it finishes
        if self.is_rendering() {
            return;
        }
        self.graph.lock().halt();
    }

    /// Copy a preset's parameters into the graph. Takes effect on the
    /// next block, whether live or offline.
    pub fn apply(&mut self, preset: &Preset) {
        self.graph.lock().apply(preset);
    }

    /// Render the loaded source through the current preset into a WAV
    /// file. Playback is force-stopped first; the render then runs on a
    /// worker thread and the returned handle resolves when it finishes.
    /// One render at a time.
    pub fn render_offline(&mut self, dest: &Path) -> Result<RenderHandle, EngineError> {
        if self
            .render_active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(EngineError::EngineBusy);
        }

        if !self.graph.lock().has_source() {
            self.render_active.store(false, Ordering::SeqCst);
            return Err(EngineError::NoActiveSource);
        }

        let previous = self
            .state
            .swap(PlaybackState::Idle as u8, Ordering::SeqCst);
        if PlaybackState::from_u8(previous) != PlaybackState::Idle {
            tracing::debug!("playback stopped for offline render");
        }

        let graph = self.graph.clone();
        let render_active = self.render_active.clone();
        let dest = dest.to_path_buf();
        let config = self.config;
        let (tx, rx) = crossbeam_channel::bounded(1);

        let spawned = thread::Builder::new()
            .name("revoice-render".into())
            .spawn(move || {
                let result = run_offline(&graph, &dest, config);
                render_active.store(false, Ordering::SeqCst);
                let _ = tx.send(result);
            });

        if let Err(e) = spawned {
            self.render_active.store(false, Ordering::SeqCst);
            return Err(EngineError::RenderSetupFailed(e.to_string()));
        }

        Ok(RenderHandle::new(rx))
    }

    pub fn playback_state(&self) -> PlaybackState {
        PlaybackState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn is_rendering(&self) -> bool {
        self.render_active.load(Ordering::SeqCst)
    }

    /// Bring up the output thread and its stream on first use. The
    /// stream is not `Send`, so the thread that builds it keeps it alive
    /// until shutdown.
    fn ensure_output_running(&mut self) -> Result<(), EngineError> {
        if self.stream_thread.is_some() {
            return Ok(());
        }

        let graph = self.graph.clone();
        let state = self.state.clone();
        let shutdown = self.shutdown.clone();
        let (ready_tx, ready_rx) = crossbeam_channel::bounded(1);

        let handle = thread::Builder::new()
            .name("revoice-output".into())
            .spawn(move || run_output_thread(graph, state, shutdown, ready_tx))
            .map_err(|e| EngineError::EngineStartFailed(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                self.stream_thread = Some(handle);
                tracing::info!("audio output running");
                Ok(())
            }
            Ok(Err(message)) => {
                let _ = handle.join();
                Err(EngineError::EngineStartFailed(message))
            }
            Err(_) => {
                let _ = handle.join();
                Err(EngineError::EngineStartFailed(
                    "Output thread exited during startup".into(),
                ))
            }
        }
    }
}

impl Default for AudioEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for AudioEngine {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(handle) = self.stream_thread.take() {
            let _ = handle.join();
        }
        // An in-flight render keeps its own clones and finishes on its own
    }
}

fn run_output_thread(
    graph: Arc<Mutex<FilterGraph>>,
    state: Arc<AtomicU8>,
    shutdown: Arc<AtomicBool>,
    ready_tx: Sender<Result<(), String>>,
) {
    let host = cpal::default_host();
    let device = match host.default_output_device() {
        Some(d) => d,
        None => {
            let _ = ready_tx.send(Err("No audio output device found".into()));
            return;
        }
    };

    // The graph speaks exactly one format; a device that cannot take
    // stereo 44.1 kHz f32 fails the start instead of resampling
    let config = cpal::StreamConfig {
        channels: CHANNELS as u16,
        sample_rate: cpal::SampleRate(SAMPLE_RATE),
        buffer_size: cpal::BufferSize::Default,
    };

    let stream = match device.build_output_stream(
        &config,
        move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
            output_callback(&graph, &state, data);
        },
        |err| {
            tracing::warn!("Audio stream error: {}", err);
        },
        None,
    ) {
        Ok(s) => s,
        Err(e) => {
            let _ = ready_tx.send(Err(format!("Failed to create audio stream: {}", e)));
            return;
        }
    };

    if let Err(e) = stream.play() {
        let _ = ready_tx.send(Err(format!("Failed to start audio: {}", e)));
        return;
    }

    let _ = ready_tx.send(Ok(()));

    while !shutdown.load(Ordering::Relaxed) {
        thread::sleep(Duration::from_millis(10));
    }
    // Dropping the stream here releases the device
}

fn output_callback(graph: &Mutex<FilterGraph>, state: &AtomicU8, data: &mut [f32]) {
    let playback = PlaybackState::from_u8(state.load(Ordering::SeqCst));
    if playback == PlaybackState::Idle {
        data.fill(0.0);
        return;
    }

    // Use try_lock to avoid blocking the real-time audio thread.
    // On contention (rare), output silence rather than blocking.
    let Some(mut graph) = graph.try_lock() else {
        data.fill(0.0);
        return;
    };

    graph.render_block(data);

    if graph.player_finished() {
        match playback {
            PlaybackState::Looping => graph.schedule_from_start(),
            PlaybackState::Playing => {
                state.store(PlaybackState::Idle as u8, Ordering::SeqCst);
            }
            PlaybackState::Idle => {}
        }
    }
}
