//! Fixed processing chain
//!
//! Blocks flow through the stages in one order, always:
//!
//! ```text
//! player -> varispeed -> pitch -> distortion -> reverb -> mixer
//! ```
//!
//! The varispeed stage has no block pass of its own; its rate drives the
//! player's interpolated read so speed changes never reallocate anything.
//! Every other stage processes the interleaved stereo block in place and
//! skips itself entirely at its neutral setting, which keeps the neutral
//! chain bit-transparent.

mod distortion;
mod mixer;
mod pitch;
mod player;
mod reverb;
mod varispeed;

pub use distortion::Distortion;
pub use mixer::OutputMixer;
pub use pitch::PitchShifter;
pub use player::{PullStatus, ScheduleState, SourcePlayer};
pub use reverb::Reverb;
pub use varispeed::Varispeed;

use crate::preset::Preset;
use revoice_media::AudioClip;

/// Outcome of one block pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockStatus {
    /// The chain produced audio; the count is frames written.
    Rendered(usize),
    /// Nothing is scheduled on the player. The block was zeroed.
    Starved,
}

/// The stage chain plus the source player that feeds it.
///
/// Not thread safe by itself; the engine wraps it in a mutex and both the
/// device callback and the offline renderer take the lock per block.
pub struct FilterGraph {
    player: SourcePlayer,
    speed: Varispeed,
    pitch: PitchShifter,
    distortion: Distortion,
    reverb: Reverb,
    mixer: OutputMixer,
}

impl FilterGraph {
    pub fn new() -> Self {
        Self {
            player: SourcePlayer::new(),
            speed: Varispeed::new(),
            pitch: PitchShifter::new(),
            distortion: Distortion::new(),
            reverb: Reverb::new(),
            mixer: OutputMixer::new(),
        }
    }

    /// Hand a decoded clip to the player. Playback does not start until
    /// the clip is scheduled.
    pub fn load(&mut self, clip: AudioClip) {
        self.player.load(clip);
    }

    /// Schedule the loaded clip from frame zero.
    pub fn schedule_from_start(&mut self) {
        self.player.schedule_from_start();
    }

    /// Drop the schedule, keeping the clip loaded.
    pub fn halt(&mut self) {
        self.player.halt();
    }

    pub fn has_source(&self) -> bool {
        self.player.has_clip()
    }

    /// Length of the loaded clip in frames, zero when nothing is loaded.
    pub fn source_frames(&self) -> u64 {
        self.player.clip_frames()
    }

    /// True once a scheduled clip has been read to its end.
    pub fn player_finished(&self) -> bool {
        self.player.finished()
    }

    /// Copy a preset's values into the stages. Parameters take effect on
    /// the next block.
    pub fn apply(&mut self, preset: &Preset) {
        self.speed.set_rate(preset.speed);
        self.pitch.set_cents(preset.pitch_cents);
        self.distortion.set_pre_gain_db(preset.distortion.pre_gain_db);
        self.distortion.set_mix(preset.distortion.mix);
        self.reverb.set_mix(preset.reverb_mix);
    }

    /// Pull one interleaved stereo block through the whole chain.
    ///
    /// `out.len()` must be an even sample count; the frame count rendered
    /// is `out.len() / 2`.
    pub fn render_block(&mut self, out: &mut [f32]) -> BlockStatus {
        let rate = f64::from(self.speed.rate());
        if self.player.fill(out, rate) == PullStatus::Pending {
            out.fill(0.0);
            return BlockStatus::Starved;
        }

        self.pitch.process(out);
        self.distortion.process(out);
        self.reverb.process(out);
        self.mixer.process(out);

        BlockStatus::Rendered(out.len() / revoice_media::CHANNELS)
    }

    /// Prepare a deterministic offline pass: flush every piece of DSP
    /// state and schedule the clip from frame zero. Returns the source
    /// length in frames, which is the pass's frame target.
    pub fn begin_offline(&mut self) -> u64 {
        self.reset_dsp();
        self.player.schedule_from_start();
        self.player.clip_frames()
    }

    /// Tear down after an offline pass so a later realtime start does not
    /// replay tail state.
    pub fn end_offline(&mut self) {
        self.player.halt();
        self.reset_dsp();
    }

    fn reset_dsp(&mut self) {
        self.pitch.reset();
        self.reverb.reset();
        self.mixer.reset_smoothing();
    }
}

impl Default for FilterGraph {
    fn default() -> Self {
        Self::new()
    }
}
