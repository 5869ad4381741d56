//! Source player stage
//!
//! A player node with an explicit schedule: a clip is loaded once and
//! scheduled per playback pass. After the scheduled data runs out the
//! stage keeps producing silence; with nothing scheduled it produces
//! nothing at all and the pull reports that.
//!
//! The read cursor is fractional so the varispeed rate can be applied
//! directly here with linear interpolation between adjacent frames.

use revoice_media::{AudioClip, CHANNELS};

/// Schedule state of the player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleState {
    /// Nothing queued; pulls produce no data
    Unscheduled,
    /// Reading through the scheduled clip
    Scheduled,
    /// Scheduled data exhausted; pulls produce silence
    Completed,
}

/// Outcome of a single pull
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullStatus {
    /// Output fully written (source data, then trailing silence)
    Filled,
    /// Nothing scheduled this pass; output left untouched
    Pending,
}

pub struct SourcePlayer {
    clip: Option<AudioClip>,
    /// Fractional read cursor in source frames
    position: f64,
    state: ScheduleState,
}

impl SourcePlayer {
    pub fn new() -> Self {
        Self {
            clip: None,
            position: 0.0,
            state: ScheduleState::Unscheduled,
        }
    }

    /// Install a clip. Any previous schedule is dropped; the new clip
    /// waits unscheduled until the next `schedule_from_start`.
    pub fn load(&mut self, clip: AudioClip) {
        self.clip = Some(clip);
        self.position = 0.0;
        self.state = ScheduleState::Unscheduled;
    }

    /// Queue the loaded clip from frame zero. No-op without a clip.
    pub fn schedule_from_start(&mut self) {
        if self.clip.is_some() {
            self.position = 0.0;
            self.state = ScheduleState::Scheduled;
        }
    }

    /// Drop the schedule but keep the clip loaded.
    pub fn halt(&mut self) {
        self.state = ScheduleState::Unscheduled;
        self.position = 0.0;
    }

    pub fn has_clip(&self) -> bool {
        self.clip.is_some()
    }

    /// Length of the loaded clip in frames, zero without a clip.
    pub fn clip_frames(&self) -> u64 {
        self.clip.as_ref().map(AudioClip::frames).unwrap_or(0)
    }

    pub fn state(&self) -> ScheduleState {
        self.state
    }

    pub fn finished(&self) -> bool {
        self.state == ScheduleState::Completed
    }

    /// Pull one block of interleaved stereo at the given rate.
    ///
    /// The cursor advances by `rate` source frames per output frame;
    /// output frames are linearly interpolated between the two source
    /// frames around the cursor. A rate of exactly 1.0 is a bit-exact
    /// copy.
    pub fn fill(&mut self, out: &mut [f32], rate: f64) -> PullStatus {
        match self.state {
            ScheduleState::Unscheduled => PullStatus::Pending,
            ScheduleState::Completed => {
                out.fill(0.0);
                PullStatus::Filled
            }
            ScheduleState::Scheduled => {
                let Some(clip) = self.clip.as_ref() else {
                    return PullStatus::Pending;
                };
                let samples = clip.samples();
                let frames = samples.len() / CHANNELS;

                let mut done = false;
                for chunk in out.chunks_exact_mut(CHANNELS) {
                    if done || self.position >= frames as f64 {
                        done = true;
                        chunk[0] = 0.0;
                        chunk[1] = 0.0;
                        continue;
                    }

                    let i0 = self.position as usize;
                    let frac = (self.position - i0 as f64) as f32;
                    let i1 = (i0 + 1).min(frames - 1);

                    chunk[0] = samples[i0 * CHANNELS] * (1.0 - frac)
                        + samples[i1 * CHANNELS] * frac;
                    chunk[1] = samples[i0 * CHANNELS + 1] * (1.0 - frac)
                        + samples[i1 * CHANNELS + 1] * frac;

                    self.position += rate;
                }

                if done || self.position >= frames as f64 {
                    self.state = ScheduleState::Completed;
                }
                PullStatus::Filled
            }
        }
    }
}

impl Default for SourcePlayer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp_clip(frames: usize) -> AudioClip {
        let mut samples = Vec::with_capacity(frames * CHANNELS);
        for i in 0..frames {
            samples.push(i as f32);
            samples.push(-(i as f32));
        }
        AudioClip::new(samples)
    }

    #[test]
    fn test_unscheduled_pull_is_pending() {
        let mut player = SourcePlayer::new();
        player.load(ramp_clip(16));

        let mut out = vec![7.0f32; 8];
        assert_eq!(player.fill(&mut out, 1.0), PullStatus::Pending);
        assert!(out.iter().all(|&s| s == 7.0), "output must stay untouched");
    }

    #[test]
    fn test_unit_rate_is_exact_copy() {
        let mut player = SourcePlayer::new();
        let clip = ramp_clip(8);
        player.load(clip.clone());
        player.schedule_from_start();

        let mut out = vec![0.0f32; 8 * CHANNELS];
        assert_eq!(player.fill(&mut out, 1.0), PullStatus::Filled);
        assert_eq!(out.as_slice(), clip.samples());
        assert!(player.finished());
    }

    #[test]
    fn test_exhaustion_pads_with_silence() {
        let mut player = SourcePlayer::new();
        player.load(ramp_clip(4));
        player.schedule_from_start();

        let mut out = vec![1.0f32; 8 * CHANNELS];
        player.fill(&mut out, 1.0);
        assert_eq!(out[0], 0.0); // frame 0, left = ramp start
        assert_eq!(out[6], 3.0); // frame 3, left = ramp end
        assert!(out[8..].iter().all(|&s| s == 0.0), "tail must be silent");
        assert!(player.finished());

        // Further pulls deliver pure silence
        let mut next = vec![1.0f32; 4];
        assert_eq!(player.fill(&mut next, 1.0), PullStatus::Filled);
        assert!(next.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_double_rate_skips_frames() {
        let mut player = SourcePlayer::new();
        player.load(ramp_clip(8));
        player.schedule_from_start();

        let mut out = vec![0.0f32; 4 * CHANNELS];
        player.fill(&mut out, 2.0);
        // Integer cursor steps land exactly on every other frame
        assert_eq!(out[0], 0.0);
        assert_eq!(out[2], 2.0);
        assert_eq!(out[4], 4.0);
        assert_eq!(out[6], 6.0);
        assert!(player.finished());
    }

    #[test]
    fn test_halt_drops_schedule_keeps_clip() {
        let mut player = SourcePlayer::new();
        player.load(ramp_clip(8));
        player.schedule_from_start();
        player.halt();

        assert!(player.has_clip());
        assert_eq!(player.state(), ScheduleState::Unscheduled);

        let mut out = vec![0.0f32; 4];
        assert_eq!(player.fill(&mut out, 1.0), PullStatus::Pending);
    }

    #[test]
    fn test_empty_clip_completes_immediately() {
        let mut player = SourcePlayer::new();
        player.load(AudioClip::new(Vec::new()));
        player.schedule_from_start();

        let mut out = vec![3.0f32; 4];
        assert_eq!(player.fill(&mut out, 1.0), PullStatus::Filled);
        assert!(out.iter().all(|&s| s == 0.0));
        assert!(player.finished());
    }

    #[test]
    fn test_reschedule_restarts_from_zero() {
        let mut player = SourcePlayer::new();
        player.load(ramp_clip(4));
        player.schedule_from_start();

        let mut out = vec![0.0f32; 4 * CHANNELS];
        player.fill(&mut out, 1.0);
        assert!(player.finished());

        player.schedule_from_start();
        let mut again = vec![0.0f32; 4 * CHANNELS];
        player.fill(&mut again, 1.0);
        assert_eq!(again, out);
    }
}
