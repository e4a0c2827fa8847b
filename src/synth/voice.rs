//! Per-orb polyphonic synthesizer: FM oscillator bank into a fixed
//! effect chain, with ramped collision-driven effect sends.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::music::{scale_tones, Root, Tonality};
use crate::synth::effects::{Decimator, Delay, Flanger, Reverb, Tremolo};
use crate::synth::fm::{Envelope, FmNote};

pub use crate::synth::fm::Waveform;

/// Per-tick step for every ramped effect parameter; a full 0→1 sweep
/// converges in 50 ticks (~0.8 s at 60 Hz).
pub const RAMP_STEP: f32 = 0.02;

/// Bound on simultaneous notes inside one voice.
const MAX_NOTES: usize = 16;

/// Steady-state effect sends a collision ramps toward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectTargets {
    pub delay: f32,
    pub reverb: f32,
    pub flanger: f32,
    pub distortion: f32,
    pub tremolo_depth: f32,
    /// Applied immediately when present; the LFO is phase-continuous.
    pub tremolo_rate_hz: Option<f32>,
}

/// One (current, target) effect parameter pair.
#[derive(Debug, Clone, Copy, Default)]
struct Ramped {
    current: f32,
    target: f32,
}

impl Ramped {
    fn set_target(&mut self, target: f32) {
        self.target = target.clamp(0.0, 1.0);
    }

    /// Nudge current toward target by one step, clamping at the target.
    fn advance(&mut self) {
        if self.current < self.target {
            self.current = (self.current + RAMP_STEP).min(self.target);
        } else if self.current > self.target {
            self.current = (self.current - RAMP_STEP).max(self.target);
        }
    }
}

pub struct OrbSynth {
    waveform: Waveform,
    envelope: Envelope,
    sample_rate: f32,
    notes: Vec<FmNote>,
    pool: Vec<u8>,
    octave_range: u8,
    rng: SmallRng,

    delay_send: Ramped,
    reverb_send: Ramped,
    flanger_send: Ramped,
    distortion_send: Ramped,
    tremolo_send: Ramped,

    delay: Delay,
    reverb: Reverb,
    flanger: Flanger,
    decimator: Decimator,
    tremolo: Tremolo,
}

impl OrbSynth {
    pub fn new(waveform: Waveform, sample_rate: f32, seed: u64) -> Self {
        Self {
            waveform,
            envelope: Envelope::default(),
            sample_rate,
            notes: Vec::new(),
            // Every voice starts in C major; the pool is never empty after this.
            pool: scale_tones(Root::C, Tonality::Major).to_vec(),
            octave_range: 0,
            rng: SmallRng::seed_from_u64(seed),
            delay_send: Ramped::default(),
            reverb_send: Ramped::default(),
            flanger_send: Ramped::default(),
            distortion_send: Ramped::default(),
            tremolo_send: Ramped::default(),
            delay: Delay::new(0.6, 0.7, sample_rate),
            reverb: Reverb::new(sample_rate),
            flanger: Flanger::new(0.3, 1.0, 0.6, sample_rate),
            decimator: Decimator::new(0.08),
            tremolo: Tremolo::new(3.0, sample_rate),
        }
    }

    /// Replace the note pool; a note already sounding is unaffected.
    pub fn set_scale(&mut self, root: Root, tonality: Tonality) {
        self.pool = scale_tones(root, tonality).to_vec();
        debug!(%root, %tonality, "scale set");
    }

    /// One-time octave offset derived from orb size at spawn.
    pub fn set_octave_range(&mut self, octave: u8) {
        self.octave_range = octave.min(6);
    }

    pub fn octave_range(&self) -> u8 {
        self.octave_range
    }

    /// Pick a pool note uniformly at random and trigger it. Repeats are
    /// allowed; a sounding instance of the same note is stopped first.
    pub fn play_random(&mut self, velocity: u8) {
        if self.pool.is_empty() {
            return;
        }
        let idx = self.rng.random_range(0..self.pool.len());
        let note = self.pool[idx] + self.octave_range * 12;
        self.stop_note(note);
        if self.notes.len() >= MAX_NOTES {
            self.notes.remove(0);
        }
        self.notes.push(FmNote::new(
            note,
            velocity.min(127),
            self.waveform,
            self.envelope,
            self.sample_rate,
        ));
        debug!(note, velocity, "note on");
    }

    fn stop_note(&mut self, note: u8) {
        for sounding in self.notes.iter_mut().filter(|n| n.note == note) {
            sounding.stop();
        }
    }

    pub fn active_notes(&self) -> usize {
        self.notes.len()
    }

    pub fn set_target_delay(&mut self, target: f32) {
        self.delay_send.set_target(target);
    }

    pub fn set_target_reverb(&mut self, target: f32) {
        self.reverb_send.set_target(target);
    }

    pub fn set_target_flanger(&mut self, target: f32) {
        self.flanger_send.set_target(target);
    }

    pub fn set_target_distortion(&mut self, target: f32) {
        self.distortion_send.set_target(target);
    }

    pub fn set_target_tremolo(&mut self, target: f32) {
        self.tremolo_send.set_target(target);
    }

    pub fn set_tremolo_rate(&mut self, hz: f32) {
        self.tremolo.set_frequency(hz);
    }

    /// Apply a full collision target set.
    pub fn set_targets(&mut self, targets: &EffectTargets) {
        self.set_target_delay(targets.delay);
        self.set_target_reverb(targets.reverb);
        self.set_target_flanger(targets.flanger);
        self.set_target_distortion(targets.distortion);
        self.set_target_tremolo(targets.tremolo_depth);
        if let Some(hz) = targets.tremolo_rate_hz {
            self.set_tremolo_rate(hz);
        }
    }

    /// Once per simulation tick: converge each effect send toward its
    /// target and publish the smoothed values into the chain.
    pub fn advance_effect_ramp(&mut self) {
        self.delay_send.advance();
        self.reverb_send.advance();
        self.flanger_send.advance();
        self.distortion_send.advance();
        self.tremolo_send.advance();

        self.delay.mix = self.delay_send.current;
        self.reverb.mix = self.reverb_send.current;
        self.flanger.mix = self.flanger_send.current;
        self.decimator.mix = self.distortion_send.current;
        self.tremolo.depth = self.tremolo_send.current;
    }

    pub fn current_levels(&self) -> [f32; 5] {
        [
            self.delay_send.current,
            self.reverb_send.current,
            self.flanger_send.current,
            self.distortion_send.current,
            self.tremolo_send.current,
        ]
    }

    pub fn target_levels(&self) -> [f32; 5] {
        [
            self.delay_send.target,
            self.reverb_send.target,
            self.flanger_send.target,
            self.distortion_send.target,
            self.tremolo_send.target,
        ]
    }

    pub fn tremolo_rate(&self) -> f32 {
        self.tremolo.frequency()
    }

    /// Additively render into `buf` through the fixed chain:
    /// FM bank → delay → reverb → flanger → decimator → tremolo.
    pub fn render(&mut self, buf: &mut [f32]) {
        for slot in buf.iter_mut() {
            let mut dry = 0.0f32;
            for note in self.notes.iter_mut() {
                dry += note.next_sample();
            }
            let mut s = self.delay.process(dry);
            s = self.reverb.process(s);
            s = self.flanger.process(s);
            s = self.decimator.process(s);
            s = self.tremolo.process(s);
            *slot += s;
        }
        self.notes.retain(|n| !n.is_done());
    }
}
