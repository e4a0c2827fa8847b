//! A single FM note: carrier/modulator phase pair and a percussive
//! attack-decay-release envelope.

use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

use crate::synth::midi_to_hz;

/// Carrier waveform per orb kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Sawtooth,
    Triangle,
}

impl Waveform {
    /// Evaluate at phase (radians).
    #[inline]
    pub fn sample(self, phase: f32) -> f32 {
        let t = phase / (2.0 * PI); // 0..1
        match self {
            Waveform::Sine => phase.sin(),
            Waveform::Sawtooth => 2.0 * t - 1.0,
            Waveform::Triangle => {
                if t < 0.5 {
                    4.0 * t - 1.0
                } else {
                    3.0 - 4.0 * t
                }
            }
        }
    }
}

/// Fixed percussive pluck shared by every voice, regardless of waveform.
#[derive(Debug, Clone, Copy)]
pub struct Envelope {
    pub attack_sec: f32,
    pub decay_sec: f32,
    pub sustain: f32,
    pub release_sec: f32,
}

impl Default for Envelope {
    fn default() -> Self {
        Self {
            attack_sec: 0.05,
            decay_sec: 0.30,
            sustain: 0.0,
            release_sec: 0.05,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnvStage {
    Attack,
    Decay,
    Release,
    Done,
}

/// One sounding FM note inside the bank.
pub struct FmNote {
    pub note: u8,
    amp: f32,
    waveform: Waveform,
    carrier_phase: f32,
    carrier_inc: f32,
    mod_phase: f32,
    mod_inc: f32,
    mod_index: f32,
    env: Envelope,
    stage: EnvStage,
    stage_pos: f32, // seconds into the current stage
    level: f32,     // envelope level at last sample
    dt: f32,
}

impl FmNote {
    pub fn new(
        note: u8,
        velocity: u8,
        waveform: Waveform,
        env: Envelope,
        sample_rate: f32,
    ) -> Self {
        let freq = midi_to_hz(note);
        let two_pi = 2.0 * PI;
        Self {
            note,
            amp: (velocity.min(127) as f32) / 127.0,
            waveform,
            carrier_phase: 0.0,
            carrier_inc: two_pi * freq / sample_rate,
            mod_phase: 0.0,
            // Modulator at the carrier frequency (1:1 ratio), mild index.
            mod_inc: two_pi * freq / sample_rate,
            mod_index: 1.0,
            env,
            stage: EnvStage::Attack,
            stage_pos: 0.0,
            level: 0.0,
            dt: 1.0 / sample_rate,
        }
    }

    /// Begin the release stage from the current level.
    pub fn stop(&mut self) {
        if self.stage != EnvStage::Done {
            self.stage = EnvStage::Release;
            self.stage_pos = 0.0;
        }
    }

    pub fn is_done(&self) -> bool {
        self.stage == EnvStage::Done
    }

    fn envelope_step(&mut self) -> f32 {
        match self.stage {
            EnvStage::Attack => {
                let len = self.env.attack_sec.max(self.dt);
                self.level = (self.stage_pos / len).min(1.0);
                self.stage_pos += self.dt;
                if self.stage_pos >= len {
                    self.stage = EnvStage::Decay;
                    self.stage_pos = 0.0;
                }
            }
            EnvStage::Decay => {
                let len = self.env.decay_sec.max(self.dt);
                let t = (self.stage_pos / len).min(1.0);
                self.level = 1.0 + (self.env.sustain - 1.0) * t;
                self.stage_pos += self.dt;
                if self.stage_pos >= len {
                    // Sustain 0.0 makes the pluck: fall straight to release.
                    self.stage = EnvStage::Release;
                    self.stage_pos = 0.0;
                }
            }
            EnvStage::Release => {
                let len = self.env.release_sec.max(self.dt);
                let from = self.level;
                let t = (self.stage_pos / len).min(1.0);
                self.level = from * (1.0 - t);
                self.stage_pos += self.dt;
                if self.level <= 1e-4 || self.stage_pos >= len {
                    self.level = 0.0;
                    self.stage = EnvStage::Done;
                }
            }
            EnvStage::Done => self.level = 0.0,
        }
        self.level
    }

    pub fn next_sample(&mut self) -> f32 {
        if self.stage == EnvStage::Done {
            return 0.0;
        }
        let env = self.envelope_step();
        let two_pi = 2.0 * PI;
        self.mod_phase = (self.mod_phase + self.mod_inc) % two_pi;
        let modulation = self.mod_index * self.mod_phase.sin();
        self.carrier_phase = (self.carrier_phase + self.carrier_inc) % two_pi;
        let phase = (self.carrier_phase + modulation).rem_euclid(two_pi);
        self.waveform.sample(phase) * env * self.amp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_retires_after_pluck() {
        let mut note = FmNote::new(60, 100, Waveform::Sine, Envelope::default(), 48_000.0);
        // Attack + decay + release is 0.4 s; half a second is plenty.
        for _ in 0..24_000 {
            let s = note.next_sample();
            assert!(s.is_finite());
        }
        assert!(note.is_done());
    }

    #[test]
    fn stop_cuts_into_release() {
        let mut note = FmNote::new(60, 100, Waveform::Triangle, Envelope::default(), 48_000.0);
        for _ in 0..1_000 {
            note.next_sample();
        }
        note.stop();
        // Release is 0.05 s = 2400 samples.
        for _ in 0..3_000 {
            note.next_sample();
        }
        assert!(note.is_done());
    }

    #[test]
    fn velocity_scales_amplitude() {
        let mut quiet = FmNote::new(60, 20, Waveform::Sine, Envelope::default(), 48_000.0);
        let mut loud = FmNote::new(60, 120, Waveform::Sine, Envelope::default(), 48_000.0);
        let mut peak_quiet = 0.0f32;
        let mut peak_loud = 0.0f32;
        for _ in 0..10_000 {
            peak_quiet = peak_quiet.max(quiet.next_sample().abs());
            peak_loud = peak_loud.max(loud.next_sample().abs());
        }
        assert!(peak_loud > peak_quiet * 2.0);
    }
}
