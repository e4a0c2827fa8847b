//! Master bus: the active voice set, global volume, and the output guard.
//!
//! The mixer lives on the render worker thread. Everything the simulation
//! side wants to change arrives as an [`EngineCommand`] and is applied
//! between hop renders, so voice add/remove never races per-sample
//! rendering and the cpal callback never takes a lock.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::audio::limiter::{Limiter, LimiterMeter, LimiterMode};
use crate::music::{Root, Tonality};
use crate::orb::OrbId;
use crate::synth::{EffectTargets, OrbSynth, Waveform};

/// Control messages from the simulation thread to the render worker.
#[derive(Debug, Clone, Copy)]
pub enum EngineCommand {
    AddVoice {
        orb: OrbId,
        waveform: Waveform,
        octave: u8,
    },
    RemoveVoice {
        orb: OrbId,
    },
    SetTargets {
        orb: OrbId,
        targets: EffectTargets,
    },
    PlayNote {
        orb: OrbId,
        velocity: u8,
    },
    SetScale {
        root: Root,
        tonality: Tonality,
    },
    SetMasterVolume(f32),
    /// One simulation tick: advance every voice's effect ramp.
    Tick,
}

pub struct Mixer {
    sample_rate: f32,
    voices: HashMap<OrbId, OrbSynth>,
    master_volume: f32,
    limiter: Limiter,
    seed: u64,
}

impl Mixer {
    pub fn new(sample_rate: u32, guard: LimiterMode, meter: Option<Arc<LimiterMeter>>) -> Self {
        let mut limiter = Limiter::new(guard, sample_rate);
        if let Some(meter) = meter {
            limiter = limiter.with_meter(meter);
        }
        Self {
            sample_rate: sample_rate as f32,
            voices: HashMap::new(),
            master_volume: 1.0,
            limiter,
            seed: 0x6f72_6266, // session-stable; per-voice seeds mix in the orb id
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Attach a voice for an orb. Re-connecting an already connected orb
    /// keeps the existing voice.
    pub fn connect(&mut self, orb: OrbId, waveform: Waveform, octave: u8) {
        if self.voices.contains_key(&orb) {
            debug!(%orb, "connect: voice already on the bus");
            return;
        }
        let seed = self.seed ^ orb.0.rotate_left(17);
        let mut synth = OrbSynth::new(waveform, self.sample_rate, seed);
        synth.set_octave_range(octave);
        self.voices.insert(orb, synth);
    }

    /// Detach a voice. Disconnecting twice is a no-op, not an error.
    pub fn disconnect(&mut self, orb: OrbId) {
        if self.voices.remove(&orb).is_none() {
            debug!(%orb, "disconnect: voice was not connected");
        }
    }

    pub fn is_connected(&self, orb: OrbId) -> bool {
        self.voices.contains_key(&orb)
    }

    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    pub fn voice(&self, orb: OrbId) -> Option<&OrbSynth> {
        self.voices.get(&orb)
    }

    pub fn set_master_volume(&mut self, volume: f32) {
        self.master_volume = volume.clamp(0.0, 1.0);
    }

    pub fn master_volume(&self) -> f32 {
        self.master_volume
    }

    pub fn apply(&mut self, cmd: EngineCommand) {
        match cmd {
            EngineCommand::AddVoice {
                orb,
                waveform,
                octave,
            } => self.connect(orb, waveform, octave),
            EngineCommand::RemoveVoice { orb } => self.disconnect(orb),
            EngineCommand::SetTargets { orb, targets } => match self.voices.get_mut(&orb) {
                Some(voice) => voice.set_targets(&targets),
                None => warn!(%orb, "set-targets: voice not found"),
            },
            EngineCommand::PlayNote { orb, velocity } => match self.voices.get_mut(&orb) {
                Some(voice) => voice.play_random(velocity),
                None => warn!(%orb, "play: voice not found"),
            },
            EngineCommand::SetScale { root, tonality } => {
                for voice in self.voices.values_mut() {
                    voice.set_scale(root, tonality);
                }
            }
            EngineCommand::SetMasterVolume(volume) => self.set_master_volume(volume),
            EngineCommand::Tick => self.advance_ramps(),
        }
    }

    /// O(voices); called once per tick command.
    pub fn advance_ramps(&mut self) {
        for voice in self.voices.values_mut() {
            voice.advance_effect_ramp();
        }
    }

    /// Render one mono hop: sum all voices, apply master volume, then the
    /// output guard.
    pub fn render_hop(&mut self, buf: &mut [f32]) {
        buf.fill(0.0);
        for voice in self.voices.values_mut() {
            voice.render(buf);
        }
        if self.master_volume != 1.0 {
            for s in buf.iter_mut() {
                *s *= self.master_volume;
            }
        }
        self.limiter.process(buf);
    }
}
