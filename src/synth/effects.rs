//! Per-voice insert effects, each with a dry/wet `mix` control in 0..=1.
//!
//! The chain order is fixed by the voice (delay → reverb → flanger →
//! decimator → tremolo); every stage here is a mono sample processor.

use std::f32::consts::PI;

use crate::synth::flush_denorm;

/// Feedback delay line with dry/wet mix.
pub struct Delay {
    buffer: Vec<f32>,
    write_pos: usize,
    delay_samples: usize,
    pub feedback: f32,
    pub mix: f32,
}

impl Delay {
    pub fn new(time_sec: f32, feedback: f32, sample_rate: f32) -> Self {
        let delay_samples = ((time_sec * sample_rate) as usize).max(1);
        Self {
            buffer: vec![0.0; delay_samples + 1],
            write_pos: 0,
            delay_samples,
            feedback: feedback.clamp(0.0, 0.95),
            mix: 0.0,
        }
    }

    fn read_pos(&self) -> usize {
        if self.write_pos >= self.delay_samples {
            self.write_pos - self.delay_samples
        } else {
            self.buffer.len() - (self.delay_samples - self.write_pos)
        }
    }

    pub fn process(&mut self, input: f32) -> f32 {
        let delayed = self.buffer[self.read_pos()];
        self.buffer[self.write_pos] = flush_denorm(input + delayed * self.feedback);
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
        input * (1.0 - self.mix) + delayed * self.mix
    }
}

struct CombFilter {
    buffer: Vec<f32>,
    write_pos: usize,
    feedback: f32,
}

impl CombFilter {
    fn new(delay_samples: usize, feedback: f32) -> Self {
        Self {
            buffer: vec![0.0; delay_samples.max(1)],
            write_pos: 0,
            feedback,
        }
    }

    fn process(&mut self, input: f32) -> f32 {
        let output = self.buffer[self.write_pos];
        self.buffer[self.write_pos] = flush_denorm(input + output * self.feedback);
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
        output
    }
}

struct AllpassFilter {
    buffer: Vec<f32>,
    write_pos: usize,
    feedback: f32,
}

impl AllpassFilter {
    fn new(delay_samples: usize, feedback: f32) -> Self {
        Self {
            buffer: vec![0.0; delay_samples.max(1)],
            write_pos: 0,
            feedback,
        }
    }

    fn process(&mut self, input: f32) -> f32 {
        let delayed = self.buffer[self.write_pos];
        let output = -input + delayed;
        self.buffer[self.write_pos] = flush_denorm(input + delayed * self.feedback);
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
        output
    }
}

/// Schroeder reverb: parallel combs into series allpasses, long-hall tuning.
pub struct Reverb {
    combs: Vec<CombFilter>,
    allpasses: Vec<AllpassFilter>,
    damping_lp: f32,
    pub mix: f32,
}

impl Reverb {
    pub fn new(sample_rate: f32) -> Self {
        let sr = sample_rate as usize;
        // Prime-ish delay lengths (ms) for an uncolored tail.
        let comb_delays = [sr * 29 / 1000, sr * 37 / 1000, sr * 43 / 1000, sr * 53 / 1000];
        let allpass_delays = [sr * 5 / 1000, sr * 2 / 1000];
        Self {
            combs: comb_delays
                .iter()
                .map(|&d| CombFilter::new(d, 0.84))
                .collect(),
            allpasses: allpass_delays
                .iter()
                .map(|&d| AllpassFilter::new(d, 0.7))
                .collect(),
            damping_lp: 0.0,
            mix: 0.0,
        }
    }

    pub fn process(&mut self, input: f32) -> f32 {
        let mut comb_sum = 0.0f32;
        for comb in self.combs.iter_mut() {
            comb_sum += comb.process(input);
        }
        comb_sum /= self.combs.len() as f32;

        // Damp the tail before diffusion.
        let damp = 0.3;
        self.damping_lp = flush_denorm(self.damping_lp * damp + comb_sum * (1.0 - damp));

        let mut wet = self.damping_lp;
        for allpass in self.allpasses.iter_mut() {
            wet = allpass.process(wet);
        }
        input * (1.0 - self.mix) + wet * self.mix
    }
}

/// LFO-swept short delay with feedback.
pub struct Flanger {
    buffer: Vec<f32>,
    write_pos: usize,
    lfo_phase: f32,
    lfo_inc: f32,
    pub depth: f32,
    pub feedback: f32,
    pub mix: f32,
    sample_rate: f32,
}

impl Flanger {
    const MAX_DELAY_SEC: f32 = 0.010;
    const MIN_DELAY_SEC: f32 = 0.001;

    pub fn new(rate_hz: f32, depth: f32, feedback: f32, sample_rate: f32) -> Self {
        let len = ((Self::MAX_DELAY_SEC * sample_rate) as usize).max(2);
        Self {
            buffer: vec![0.0; len + 1],
            write_pos: 0,
            lfo_phase: 0.0,
            lfo_inc: 2.0 * PI * rate_hz / sample_rate,
            depth: depth.clamp(0.0, 1.0),
            feedback: feedback.clamp(0.0, 0.95),
            mix: 0.0,
            sample_rate,
        }
    }

    pub fn process(&mut self, input: f32) -> f32 {
        self.lfo_phase = (self.lfo_phase + self.lfo_inc) % (2.0 * PI);
        let sweep = 0.5 * (1.0 + self.lfo_phase.sin()) * self.depth;
        let delay_sec = Self::MIN_DELAY_SEC + sweep * (Self::MAX_DELAY_SEC - Self::MIN_DELAY_SEC);
        let delay_samples = ((delay_sec * self.sample_rate) as usize)
            .clamp(1, self.buffer.len() - 1);

        let read_pos = if self.write_pos >= delay_samples {
            self.write_pos - delay_samples
        } else {
            self.buffer.len() - (delay_samples - self.write_pos)
        };
        let delayed = self.buffer[read_pos];
        self.buffer[self.write_pos] = flush_denorm(input + delayed * self.feedback);
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
        input * (1.0 - self.mix) + delayed * self.mix
    }
}

/// Sample-and-hold bit decimator; `decimation` 0..=1 scales the hold length.
pub struct Decimator {
    held: f32,
    counter: f32,
    pub decimation: f32,
    pub mix: f32,
}

impl Decimator {
    const MAX_HOLD_SAMPLES: f32 = 64.0;

    pub fn new(decimation: f32) -> Self {
        Self {
            held: 0.0,
            counter: 0.0,
            decimation: decimation.clamp(0.0, 1.0),
            mix: 0.0,
        }
    }

    pub fn process(&mut self, input: f32) -> f32 {
        let hold = 1.0 + self.decimation * Self::MAX_HOLD_SAMPLES;
        self.counter += 1.0;
        if self.counter >= hold {
            self.counter -= hold;
            self.held = input;
        }
        input * (1.0 - self.mix) + self.held * self.mix
    }
}

/// LFO amplitude modulation; `depth` is the ramped collision parameter.
pub struct Tremolo {
    lfo_phase: f32,
    pub depth: f32,
    frequency_hz: f32,
    sample_rate: f32,
}

impl Tremolo {
    pub fn new(frequency_hz: f32, sample_rate: f32) -> Self {
        Self {
            lfo_phase: 0.0,
            depth: 0.0,
            frequency_hz,
            sample_rate,
        }
    }

    /// Rate changes keep LFO phase, so they are click-free without a ramp.
    pub fn set_frequency(&mut self, hz: f32) {
        self.frequency_hz = hz.max(0.0);
    }

    pub fn frequency(&self) -> f32 {
        self.frequency_hz
    }

    pub fn process(&mut self, input: f32) -> f32 {
        self.lfo_phase =
            (self.lfo_phase + 2.0 * PI * self.frequency_hz / self.sample_rate) % (2.0 * PI);
        let gain = 1.0 - self.depth * 0.5 * (1.0 + self.lfo_phase.sin());
        input * gain
    }
}
