//! Output guard between the mixer sum and the hardware output.
//!
//! Always present on the master bus: polyphonic additive mixing of a dozen
//! voices can clip, so the default mode is a peak limiter. The bus is mono;
//! all processing here is single-channel.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use crate::config::OutputGuardSetting;

#[derive(Clone, Copy, Debug)]
pub struct SoftClipParams {
    pub ceiling: f32,
    pub drive: f32,
}

impl Default for SoftClipParams {
    fn default() -> Self {
        Self {
            ceiling: 0.98,
            drive: 2.0,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct PeakLimiterParams {
    pub ceiling: f32,
    pub attack_ms: f32,
    pub release_ms: f32,
}

impl Default for PeakLimiterParams {
    fn default() -> Self {
        Self {
            ceiling: 0.98,
            attack_ms: 0.5,
            release_ms: 50.0,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub enum LimiterMode {
    None,
    SoftClip(SoftClipParams),
    PeakLimiter(PeakLimiterParams),
}

impl Default for LimiterMode {
    fn default() -> Self {
        Self::PeakLimiter(PeakLimiterParams::default())
    }
}

impl From<OutputGuardSetting> for LimiterMode {
    fn from(setting: OutputGuardSetting) -> Self {
        match setting {
            OutputGuardSetting::None => LimiterMode::None,
            OutputGuardSetting::SoftClip => LimiterMode::SoftClip(SoftClipParams::default()),
            OutputGuardSetting::PeakLimiter => {
                LimiterMode::PeakLimiter(PeakLimiterParams::default())
            }
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct LimiterStats {
    pub max_abs_in: f32,
    pub max_abs_out: f32,
    pub max_reduction_db: f32,
    pub num_over: u64,
}

/// Lock-free aggregation of limiter activity, drained by a slower thread.
#[derive(Debug, Default)]
pub struct LimiterMeter {
    engaged_count: AtomicU64,
    over_count: AtomicU64,
    max_reduction_bits: AtomicU32,
    max_abs_in_bits: AtomicU32,
}

impl LimiterMeter {
    pub fn record(&self, stats: &LimiterStats) {
        if stats.num_over == 0 && stats.max_reduction_db <= 0.0 {
            return;
        }
        self.engaged_count.fetch_add(1, Ordering::Relaxed);
        if stats.num_over > 0 {
            self.over_count.fetch_add(stats.num_over, Ordering::Relaxed);
        }
        self.max_reduction_bits
            .store(stats.max_reduction_db.to_bits(), Ordering::Relaxed);
        self.max_abs_in_bits
            .store(stats.max_abs_in.to_bits(), Ordering::Relaxed);
    }

    pub fn take_snapshot(&self) -> Option<LimiterStats> {
        let engaged = self.engaged_count.swap(0, Ordering::Relaxed);
        if engaged == 0 {
            return None;
        }
        let over = self.over_count.swap(0, Ordering::Relaxed);
        let max_reduction_db = f32::from_bits(self.max_reduction_bits.swap(0, Ordering::Relaxed));
        let max_abs_in = f32::from_bits(self.max_abs_in_bits.swap(0, Ordering::Relaxed));
        Some(LimiterStats {
            max_abs_in,
            max_abs_out: 0.0,
            max_reduction_db,
            num_over: over,
        })
    }
}

#[derive(Debug)]
struct GainState {
    gain: f32,
    attack_coeff: f32,
    release_coeff: f32,
}

#[derive(Debug)]
pub struct Limiter {
    mode: LimiterMode,
    state: Option<GainState>,
    stats: LimiterStats,
    meter: Option<Arc<LimiterMeter>>,
}

impl Limiter {
    pub fn new(mode: LimiterMode, sample_rate: u32) -> Self {
        let sample_rate = (sample_rate as f32).max(1.0);
        let state = match mode {
            LimiterMode::PeakLimiter(params) => Some(GainState {
                gain: 1.0,
                attack_coeff: time_to_coeff(params.attack_ms, sample_rate),
                release_coeff: time_to_coeff(params.release_ms, sample_rate),
            }),
            _ => None,
        };
        Self {
            mode,
            state,
            stats: LimiterStats::default(),
            meter: None,
        }
    }

    pub fn with_meter(mut self, meter: Arc<LimiterMeter>) -> Self {
        self.meter = Some(meter);
        self
    }

    /// Process one mono hop in place.
    pub fn process(&mut self, buf: &mut [f32]) {
        if buf.is_empty() {
            return;
        }
        self.stats = LimiterStats::default();
        match self.mode {
            LimiterMode::None => {}
            LimiterMode::SoftClip(params) => {
                let ceiling = params.ceiling.abs().max(1e-6);
                let drive = params.drive.max(0.0);
                for s in buf.iter_mut() {
                    let x = if s.is_finite() { *s } else { 0.0 };
                    self.observe_in(x.abs(), ceiling);
                    let y = (x * drive).tanh() * ceiling;
                    self.observe_out(x.abs(), y.abs());
                    *s = y;
                }
            }
            LimiterMode::PeakLimiter(params) => {
                let ceiling = params.ceiling.abs().max(1e-6);
                let state = self.state.as_mut().expect("limiter state");
                let mut stats = self.stats;
                for s in buf.iter_mut() {
                    let x = if s.is_finite() { *s } else { 0.0 };
                    let abs_in = x.abs();
                    let target_gain = if abs_in > ceiling {
                        ceiling / abs_in
                    } else {
                        1.0
                    };
                    state.gain = smooth_gain(
                        state.gain,
                        target_gain,
                        state.attack_coeff,
                        state.release_coeff,
                    );
                    let mut y = x * state.gain;
                    if y.abs() > ceiling {
                        y = y.clamp(-ceiling, ceiling);
                    }
                    if abs_in > stats.max_abs_in {
                        stats.max_abs_in = abs_in;
                    }
                    if abs_in > ceiling {
                        stats.num_over += 1;
                    }
                    if y.abs() > stats.max_abs_out {
                        stats.max_abs_out = y.abs();
                    }
                    update_reduction(&mut stats, abs_in, y.abs());
                    *s = y;
                }
                self.stats = stats;
            }
        }
        if let Some(meter) = self.meter.as_ref() {
            meter.record(&self.stats);
        }
    }

    pub fn stats(&self) -> LimiterStats {
        self.stats
    }

    fn observe_in(&mut self, abs_in: f32, ceiling: f32) {
        if abs_in > self.stats.max_abs_in {
            self.stats.max_abs_in = abs_in;
        }
        if abs_in > ceiling {
            self.stats.num_over += 1;
        }
    }

    fn observe_out(&mut self, abs_in: f32, abs_out: f32) {
        if abs_out > self.stats.max_abs_out {
            self.stats.max_abs_out = abs_out;
        }
        update_reduction(&mut self.stats, abs_in, abs_out);
    }
}

fn time_to_coeff(time_ms: f32, sample_rate: f32) -> f32 {
    let time_s = time_ms.max(0.0) * 0.001;
    if time_s <= 0.0 {
        0.0
    } else {
        (-1.0 / (time_s * sample_rate)).exp()
    }
}

fn smooth_gain(current: f32, target: f32, attack_coeff: f32, release_coeff: f32) -> f32 {
    if target < current {
        attack_coeff * current + (1.0 - attack_coeff) * target
    } else {
        release_coeff * current + (1.0 - release_coeff) * target
    }
}

fn update_reduction(stats: &mut LimiterStats, abs_in: f32, abs_out: f32) {
    if abs_in <= 1e-12 || abs_out <= 0.0 {
        return;
    }
    let ratio = abs_out / abs_in;
    if ratio <= 0.0 || ratio >= 1.0 {
        return;
    }
    let db = 20.0 * ratio.log10();
    if db.is_finite() {
        let reduction = -db;
        if reduction > stats.max_reduction_db {
            stats.max_reduction_db = reduction;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safety_softclip() {
        let mut limiter = Limiter::new(LimiterMode::SoftClip(SoftClipParams::default()), 48_000);
        let mut buf = [0.0f32, 1.5, -1.5, 0.5];
        limiter.process(&mut buf);
        let ceiling = SoftClipParams::default().ceiling + 1e-6;
        for &v in &buf {
            assert!(v.abs() <= ceiling, "{v} exceeds ceiling");
        }
    }

    #[test]
    fn safety_peak_limiter() {
        let mut limiter =
            Limiter::new(LimiterMode::PeakLimiter(PeakLimiterParams::default()), 48_000);
        let mut buf = [0.0f32, 2.0, -2.0, 0.25];
        limiter.process(&mut buf);
        let ceiling = PeakLimiterParams::default().ceiling + 1e-6;
        for &v in &buf {
            assert!(v.abs() <= ceiling, "{v} exceeds ceiling");
        }
    }

    #[test]
    fn transparency_below_ceiling() {
        let mut limiter =
            Limiter::new(LimiterMode::PeakLimiter(PeakLimiterParams::default()), 48_000);
        let mut buf = [0.25f32, -0.5, 0.1, 0.0];
        let original = buf;
        limiter.process(&mut buf);
        for (a, b) in buf.iter().zip(original.iter()) {
            assert!((a - b).abs() <= 1e-6);
        }
    }

    #[test]
    fn meter_snapshot_only_when_engaged() {
        let meter = Arc::new(LimiterMeter::default());
        let mut limiter =
            Limiter::new(LimiterMode::PeakLimiter(PeakLimiterParams::default()), 48_000)
                .with_meter(meter.clone());
        let mut quiet = [0.1f32; 16];
        limiter.process(&mut quiet);
        assert!(meter.take_snapshot().is_none());
        let mut hot = [2.0f32; 16];
        limiter.process(&mut hot);
        let stats = meter.take_snapshot().expect("engaged");
        assert!(stats.num_over > 0);
    }
}
