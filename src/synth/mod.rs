//! Synthesis primitives without orb semantics (Hz, sec).

pub mod effects;
pub mod fm;
pub mod voice;

pub use voice::{EffectTargets, OrbSynth, Waveform, RAMP_STEP};

const DENORM_THRESH: f32 = 1.0e-20;

/// Flush denormals and non-finite values to zero.
#[inline(always)]
pub fn flush_denorm(x: f32) -> f32 {
    if !x.is_finite() || x.abs() < DENORM_THRESH {
        0.0
    } else {
        x
    }
}

/// Equal-tempered frequency for a MIDI note number (A4 = 69 = 440 Hz).
#[inline]
pub fn midi_to_hz(note: u8) -> f32 {
    440.0 * 2.0f32.powf((note as f32 - 69.0) / 12.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn midi_reference_pitches() {
        assert!((midi_to_hz(69) - 440.0).abs() < 1e-3);
        assert!((midi_to_hz(57) - 220.0).abs() < 1e-3);
    }

    #[test]
    fn flush_denorm_kills_nan() {
        assert_eq!(flush_denorm(f32::NAN), 0.0);
        assert_eq!(flush_denorm(1.0e-30), 0.0);
        assert_eq!(flush_denorm(0.5), 0.5);
    }
}
