//! Collision sound-design table.
//!
//! One central map from (own kind, colliding kind) to the effect sends the
//! voice ramps toward. Rows are deliberately asymmetric: a blue orb struck
//! by a red one answers differently than a red orb struck by a blue one.

use crate::orb::kind::OrbKind;
use crate::synth::EffectTargets;

const fn targets(
    delay: f32,
    reverb: f32,
    flanger: f32,
    distortion: f32,
    tremolo_depth: f32,
    tremolo_rate_hz: Option<f32>,
) -> EffectTargets {
    EffectTargets {
        delay,
        reverb,
        flanger,
        distortion,
        tremolo_depth,
        tremolo_rate_hz,
    }
}

/// Resolve the effect target set for `own` colliding with `other`.
/// Total over the 3×3 kind product.
pub fn resolve(own: OrbKind, other: OrbKind) -> EffectTargets {
    use OrbKind::{Blue, Purple, Red};
    match (own, other) {
        // Blue: soft reverb colors.
        (Blue, Blue) => targets(0.2, 1.0, 0.0, 0.0, 0.1, None),
        (Blue, Purple) => targets(0.0, 0.3, 0.6, 0.0, 1.0, None),
        (Blue, Red) => targets(0.2, 0.6, 0.0, 0.1, 0.1, None),
        // Purple: tremolo-led, with its own LFO rates.
        (Purple, Blue) => targets(0.0, 0.6, 0.7, 0.0, 0.6, Some(2.0)),
        (Purple, Purple) => targets(0.3, 0.0, 0.0, 0.0, 1.0, Some(6.0)),
        (Purple, Red) => targets(0.4, 0.2, 0.0, 0.1, 0.6, Some(2.0)),
        // Red: delay and crush.
        (Red, Blue) => targets(0.5, 0.7, 0.0, 0.2, 0.0, None),
        (Red, Purple) => targets(0.2, 0.0, 0.8, 0.5, 0.9, None),
        (Red, Red) => targets(0.5, 0.1, 0.0, 0.0, 0.0, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_pair_yields_bounded_sends() {
        for own in OrbKind::ALL {
            for other in OrbKind::ALL {
                let t = resolve(own, other);
                for v in [t.delay, t.reverb, t.flanger, t.distortion, t.tremolo_depth] {
                    assert!((0.0..=1.0).contains(&v), "{own}/{other}: {v}");
                }
            }
        }
    }

    #[test]
    fn purple_rows_carry_tremolo_rates() {
        for other in OrbKind::ALL {
            assert!(resolve(OrbKind::Purple, other).tremolo_rate_hz.is_some());
            assert!(resolve(OrbKind::Blue, other).tremolo_rate_hz.is_none());
        }
    }
}
