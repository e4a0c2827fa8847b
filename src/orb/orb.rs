use std::fmt;

use serde::{Deserialize, Serialize};

use crate::orb::kind::OrbKind;

/// Smallest and largest spawnable orb diameter, enforced again here even
/// though the gesture layer pre-clamps.
pub const MIN_SIZE: f32 = 80.0;
pub const MAX_SIZE: f32 = 400.0;

/// Octave band available to a voice.
pub const MAX_OCTAVE_RANGE: u8 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrbId(pub u64);

impl fmt::Display for OrbId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "orb#{}", self.0)
    }
}

/// Simulation-side record of one orb. The physics body lives in the
/// excluded engine; the DSP voice lives in the audio worker, keyed by id.
#[derive(Debug, Clone, Copy)]
pub struct Orb {
    pub id: OrbId,
    pub kind: OrbKind,
    pub size: f32,
    pub octave_range: u8,
}

impl Orb {
    pub fn new(id: OrbId, kind: OrbKind, size: f32) -> Self {
        let size = size.clamp(MIN_SIZE, MAX_SIZE);
        Self {
            id,
            kind,
            size,
            octave_range: octave_range_for_size(size),
        }
    }
}

/// Bigger orb, lower octave: `floor((400 − size) / (320/6))`, clamped to
/// the valid band [0, 6].
pub fn octave_range_for_size(size: f32) -> u8 {
    let size = size.clamp(MIN_SIZE, MAX_SIZE);
    let raw = ((MAX_SIZE - size) / ((MAX_SIZE - MIN_SIZE) / MAX_OCTAVE_RANGE as f32)).floor();
    (raw as u8).min(MAX_OCTAVE_RANGE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn octave_band_endpoints() {
        assert_eq!(octave_range_for_size(400.0), 0);
        assert_eq!(octave_range_for_size(300.0), 1);
        assert_eq!(octave_range_for_size(80.0), 6);
        // Out-of-band sizes clamp instead of escaping the band.
        assert_eq!(octave_range_for_size(10.0), 6);
        assert_eq!(octave_range_for_size(1_000.0), 0);
    }
}
