use std::fmt;

use serde::{Deserialize, Serialize};

use crate::synth::Waveform;

/// Orb variant. One enum plus data tables replaces a subclass per kind;
/// the kind selects the carrier waveform and the collision policy row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrbKind {
    Blue,
    Purple,
    Red,
}

impl OrbKind {
    pub const ALL: [OrbKind; 3] = [OrbKind::Blue, OrbKind::Purple, OrbKind::Red];

    pub fn waveform(self) -> Waveform {
        match self {
            OrbKind::Blue => Waveform::Sine,
            OrbKind::Purple => Waveform::Sawtooth,
            OrbKind::Red => Waveform::Triangle,
        }
    }
}

impl fmt::Display for OrbKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrbKind::Blue => write!(f, "blue"),
            OrbKind::Purple => write!(f, "purple"),
            OrbKind::Red => write!(f, "red"),
        }
    }
}
