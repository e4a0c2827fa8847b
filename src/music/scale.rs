//! Static key → note-pool table.
//!
//! Every key reduces to a five-note pentatonic-style subset anchored in
//! octave 0 (MIDI 12..=23). Relative major and minor share a row, so the
//! 24 keys collapse onto 12 distinct pools.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// MIDI note numbers for octave 0.
const C: u8 = 12;
const DB: u8 = 13;
const D: u8 = 14;
const EB: u8 = 15;
const E: u8 = 16;
const F: u8 = 17;
const GB: u8 = 18;
const G: u8 = 19;
const AB: u8 = 20;
const A: u8 = 21;
const BB: u8 = 22;
const B: u8 = 23;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Root {
    C,
    Db,
    D,
    Eb,
    E,
    F,
    Gb,
    G,
    Ab,
    A,
    Bb,
    B,
}

impl Root {
    pub const ALL: [Root; 12] = [
        Root::C,
        Root::Db,
        Root::D,
        Root::Eb,
        Root::E,
        Root::F,
        Root::Gb,
        Root::G,
        Root::Ab,
        Root::A,
        Root::Bb,
        Root::B,
    ];

    fn index(self) -> usize {
        Root::ALL.iter().position(|&r| r == self).unwrap_or(0)
    }

    fn transpose(self, semitones: usize) -> Root {
        Root::ALL[(self.index() + semitones) % 12]
    }
}

impl fmt::Display for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl FromStr for Root {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "C" => Ok(Root::C),
            "Db" | "C#" => Ok(Root::Db),
            "D" => Ok(Root::D),
            "Eb" | "D#" => Ok(Root::Eb),
            "E" => Ok(Root::E),
            "F" => Ok(Root::F),
            "Gb" | "F#" => Ok(Root::Gb),
            "G" => Ok(Root::G),
            "Ab" | "G#" => Ok(Root::Ab),
            "A" => Ok(Root::A),
            "Bb" | "A#" => Ok(Root::Bb),
            "B" => Ok(Root::B),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tonality {
    Major,
    Minor,
}

impl fmt::Display for Tonality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tonality::Major => write!(f, "maj"),
            Tonality::Minor => write!(f, "min"),
        }
    }
}

impl FromStr for Tonality {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "maj" | "major" => Ok(Tonality::Major),
            "min" | "minor" => Ok(Tonality::Minor),
            _ => Err(()),
        }
    }
}

/// Five-note pool for a major key, ascending within octave 0.
fn major_row(root: Root) -> [u8; 5] {
    match root {
        Root::C => [C, D, E, G, A],
        Root::Db => [DB, EB, F, AB, BB],
        Root::D => [D, E, GB, A, B],
        Root::Eb => [C, EB, F, G, BB],
        Root::E => [DB, E, GB, AB, B],
        Root::F => [C, D, F, G, A],
        Root::Gb => [DB, EB, GB, AB, BB],
        Root::G => [D, E, G, A, B],
        Root::Ab => [C, EB, F, AB, BB],
        Root::A => [DB, E, GB, A, B],
        Root::Bb => [C, D, F, G, BB],
        Root::B => [DB, EB, GB, AB, B],
    }
}

/// Look up the note pool for a key. Total over all 24 (root, tonality)
/// pairs; a minor key borrows its relative major's row.
pub fn scale_tones(root: Root, tonality: Tonality) -> [u8; 5] {
    match tonality {
        Tonality::Major => major_row(root),
        Tonality::Minor => major_row(root.transpose(3)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_keys_share_a_row() {
        assert_eq!(
            scale_tones(Root::C, Tonality::Major),
            scale_tones(Root::A, Tonality::Minor)
        );
        assert_eq!(
            scale_tones(Root::Db, Tonality::Major),
            scale_tones(Root::Bb, Tonality::Minor)
        );
    }

    #[test]
    fn c_major_row_values() {
        assert_eq!(scale_tones(Root::C, Tonality::Major), [12, 14, 16, 19, 21]);
    }
}
