use std::collections::HashSet;

use orbfield::music::{scale_tones, Root, Tonality};

#[test]
fn every_key_yields_five_distinct_octave0_notes() {
    for root in Root::ALL {
        for tonality in [Tonality::Major, Tonality::Minor] {
            let pool = scale_tones(root, tonality);
            let distinct: HashSet<u8> = pool.iter().copied().collect();
            assert_eq!(distinct.len(), 5, "{root} {tonality}: {pool:?}");
            for &note in &pool {
                assert!(
                    (12..=23).contains(&note),
                    "{root} {tonality}: note {note} outside octave 0"
                );
            }
        }
    }
}

#[test]
fn rows_are_ascending() {
    for root in Root::ALL {
        let pool = scale_tones(root, Tonality::Major);
        assert!(
            pool.windows(2).all(|w| w[0] < w[1]),
            "{root}: {pool:?} not ascending"
        );
    }
}

#[test]
fn minor_borrows_relative_major() {
    let pairs = [
        (Root::A, Root::C),
        (Root::E, Root::G),
        (Root::B, Root::D),
        (Root::C, Root::Eb),
        (Root::Gb, Root::A),
    ];
    for (minor_root, major_root) in pairs {
        assert_eq!(
            scale_tones(minor_root, Tonality::Minor),
            scale_tones(major_root, Tonality::Major),
            "{minor_root} minor vs {major_root} major"
        );
    }
}

#[test]
fn key_names_parse() {
    assert_eq!("C#".parse::<Root>(), Ok(Root::Db));
    assert_eq!("Bb".parse::<Root>(), Ok(Root::Bb));
    assert_eq!("minor".parse::<Tonality>(), Ok(Tonality::Minor));
    assert!("H".parse::<Root>().is_err());
}
