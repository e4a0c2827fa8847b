// The master bus never leaves the limiter ceiling, even with a pile of
// full-velocity voices landing at once.

use orbfield::audio::{EngineCommand, Mixer};
use orbfield::orb::{OrbId, OrbKind};

#[test]
fn hot_bus_stays_under_ceiling() {
    let mut mixer = Mixer::new(48_000, Default::default(), None);
    for i in 0..12 {
        let id = OrbId(i);
        let kind = OrbKind::ALL[i as usize % OrbKind::ALL.len()];
        mixer.apply(EngineCommand::AddVoice {
            orb: id,
            waveform: kind.waveform(),
            octave: (i % 7) as u8,
        });
        mixer.apply(EngineCommand::PlayNote {
            orb: id,
            velocity: 127,
        });
    }

    let mut buf = vec![0.0f32; 256];
    let mut peak = 0.0f32;
    for _ in 0..200 {
        mixer.render_hop(&mut buf);
        for &s in &buf {
            assert!(s.is_finite());
            peak = peak.max(s.abs());
        }
    }
    assert!(peak <= 0.98 + 1e-4, "bus peak {peak} above ceiling");
    assert!(peak > 0.0, "bus rendered silence");
}
