// End-to-end over the command channel: a session on one side, a mixer
// draining it on the other, the way the render worker does.

use crossbeam_channel::{unbounded, Receiver};
use orbfield::audio::{EngineCommand, Mixer};
use orbfield::config::CollisionConfig;
use orbfield::orb::{OrbKind, Session};

fn drain(rx: &Receiver<EngineCommand>, mixer: &mut Mixer) {
    while let Ok(cmd) = rx.try_recv() {
        mixer.apply(cmd);
    }
}

#[test]
fn spawn_collide_remove_round_trip() {
    let (tx, rx) = unbounded();
    let mut session = Session::new(tx, CollisionConfig::default());
    let mut mixer = Mixer::new(48_000, Default::default(), None);

    let a = session.spawn_orb(OrbKind::Blue, 320.0);
    let b = session.spawn_orb(OrbKind::Red, 120.0);
    drain(&rx, &mut mixer);
    assert_eq!(mixer.voice_count(), 2);
    assert_eq!(mixer.voice(a).expect("voice a").octave_range(), 1);
    assert_eq!(mixer.voice(b).expect("voice b").octave_range(), 5);

    session.on_collision(900_000.0, a, b);
    session.tick();
    drain(&rx, &mut mixer);
    assert_eq!(mixer.voice(a).expect("voice a").active_notes(), 1);
    assert_eq!(mixer.voice(b).expect("voice b").active_notes(), 1);

    let mut buf = vec![0.0f32; 2_048];
    mixer.render_hop(&mut buf);
    assert!(buf.iter().any(|&s| s != 0.0), "collision made no sound");

    session.remove_orb(b);
    drain(&rx, &mut mixer);
    assert_eq!(mixer.voice_count(), 1);
    assert!(mixer.voice(b).is_none());
}

#[test]
fn key_change_retunes_existing_and_future_voices() {
    use orbfield::music::{scale_tones, Root, Tonality};

    let (tx, rx) = unbounded();
    let mut session = Session::new(tx, CollisionConfig::default());
    let mut mixer = Mixer::new(48_000, Default::default(), None);

    let a = session.spawn_orb(OrbKind::Blue, 400.0);
    session.set_scale(Root::Eb, Tonality::Minor);
    // Spawned after the key change: the session re-sends the key so the
    // fresh voice does not stay in C major.
    let b = session.spawn_orb(OrbKind::Purple, 400.0);
    session.on_collision(5_000_000.0, a, b);
    drain(&rx, &mut mixer);

    // Eb minor borrows Gb major's row; octave range 0 keeps pool notes as-is.
    let pool = scale_tones(Root::Eb, Tonality::Minor);
    for id in [a, b] {
        let mut buf = vec![0.0f32; 256];
        mixer.render_hop(&mut buf);
        assert!(mixer.voice(id).expect("voice").active_notes() > 0);
    }
    assert_eq!(pool, scale_tones(Root::Gb, Tonality::Major));
}

#[test]
fn master_volume_command_reaches_the_bus() {
    let (tx, rx) = unbounded();
    let mut session = Session::new(tx, CollisionConfig::default());
    let mut mixer = Mixer::new(48_000, Default::default(), None);

    session.set_master_volume(2.5); // clamped on the way in
    drain(&rx, &mut mixer);
    assert_eq!(mixer.master_volume(), 1.0);

    session.set_master_volume(0.4);
    drain(&rx, &mut mixer);
    assert!((mixer.master_volume() - 0.4).abs() <= 1e-6);
}
