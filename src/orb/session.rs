//! Top-level sandbox state: the active orb set and the engine handle.
//!
//! The session is the single owner of orb records; collaborators (input
//! layer, tutorial) reach the core only through its methods. Expected call
//! order within one frame: physics collisions via `on_collision`, then any
//! queries, then `tick()` — the collision flag is edge-triggered and
//! cleared at the end of the tick it was raised in.

use std::collections::HashMap;

use crossbeam_channel::Sender;
use tracing::{info, warn};

use crate::audio::EngineCommand;
use crate::config::CollisionConfig;
use crate::music::{Root, Tonality};
use crate::orb::kind::OrbKind;
use crate::orb::orb::{Orb, OrbId};
use crate::orb::router::CollisionRouter;

pub struct Session {
    orbs: HashMap<OrbId, Orb>,
    next_id: u64,
    commands: Sender<EngineCommand>,
    router: CollisionRouter,
    collision_occurred: bool,
    last_added_kind: Option<OrbKind>,
    key: (Root, Tonality),
}

impl Session {
    pub fn new(commands: Sender<EngineCommand>, collision: CollisionConfig) -> Self {
        Self {
            orbs: HashMap::new(),
            next_id: 0,
            commands,
            router: CollisionRouter::new(collision),
            collision_occurred: false,
            last_added_kind: None,
            key: (Root::C, Tonality::Major),
        }
    }

    /// Create an orb and connect its voice. Size is re-clamped here even
    /// though the gesture layer pre-clamps it.
    pub fn spawn_orb(&mut self, kind: OrbKind, size: f32) -> OrbId {
        let id = OrbId(self.next_id);
        self.next_id += 1;
        let orb = Orb::new(id, kind, size);
        let _ = self.commands.send(EngineCommand::AddVoice {
            orb: id,
            waveform: kind.waveform(),
            octave: orb.octave_range,
        });
        // A freshly connected voice starts in C major; realign it with the
        // session key if the user changed it.
        if self.key != (Root::C, Tonality::Major) {
            let (root, tonality) = self.key;
            let _ = self.commands.send(EngineCommand::SetScale { root, tonality });
        }
        info!(%id, %kind, size = orb.size, octave = orb.octave_range, "orb spawned");
        self.orbs.insert(id, orb);
        self.last_added_kind = Some(kind);
        id
    }

    /// Remove an orb, disconnecting its voice before the record is
    /// dropped. Removing an unknown id is a logged no-op.
    pub fn remove_orb(&mut self, id: OrbId) -> bool {
        if self.orbs.remove(&id).is_some() {
            let _ = self.commands.send(EngineCommand::RemoveVoice { orb: id });
            info!(%id, "orb removed");
            true
        } else {
            warn!(%id, "remove: no such orb");
            false
        }
    }

    /// Change the active key for every voice.
    pub fn set_scale(&mut self, root: Root, tonality: Tonality) {
        self.key = (root, tonality);
        let _ = self.commands.send(EngineCommand::SetScale { root, tonality });
        info!(%root, %tonality, "key changed");
    }

    /// String entry point for config/UI key names. An unrecognized name is
    /// logged and leaves the current key untouched.
    pub fn set_scale_str(&mut self, root: &str, tonality: &str) {
        match (root.parse::<Root>(), tonality.parse::<Tonality>()) {
            (Ok(root), Ok(tonality)) => self.set_scale(root, tonality),
            _ => warn!(root, tonality, "unknown key name; keeping current scale"),
        }
    }

    pub fn set_master_volume(&mut self, volume: f32) {
        let _ = self
            .commands
            .send(EngineCommand::SetMasterVolume(volume.clamp(0.0, 1.0)));
    }

    /// Physics collision callback entry point.
    pub fn on_collision(&mut self, impulse: f32, a: OrbId, b: OrbId) {
        let a = self.orbs.get(&a);
        let b = self.orbs.get(&b);
        if self.router.route(impulse, a, b, &self.commands) {
            self.collision_occurred = true;
        }
    }

    /// End-of-frame: advance every voice's effect ramp and drop the
    /// collision flag raised during this tick.
    pub fn tick(&mut self) {
        let _ = self.commands.send(EngineCommand::Tick);
        self.collision_occurred = false;
    }

    pub fn collision_occurred_this_tick(&self) -> bool {
        self.collision_occurred
    }

    pub fn active_orb_count(&self) -> usize {
        self.orbs.len()
    }

    pub fn last_added_orb_kind(&self) -> Option<OrbKind> {
        self.last_added_kind
    }

    pub fn orb(&self, id: OrbId) -> Option<&Orb> {
        self.orbs.get(&id)
    }

    pub fn orb_ids(&self) -> Vec<OrbId> {
        let mut ids: Vec<OrbId> = self.orbs.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn router(&self) -> &CollisionRouter {
        &self.router
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;

    fn session() -> (Session, crossbeam_channel::Receiver<EngineCommand>) {
        let (tx, rx) = bounded(64);
        (Session::new(tx, CollisionConfig::default()), rx)
    }

    #[test]
    fn spawn_connects_a_voice() {
        let (mut s, rx) = session();
        let id = s.spawn_orb(OrbKind::Blue, 300.0);
        assert_eq!(s.active_orb_count(), 1);
        assert_eq!(s.last_added_orb_kind(), Some(OrbKind::Blue));
        match rx.try_recv().expect("command") {
            EngineCommand::AddVoice { orb, octave, .. } => {
                assert_eq!(orb, id);
                assert_eq!(octave, 1);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn collision_flag_is_edge_triggered() {
        let (mut s, rx) = session();
        let a = s.spawn_orb(OrbKind::Blue, 200.0);
        let b = s.spawn_orb(OrbKind::Red, 200.0);
        while rx.try_recv().is_ok() {}

        s.on_collision(600_000.0, a, b);
        assert!(s.collision_occurred_this_tick());
        s.tick();
        assert!(!s.collision_occurred_this_tick());
    }

    #[test]
    fn below_threshold_collision_is_a_noop() {
        let (mut s, rx) = session();
        let a = s.spawn_orb(OrbKind::Blue, 200.0);
        let b = s.spawn_orb(OrbKind::Blue, 200.0);
        while rx.try_recv().is_ok() {}

        // velocity = floor(120000/30000) = 4 < 10
        s.on_collision(120_000.0, a, b);
        assert!(!s.collision_occurred_this_tick());
        assert!(rx.try_recv().is_err(), "no commands for a rolling contact");
    }

    #[test]
    fn collision_with_removed_orb_is_ignored() {
        let (mut s, rx) = session();
        let a = s.spawn_orb(OrbKind::Blue, 200.0);
        let b = s.spawn_orb(OrbKind::Red, 200.0);
        s.remove_orb(b);
        while rx.try_recv().is_ok() {}

        s.on_collision(600_000.0, a, b);
        assert!(!s.collision_occurred_this_tick());
        assert!(rx.try_recv().is_err());
    }
}
