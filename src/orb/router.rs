//! Collision event handling: impulse → MIDI velocity, threshold gating,
//! and two-sided dispatch into the voices.

use crossbeam_channel::Sender;
use tracing::info;

use crate::audio::EngineCommand;
use crate::config::CollisionConfig;
use crate::orb::orb::Orb;
use crate::orb::policy;

/// `clamp(floor(impulse / scale), 0, 127)`. Non-finite or non-positive
/// inputs map to 0 (and are then rejected by the threshold).
pub fn compute_velocity(impulse: f32, impulse_scale: f32) -> u8 {
    if !impulse.is_finite() || impulse <= 0.0 || impulse_scale <= 0.0 {
        return 0;
    }
    (impulse / impulse_scale).floor().clamp(0.0, 127.0) as u8
}

/// Stateless per-event transform; the one-tick collision flag lives in the
/// session.
pub struct CollisionRouter {
    config: CollisionConfig,
}

impl CollisionRouter {
    pub fn new(config: CollisionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CollisionConfig {
        &self.config
    }

    /// Route one collision. Returns true when the event produced sound.
    ///
    /// `None` sides are contacts with non-orb bodies (walls, removed
    /// orbs); those never trigger. The velocity threshold suppresses the
    /// note spam of bodies resting or rolling in continuous contact.
    pub fn route(
        &self,
        impulse: f32,
        a: Option<&Orb>,
        b: Option<&Orb>,
        commands: &Sender<EngineCommand>,
    ) -> bool {
        let (Some(a), Some(b)) = (a, b) else {
            return false;
        };
        let velocity = compute_velocity(impulse, self.config.impulse_scale);
        if velocity < self.config.min_velocity {
            return false;
        }

        info!(impulse, velocity, a = %a.id, b = %b.id, "collision");

        // Both sides respond, each against its own policy row; the rows
        // are intentionally asymmetric.
        for (own, other) in [(a, b), (b, a)] {
            let targets = policy::resolve(own.kind, other.kind);
            let _ = commands.send(EngineCommand::SetTargets {
                orb: own.id,
                targets,
            });
            let _ = commands.send(EngineCommand::PlayNote {
                orb: own.id,
                velocity,
            });
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn velocity_calibration() {
        assert_eq!(compute_velocity(300_000.0, 30_000.0), 10);
        assert_eq!(compute_velocity(5_000_000.0, 30_000.0), 127);
        assert_eq!(compute_velocity(0.0, 30_000.0), 0);
        assert_eq!(compute_velocity(f32::NAN, 30_000.0), 0);
    }
}
