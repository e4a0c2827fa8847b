pub mod kind;
pub mod orb;
pub mod policy;
pub mod router;
pub mod session;

pub use kind::OrbKind;
pub use orb::{octave_range_for_size, Orb, OrbId};
pub use policy::resolve;
pub use router::{compute_velocity, CollisionRouter};
pub use session::Session;
