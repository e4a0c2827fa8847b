//! Audio plumbing: voice mixer, output guard, cpal transport, wav capture.

pub mod engine;
pub mod limiter;
pub mod mixer;
pub mod output;
pub mod writer;

pub use engine::{AudioEngine, EngineError};
pub use mixer::{EngineCommand, Mixer};
