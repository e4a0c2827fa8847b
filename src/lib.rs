//! Core of the orb sandbox: physics collision events mapped to
//! scale-constrained FM notes with per-orb effect mixes.
//!
//! The physics engine, rendering and UI live outside this crate; it consumes
//! collision impulses and produces audio on a cpal output (or a wav file).

pub mod audio;
pub mod config;
pub mod music;
pub mod orb;
pub mod synth;
