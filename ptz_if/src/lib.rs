//! # PTZ interface crate.
//!
//! Provides all common interface types for the PTZ software: the rig pose, presets, actuation
//! commands sent to equipment and telecommands accepted from an operator.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Pan/tilt orientation of the rig
pub mod pose;

/// Saved positions
pub mod preset;

/// Command definitions for equipment (the actuation channel)
pub mod eqpt;

/// Telecommands accepted by the PTZ executable
pub mod tc;

// ------------------------------------------------------------------------------------------------
// REEXPORTS
// ------------------------------------------------------------------------------------------------

pub use eqpt::{ActCmd, Direction};
pub use pose::Pose;
pub use preset::{Preset, PresetEntry};
