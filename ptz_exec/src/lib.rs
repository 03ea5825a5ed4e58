//! # PTZ library.
//!
//! Motion core of the PTZ executable. Exposed as a library so the executable and any other
//! front end share the same controller.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Actuation channel - sends commands to the rig over HTTP or through templated shell commands
pub mod actuator;

/// Console - executes operator telecommands against the controller
pub mod console;

/// Executable parameters
pub mod params;

/// Pose register - the rig's current pan/tilt, clamped into its limits
pub mod pose_reg;

/// Preset store - saved positions persisted to a flat record file
pub mod preset_store;

/// PTZ control - turns movement intents into pose updates and actuation commands
pub mod ptz_ctrl;
