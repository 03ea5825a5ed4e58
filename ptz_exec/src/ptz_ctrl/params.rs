//! Parameters structure for PtzCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::pose_reg::PoseLimits;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for PTZ control.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Params {
    /// How intents are expressed to the rig.
    #[serde(default)]
    pub strategy: Strategy,

    // ---- GEOMETRY ----

    /// Range of each axis.
    #[serde(default)]
    pub limits: PoseLimits,

    /// Pan change for a full scale (1.0) relative move.
    ///
    /// Units: degrees
    #[serde(default = "default_scale_deg")]
    pub pan_scale_deg: f64,

    /// Tilt change for a full scale (1.0) relative move.
    ///
    /// Units: degrees
    #[serde(default = "default_scale_deg")]
    pub tilt_scale_deg: f64,

    // ---- TEMPLATE STRATEGY ----

    /// Index passed to the rig's home command.
    #[serde(default = "default_home_index")]
    pub home_index: String,

    /// Time spent moving for a full scale relative move on a fixed-speed rig.
    ///
    /// Units: milliseconds
    #[serde(default = "default_dwell_full_scale_ms")]
    pub dwell_full_scale_ms: u64,

    /// Longest time spent moving on one axis for a single relative move.
    ///
    /// Units: milliseconds
    #[serde(default = "default_max_dwell_ms")]
    pub max_dwell_ms: u64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// How movement intents are expressed to the rig. Exactly one is used per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// The rig accepts absolute poses.
    ///
    /// Relative moves, preset recall and home all send the resulting absolute pose.
    Pose,

    /// The rig moves at a fixed speed in a direction and remembers its own presets.
    ///
    /// Relative moves become a directional move, a dwell proportional to the distance and a
    /// stop. Preset recall and home send the rig's own recall commands.
    Template,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Strategy {
    fn default() -> Self {
        Strategy::Pose
    }
}

impl Default for Params {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            limits: PoseLimits::default(),
            pan_scale_deg: default_scale_deg(),
            tilt_scale_deg: default_scale_deg(),
            home_index: default_home_index(),
            dwell_full_scale_ms: default_dwell_full_scale_ms(),
            max_dwell_ms: default_max_dwell_ms(),
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

fn default_scale_deg() -> f64 {
    45.0
}

fn default_home_index() -> String {
    String::from("1")
}

fn default_dwell_full_scale_ms() -> u64 {
    1000
}

fn default_max_dwell_ms() -> u64 {
    5000
}
