//! # Telecommand module
//!
//! Commands accepted by the PTZ executable, one per console line. Each command maps onto one
//! operation of the core API.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use structopt::{clap::AppSettings, StructOpt};

use crate::eqpt::Direction;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A PTZ telecommand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, StructOpt)]
#[structopt(
    name = "ptz",
    global_setting = AppSettings::AllowNegativeNumbers,
    global_setting = AppSettings::DisableVersion
)]
pub enum PtzCmd {
    /// Print the current pose.
    #[structopt(name = "pose")]
    GetPose,

    /// Move to an absolute pose.
    #[structopt(name = "abs")]
    AbsoluteMove {
        /// Pan angle in degrees.
        pan_deg: f64,

        /// Tilt angle in degrees.
        tilt_deg: f64,
    },

    /// Move by a number of degrees on each axis.
    #[structopt(name = "adj")]
    AdjustPose {
        dpan_deg: f64,
        dtilt_deg: f64,
    },

    /// Move by a normalised translation, each axis in [-1, 1].
    #[structopt(name = "rel")]
    RelativeMove {
        rx: f64,
        ry: f64,
    },

    /// Move continuously with the sign of each velocity axis until stopped.
    #[structopt(name = "cont")]
    ContinuousMove {
        vx: f64,
        vy: f64,
    },

    /// Move continuously in one direction until stopped.
    #[structopt(name = "move")]
    MoveDirectional {
        /// One of left, right, up, down.
        direction: Direction,
    },

    /// Stop all motion.
    #[structopt(name = "stop")]
    Stop,

    /// List saved presets.
    #[structopt(name = "presets")]
    ListPresets,

    /// Save the current pose as a preset.
    #[structopt(name = "save")]
    SetPreset {
        /// Token to save under, the smallest free number is used if omitted.
        #[structopt(short, long)]
        token: Option<String>,

        /// Name of the preset, defaults to the token.
        #[structopt(short, long)]
        name: Option<String>,
    },

    /// Remove a preset.
    #[structopt(name = "rm")]
    RemovePreset {
        token: String,
    },

    /// Move to a saved preset.
    #[structopt(name = "goto")]
    GotoPreset {
        token: String,
    },

    /// Move to the home position.
    #[structopt(name = "home")]
    GotoHome,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PtzCmd {
    /// Parse a command from a single console line.
    pub fn from_line(line: &str) -> Result<Self, structopt::clap::Error> {
        Self::from_iter_safe(std::iter::once("ptz").chain(line.split_whitespace()))
    }
}
