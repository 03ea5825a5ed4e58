//! PTZ control module
//!
//! Turns movement intents into pose register updates and actuation commands. Which commands an
//! intent produces depends on the deployment's [`Strategy`].

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod dwell;
mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use ptz_if::{ActCmd, Pose};

use crate::{actuator::Dispatch, pose_reg::PoseLimits, preset_store::Mutation};

pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A command sent to the actuator and what came of it.
#[derive(Debug)]
pub struct Actuation {
    pub cmd: ActCmd,

    pub dispatch: Dispatch,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// What an accepted intent did.
///
/// Intents never fail because of the rig or the preset file, this only tells the caller whether
/// anything happened.
#[derive(Debug)]
pub enum Outcome {
    /// The intent was carried out. `pose` is the register value after the intent.
    Actuated {
        pose: Pose,
        actuations: Vec<Actuation>,
    },

    /// A dwelling move was cut short by a stop. The register already holds the move's target.
    Interrupted {
        pose: Pose,
        actuations: Vec<Actuation>,
    },

    /// A preset was removed.
    Removed(Mutation),

    /// The intent was accepted but nothing was done.
    Ignored(IgnoreCause),
}

/// Reasons an intent is ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreCause {
    /// A required preset token was empty.
    EmptyToken,

    /// No preset has this token.
    UnknownPreset(String),

    /// Every axis of the requested motion was zero, or clamped to zero at a limit.
    NoMotion,

    /// The preset's token contains characters which cannot be sent to the rig.
    UnusableToken(String),
}

/// Possible errors that can occur during PtzCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum PtzCtrlError {
    #[error("Expected {0} to be a finite number")]
    NonFinite(&'static str),

    #[error("Pose limits must be finite with each minimum below its maximum, found {0:?}")]
    InvalidLimits(PoseLimits),

    #[error("Scale factors must be finite and positive, found pan {0} and tilt {1}")]
    InvalidScale(f64, f64),

    #[error("Home index {0:?} cannot be sent to the rig, only [A-Za-z0-9_.-] are allowed")]
    InvalidHomeIndex(String),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Outcome {
    /// Commands sent to the actuator, in order.
    pub fn actuations(&self) -> &[Actuation] {
        match self {
            Outcome::Actuated { actuations, .. } | Outcome::Interrupted { actuations, .. } => {
                actuations
            }
            _ => &[],
        }
    }

    /// Pose reported by the outcome, if the intent involved the rig.
    pub fn pose(&self) -> Option<Pose> {
        match self {
            Outcome::Actuated { pose, .. } | Outcome::Interrupted { pose, .. } => Some(*pose),
            _ => None,
        }
    }
}
