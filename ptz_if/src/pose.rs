//! # Pose

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::fmt;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Pan/tilt orientation of the rig.
#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq)]
pub struct Pose {
    /// Pan angle.
    ///
    /// Units: degrees
    pub pan_deg: f64,

    /// Tilt angle.
    ///
    /// Units: degrees
    pub tilt_deg: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Pose {
    pub const fn new(pan_deg: f64, tilt_deg: f64) -> Self {
        Self { pan_deg, tilt_deg }
    }
}

impl fmt::Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(pan={:.2}, tilt={:.2})", self.pan_deg, self.tilt_deg)
    }
}
