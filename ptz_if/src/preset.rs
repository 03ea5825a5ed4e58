//! # Presets
//!
//! A preset is a named, tokenised pose plus zoom value which can be recalled later.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::pose::Pose;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Zoom recorded into a preset when the rig has no zoom axis.
pub const DEFAULT_ZOOM: f64 = 1.0;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A saved position.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Preset {
    /// Unique, non-empty identifier of the preset.
    pub token: String,

    /// Human readable name, defaults to the token.
    pub name: String,

    pub pose: Pose,

    pub zoom: f64,
}

/// The contents of a preset before a token has been assigned to it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PresetEntry {
    /// Optional name, the token is used when this is `None` or empty.
    pub name: Option<String>,

    pub pose: Pose,

    pub zoom: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PresetEntry {
    /// Snapshot a pose with the default zoom.
    pub fn at(pose: Pose, name: Option<&str>) -> Self {
        Self {
            name: name.map(String::from),
            pose,
            zoom: DEFAULT_ZOOM,
        }
    }

    /// Attach a token, resolving the name.
    pub fn into_preset(self, token: &str) -> Preset {
        let name = match self.name {
            Some(n) if !n.is_empty() => n,
            _ => token.to_string(),
        };

        Preset {
            token: token.to_string(),
            name,
            pose: self.pose,
            zoom: self.zoom,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// `true` if `c` may appear in a preset token.
///
/// Tokens are passed to the rig verbatim in URLs and shell commands, so they are limited to
/// characters which need no quoting in either.
pub fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')
}
