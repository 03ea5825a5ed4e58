//! # Equipment Interface
//!
//! This module defines the commands which are sent to the actuation channel of the rig.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::pose::Pose;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Directions a fixed-speed mechanism can be driven in.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

/// A command issued to the actuation channel.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum ActCmd {
    /// Drive the rig to an absolute pose.
    Pose(Pose),

    /// Start moving in a direction until stopped.
    Move(Direction),

    /// Stop all motion.
    Stop,

    /// Recall a preset held by the mechanism itself, by token.
    Recall(String),

    /// Recall the mechanism's home position, by index.
    Home(String),
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("\"{0}\" is not a direction, expected one of left, right, up or down")]
pub struct ParseDirectionError(pub String);

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Direction {
    /// Word used for this direction in commands and logs.
    pub fn word(&self) -> &'static str {
        match self {
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }

    /// Direction for motion along the pan axis with the given sign, `None` for zero.
    pub fn pan(sign: i8) -> Option<Self> {
        match sign {
            s if s > 0 => Some(Direction::Right),
            s if s < 0 => Some(Direction::Left),
            _ => None,
        }
    }

    /// Direction for motion along the tilt axis with the given sign, `None` for zero.
    pub fn tilt(sign: i8) -> Option<Self> {
        match sign {
            s if s > 0 => Some(Direction::Up),
            s if s < 0 => Some(Direction::Down),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.word())
    }
}

impl FromStr for Direction {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "left" | "l" => Ok(Direction::Left),
            "right" | "r" => Ok(Direction::Right),
            "up" | "u" => Ok(Direction::Up),
            "down" | "d" => Ok(Direction::Down),
            _ => Err(ParseDirectionError(s.to_string())),
        }
    }
}

impl ActCmd {
    /// Short name of the command kind, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ActCmd::Pose(_) => "pose",
            ActCmd::Move(_) => "move",
            ActCmd::Stop => "stop",
            ActCmd::Recall(_) => "recall",
            ActCmd::Home(_) => "home",
        }
    }
}
