//! # Actuator Module
//!
//! This module provides a unified actuation interface which abstracts over the channel used to
//! command the rig:
//! - [`HttpActuator`] calls a local HTTP control endpoint, carrying absolute pan/tilt values.
//! - [`TemplateActuator`] substitutes a value into a configured command template and runs it.
//!
//! Actuation is fire-and-forget. The result of every call is returned as a [`Dispatch`] for
//! diagnostics, but it never becomes an error for the caller of a movement.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// [`Actuator`] implementation for HTTP control endpoints.
pub mod http;

/// [`Actuator`] implementation running templated external commands.
pub mod template;

#[cfg(test)]
pub(crate) mod mock;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use ptz_if::{preset::is_token_char, ActCmd};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use http::{HttpActuator, HttpMethod, HttpParams};
pub use template::{TemplateActuator, TemplateParams};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Default bound on a single actuation call.
pub const DEFAULT_TIMEOUT_MS: u64 = 2000;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Trait to provide a unified API for the actuation channel.
pub trait Actuator: Send + Sync {
    /// Name of the channel, used in logs.
    fn name(&self) -> &'static str;

    /// Issue a command to the rig and wait for the call to complete or time out.
    fn dispatch(&self, cmd: &ActCmd) -> Dispatch;
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Parameters selecting and configuring the actuation channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ActuatorParams {
    Http(HttpParams),
    Template(TemplateParams),
}

/// The outcome of a single actuation call.
#[derive(Debug)]
pub enum Dispatch {
    /// The call completed.
    ///
    /// `code` is the HTTP status or the process exit code, `ok` is `true` if the channel
    /// considers it a success.
    Completed { code: i32, ok: bool },

    /// The call could not be completed.
    Failed(ActuatorError),

    /// The channel has no way to express this command.
    Unsupported,
}

/// Errors which can occur during an actuation call.
#[derive(thiserror::Error, Debug)]
pub enum ActuatorError {
    #[error("HTTP request failed: {0}")]
    Http(ureq::Error),

    #[error("Could not spawn the command: {0}")]
    Spawn(std::io::Error),

    #[error("Could not wait for the command: {0}")]
    Wait(std::io::Error),

    #[error("The command was terminated by a signal")]
    Terminated,

    #[error("No response after {0:?}")]
    Timeout(Duration),

    #[error("Refusing to substitute \"{0}\" into the command, only [A-Za-z0-9_.-] are allowed")]
    UnsafeValue(String),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Dispatch {
    /// `true` if the call completed and the channel reported success.
    pub fn is_ok(&self) -> bool {
        matches!(self, Dispatch::Completed { ok: true, .. })
    }
}

impl ActuatorParams {
    /// Build the actuator described by these parameters.
    pub fn build(&self) -> Box<dyn Actuator> {
        match self {
            ActuatorParams::Http(p) => Box::new(HttpActuator::new(p.clone())),
            ActuatorParams::Template(p) => Box::new(TemplateActuator::new(p.clone())),
        }
    }
}

impl Default for ActuatorParams {
    fn default() -> Self {
        ActuatorParams::Http(HttpParams::default())
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Format an angle for a command, whole degrees as the rig expects.
pub(crate) fn format_deg(value: f64) -> String {
    format!("{:.0}", value)
}

/// `true` if the value can be placed into a URL path or shell command without quoting.
pub(crate) fn is_safe_value(value: &str) -> bool {
    !value.is_empty() && value.chars().all(is_token_char)
}
