//! # PTZ Executable Parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;
use std::path::PathBuf;

use crate::{actuator::ActuatorParams, ptz_ctrl};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct PtzExecParams {
    /// Path of the preset file
    #[serde(default = "default_preset_file")]
    pub preset_file: PathBuf,

    /// Console history file, relative to the software root
    #[serde(default = "default_history_file")]
    pub history_file: PathBuf,

    /// Movement policy parameters
    #[serde(default)]
    pub ctrl: ptz_ctrl::Params,

    /// Actuation channel
    #[serde(default)]
    pub actuator: ActuatorParams,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for PtzExecParams {
    fn default() -> Self {
        Self {
            preset_file: default_preset_file(),
            history_file: default_history_file(),
            ctrl: ptz_ctrl::Params::default(),
            actuator: ActuatorParams::default(),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn default_preset_file() -> PathBuf {
    PathBuf::from("/var/lib/ptz_exec/presets.txt")
}

fn default_history_file() -> PathBuf {
    PathBuf::from("data/ptz_history.txt")
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ptz_ctrl::Strategy;

    #[test]
    fn test_empty_file_defaults() {
        let params: PtzExecParams = toml::from_str("").unwrap();

        assert_eq!(params.preset_file, PathBuf::from("/var/lib/ptz_exec/presets.txt"));
        assert_eq!(params.ctrl.strategy, Strategy::Pose);
        assert_eq!(params.ctrl.pan_scale_deg, 45.0);
        assert!(matches!(params.actuator, ActuatorParams::Http(_)));
    }

    #[test]
    fn test_shipped_params() {
        let text = include_str!("../../params/ptz_exec.toml");
        let params: PtzExecParams = toml::from_str(text).unwrap();

        assert!(params.ctrl.limits.is_valid());
        assert_eq!(params.ctrl.strategy, Strategy::Pose);
    }

    #[test]
    fn test_template_deployment() {
        let params: PtzExecParams = toml::from_str(
            r#"
            preset_file = "/tmp/presets.txt"

            [ctrl]
            strategy = "template"
            home_index = "0"
            dwell_full_scale_ms = 800

            [ctrl.limits]
            pan_min_deg = -170.0
            pan_max_deg = 170.0
            tilt_min_deg = -30.0
            tilt_max_deg = 90.0

            [actuator]
            kind = "template"
            move_cmd = "ptzctl move %s"
            stop_cmd = "ptzctl stop"
            "#,
        )
        .unwrap();

        assert_eq!(params.ctrl.strategy, Strategy::Template);
        assert_eq!(params.ctrl.home_index, "0");
        assert_eq!(params.ctrl.dwell_full_scale_ms, 800);
        assert_eq!(params.ctrl.limits.pan_min_deg, -170.0);
        assert!(matches!(params.actuator, ActuatorParams::Template(_)));
    }
}
