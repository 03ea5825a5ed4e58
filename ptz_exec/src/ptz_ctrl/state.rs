//! Implementations for the PtzCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};
use std::time::Duration;

// Internal
use super::{dwell::StopGate, Actuation, IgnoreCause, Outcome, Params, PtzCtrlError, Strategy};
use crate::{
    actuator::{Actuator, Dispatch},
    pose_reg::PoseReg,
    preset_store::{Mutation, PresetStore},
};
use ptz_if::{preset::is_token_char, ActCmd, Direction, Pose, Preset, PresetEntry};
use util::maths::{clamp, sign};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// PTZ control service.
///
/// Shared between request workers through an `Arc`. The pose register and the preset store each
/// carry their own lock, actuation runs outside both.
pub struct PtzCtrl {
    params: Params,

    pose: PoseReg,

    presets: Box<dyn PresetStore>,

    actuator: Box<dyn Actuator>,

    stop_gate: StopGate,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PtzCtrl {
    /// Create a new controller at the origin.
    pub fn new(
        params: Params,
        presets: Box<dyn PresetStore>,
        actuator: Box<dyn Actuator>,
    ) -> Result<Self, PtzCtrlError> {
        if !params.limits.is_valid() {
            return Err(PtzCtrlError::InvalidLimits(params.limits));
        }

        let scales_ok = [params.pan_scale_deg, params.tilt_scale_deg]
            .iter()
            .all(|s| s.is_finite() && *s > 0.0);
        if !scales_ok {
            return Err(PtzCtrlError::InvalidScale(
                params.pan_scale_deg,
                params.tilt_scale_deg,
            ));
        }

        let home_ok =
            !params.home_index.is_empty() && params.home_index.chars().all(is_token_char);
        if params.strategy == Strategy::Template && !home_ok {
            return Err(PtzCtrlError::InvalidHomeIndex(params.home_index));
        }

        debug!(
            "PtzCtrl using the {:?} strategy with the {} actuator",
            params.strategy,
            actuator.name()
        );

        Ok(Self {
            pose: PoseReg::new(params.limits),
            params,
            presets,
            actuator,
            stop_gate: StopGate::default(),
        })
    }

    /// Parameters the controller was created with.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Current pose of the rig as far as the controller knows.
    pub fn get_pose(&self) -> Pose {
        self.pose.get()
    }

    /// Move to an absolute pose, clamped into the limits.
    pub fn set_pose(&self, pan_deg: f64, tilt_deg: f64) -> Result<Outcome, PtzCtrlError> {
        finite("pan", pan_deg)?;
        finite("tilt", tilt_deg)?;

        let pose = self.pose.set(pan_deg, tilt_deg);
        info!("Absolute move to {}", pose);

        Ok(self.actuated(pose, vec![self.actuate(ActCmd::Pose(pose))]))
    }

    /// Move by a number of degrees on each axis.
    pub fn adjust_pose(&self, dpan_deg: f64, dtilt_deg: f64) -> Result<Outcome, PtzCtrlError> {
        finite("pan change", dpan_deg)?;
        finite("tilt change", dtilt_deg)?;

        if dpan_deg == 0.0 && dtilt_deg == 0.0 {
            return Ok(Outcome::Ignored(IgnoreCause::NoMotion));
        }

        match self.params.strategy {
            Strategy::Pose => {
                let pose = self.pose.adjust(dpan_deg, dtilt_deg);
                info!("Relative move by ({}, {}) to {}", dpan_deg, dtilt_deg, pose);

                Ok(self.actuated(pose, vec![self.actuate(ActCmd::Pose(pose))]))
            }
            Strategy::Template => Ok(self.dwell_move(dpan_deg, dtilt_deg)),
        }
    }

    /// Move by a fraction of the full scale change on each axis.
    ///
    /// `rx` and `ry` are clamped into `[-1, 1]`.
    pub fn relative_move(&self, rx: f64, ry: f64) -> Result<Outcome, PtzCtrlError> {
        finite("x", rx)?;
        finite("y", ry)?;

        let rx = clamp(rx, -1.0, 1.0);
        let ry = clamp(ry, -1.0, 1.0);

        self.adjust_pose(rx * self.params.pan_scale_deg, ry * self.params.tilt_scale_deg)
    }

    /// Start moving in the direction given by the sign of each velocity.
    ///
    /// Only the signs are used. The pose register is not changed.
    pub fn continuous_move(&self, vx: f64, vy: f64) -> Result<Outcome, PtzCtrlError> {
        finite("x velocity", vx)?;
        finite("y velocity", vy)?;

        let dirs: Vec<Direction> = Direction::pan(sign(vx))
            .into_iter()
            .chain(Direction::tilt(sign(vy)))
            .collect();

        if dirs.is_empty() {
            return Ok(Outcome::Ignored(IgnoreCause::NoMotion));
        }

        info!("Continuous move {:?}", dirs);

        let actuations = dirs
            .into_iter()
            .map(|d| self.actuate(ActCmd::Move(d)))
            .collect();

        Ok(self.actuated(self.pose.get(), actuations))
    }

    /// Start moving in a single direction. The pose register is not changed.
    pub fn move_directional(&self, direction: Direction) -> Outcome {
        info!("Moving {}", direction);

        self.actuated(self.pose.get(), vec![self.actuate(ActCmd::Move(direction))])
    }

    /// Stop all motion and cut short any dwelling move.
    pub fn stop(&self) -> Outcome {
        self.stop_gate.trigger();
        info!("Stop");

        self.actuated(self.pose.get(), vec![self.actuate(ActCmd::Stop)])
    }

    /// All presets in ascending token order.
    pub fn list_presets(&self) -> Vec<Preset> {
        self.presets.list()
    }

    /// Save the current pose as a preset.
    ///
    /// A missing or empty token is replaced by the smallest free positive integer.
    pub fn set_preset(&self, token: Option<&str>, name: Option<&str>) -> Mutation {
        let pose = self.pose.get();
        let mutation = self.presets.put(token, PresetEntry::at(pose, name));

        info!(
            "{} preset {} at {}",
            if mutation.existed { "Overwrote" } else { "Saved" },
            mutation.token,
            pose
        );

        mutation
    }

    /// Remove a preset.
    pub fn remove_preset(&self, token: &str) -> Outcome {
        if token.trim().is_empty() {
            return Outcome::Ignored(IgnoreCause::EmptyToken);
        }

        let mutation = self.presets.remove(token);

        if mutation.existed {
            info!("Removed preset {}", mutation.token);
            Outcome::Removed(mutation)
        } else {
            debug!("No preset {} to remove", mutation.token);
            Outcome::Ignored(IgnoreCause::UnknownPreset(mutation.token))
        }
    }

    /// Move to a saved preset. An unknown token leaves everything unchanged.
    pub fn goto_preset(&self, token: &str) -> Outcome {
        if token.trim().is_empty() {
            return Outcome::Ignored(IgnoreCause::EmptyToken);
        }

        let preset = match self.presets.get(token) {
            Some(p) => p,
            None => {
                info!("Preset {} not found", token);
                return Outcome::Ignored(IgnoreCause::UnknownPreset(token.to_string()));
            }
        };

        // The rig recalls by token, one it cannot be sent must not move the register
        if self.params.strategy == Strategy::Template
            && !preset.token.chars().all(is_token_char)
        {
            warn!("Preset token {:?} cannot be sent to the rig", preset.token);
            return Outcome::Ignored(IgnoreCause::UnusableToken(preset.token));
        }

        let pose = self.pose.set(preset.pose.pan_deg, preset.pose.tilt_deg);
        info!("Going to preset {} ({}) at {}", preset.token, preset.name, pose);

        let cmd = match self.params.strategy {
            Strategy::Pose => ActCmd::Pose(pose),
            Strategy::Template => ActCmd::Recall(preset.token),
        };

        self.actuated(pose, vec![self.actuate(cmd)])
    }

    /// Move to the origin.
    pub fn goto_home(&self) -> Outcome {
        let pose = self.pose.set(0.0, 0.0);
        info!("Going home to {}", pose);

        let cmd = match self.params.strategy {
            Strategy::Pose => ActCmd::Pose(pose),
            Strategy::Template => ActCmd::Home(self.params.home_index.clone()),
        };

        self.actuated(pose, vec![self.actuate(cmd)])
    }

    /// Relative move on a fixed-speed rig.
    ///
    /// Each axis the register actually moved on is driven in turn, held for a time proportional
    /// to its clamped change, then stopped. A stop arriving during a dwell ends the move without
    /// a further stop command. A stop arriving while the move command was in flight may have
    /// reached the rig first, so the move is stopped again.
    fn dwell_move(&self, dpan_deg: f64, dtilt_deg: f64) -> Outcome {
        let since = self.stop_gate.epoch();
        let (before, pose) = self.pose.step(dpan_deg, dtilt_deg);
        let dpan_deg = pose.pan_deg - before.pan_deg;
        let dtilt_deg = pose.tilt_deg - before.tilt_deg;

        if dpan_deg == 0.0 && dtilt_deg == 0.0 {
            info!("Relative move ignored, already at the limit {}", pose);
            return Outcome::Ignored(IgnoreCause::NoMotion);
        }

        info!("Relative move by ({}, {}) to {}", dpan_deg, dtilt_deg, pose);

        let axes = [
            (Direction::pan(sign(dpan_deg)), dpan_deg, self.params.pan_scale_deg),
            (Direction::tilt(sign(dtilt_deg)), dtilt_deg, self.params.tilt_scale_deg),
        ];

        let mut actuations = Vec::new();

        for &(dir, delta, scale) in axes.iter() {
            let dir = match dir {
                Some(d) => d,
                None => continue,
            };

            actuations.push(self.actuate(ActCmd::Move(dir)));

            if self.stop_gate.epoch() != since {
                info!("Stop arrived while starting move {}, stopping again", dir);
                actuations.push(self.actuate(ActCmd::Stop));
                return Outcome::Interrupted { pose, actuations };
            }

            let dwell = self.dwell_time(delta, scale);
            debug!("Dwelling {:?} moving {}", dwell, dir);

            if !self.stop_gate.dwell(since, dwell) {
                info!("Move {} cut short by a stop", dir);
                return Outcome::Interrupted { pose, actuations };
            }

            actuations.push(self.actuate(ActCmd::Stop));
        }

        Outcome::Actuated { pose, actuations }
    }

    /// Time to hold a fixed-speed move for a change of `delta` on an axis of the given scale.
    fn dwell_time(&self, delta: f64, scale_deg: f64) -> Duration {
        let ms = (delta.abs() / scale_deg) * self.params.dwell_full_scale_ms as f64;

        Duration::from_millis(ms.min(self.params.max_dwell_ms as f64).round() as u64)
    }

    fn actuated(&self, pose: Pose, actuations: Vec<Actuation>) -> Outcome {
        Outcome::Actuated { pose, actuations }
    }

    /// Send a command to the actuator and log the result.
    fn actuate(&self, cmd: ActCmd) -> Actuation {
        let dispatch = self.actuator.dispatch(&cmd);

        match &dispatch {
            Dispatch::Completed { ok: true, code } => debug!(
                "{} {} command completed ({})",
                self.actuator.name(),
                cmd.kind(),
                code
            ),
            Dispatch::Completed { ok: false, code } => warn!(
                "{} {} command reported failure ({})",
                self.actuator.name(),
                cmd.kind(),
                code
            ),
            Dispatch::Failed(e) => warn!(
                "{} {} command failed: {}",
                self.actuator.name(),
                cmd.kind(),
                e
            ),
            Dispatch::Unsupported => info!(
                "The {} actuator has no {} command configured",
                self.actuator.name(),
                cmd.kind()
            ),
        }

        Actuation { cmd, dispatch }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

fn finite(what: &'static str, value: f64) -> Result<(), PtzCtrlError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(PtzCtrlError::NonFinite(what))
    }
}
