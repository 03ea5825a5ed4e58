//! # Console
//!
//! Executes operator telecommands against the controller and renders the result as a single
//! report line.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use ptz_if::tc::PtzCmd;

use crate::{
    actuator::Dispatch,
    ptz_ctrl::{IgnoreCause, Outcome, PtzCtrl, PtzCtrlError},
};

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Execute a telecommand, returning the report for the operator.
pub fn execute(ctrl: &PtzCtrl, cmd: PtzCmd) -> Result<String, PtzCtrlError> {
    let outcome = match cmd {
        PtzCmd::GetPose => return Ok(format!("{}", ctrl.get_pose())),
        PtzCmd::AbsoluteMove { pan_deg, tilt_deg } => ctrl.set_pose(pan_deg, tilt_deg)?,
        PtzCmd::AdjustPose {
            dpan_deg,
            dtilt_deg,
        } => ctrl.adjust_pose(dpan_deg, dtilt_deg)?,
        PtzCmd::RelativeMove { rx, ry } => ctrl.relative_move(rx, ry)?,
        PtzCmd::ContinuousMove { vx, vy } => ctrl.continuous_move(vx, vy)?,
        PtzCmd::MoveDirectional { direction } => ctrl.move_directional(direction),
        PtzCmd::Stop => ctrl.stop(),
        PtzCmd::ListPresets => {
            let presets = ctrl.list_presets();
            if presets.is_empty() {
                return Ok(String::from("no presets"));
            }

            return Ok(presets
                .iter()
                .map(|p| format!("{} {} {} zoom={}", p.token, p.name, p.pose, p.zoom))
                .collect::<Vec<_>>()
                .join("\n"));
        }
        PtzCmd::SetPreset { token, name } => {
            let m = ctrl.set_preset(token.as_deref(), name.as_deref());
            return Ok(format!(
                "saved preset {}{}",
                m.token,
                if m.persisted { "" } else { " (not persisted)" }
            ));
        }
        PtzCmd::RemovePreset { token } => ctrl.remove_preset(&token),
        PtzCmd::GotoPreset { token } => ctrl.goto_preset(&token),
        PtzCmd::GotoHome => ctrl.goto_home(),
    };

    Ok(report(&outcome))
}

/// Render an outcome for the operator.
pub fn report(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Actuated { pose, actuations } | Outcome::Interrupted { pose, actuations } => {
            let sent = actuations
                .iter()
                .map(|a| format!("{} {}", a.cmd.kind(), dispatch_word(&a.dispatch)))
                .collect::<Vec<_>>()
                .join(", ");

            let interrupted = matches!(outcome, Outcome::Interrupted { .. });

            format!(
                "{}{} [{}]",
                pose,
                if interrupted { " interrupted" } else { "" },
                sent
            )
        }
        Outcome::Removed(m) => format!("removed preset {}", m.token),
        Outcome::Ignored(IgnoreCause::EmptyToken) => String::from("ignored: empty token"),
        Outcome::Ignored(IgnoreCause::UnknownPreset(t)) => format!("ignored: no preset {}", t),
        Outcome::Ignored(IgnoreCause::NoMotion) => String::from("ignored: no motion"),
        Outcome::Ignored(IgnoreCause::UnusableToken(t)) => {
            format!("ignored: preset token {} cannot be sent to the rig", t)
        }
    }
}

fn dispatch_word(dispatch: &Dispatch) -> String {
    match dispatch {
        Dispatch::Completed { ok: true, .. } => String::from("ok"),
        Dispatch::Completed { ok: false, code } => format!("failed ({})", code),
        Dispatch::Failed(e) => format!("failed ({})", e),
        Dispatch::Unsupported => String::from("unsupported"),
    }
}
