//! [`Actuator`] implementation running templated external commands.
//!
//! Each command kind has its own template containing a single placeholder marker. The marker is
//! replaced by the command's value (direction word, preset token, home index or `stop`) and the
//! result is run through the configured shell.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, trace};
use ptz_if::ActCmd;
use serde::{Deserialize, Serialize};
use std::{
    process::{Command, Stdio},
    thread,
    time::{Duration, Instant},
};

use super::{is_safe_value, Actuator, ActuatorError, Dispatch, DEFAULT_TIMEOUT_MS};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// How often a running command is checked for completion.
const POLL_PERIOD: Duration = Duration::from_millis(5);

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters for the template actuator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateParams {
    /// Shell used to run commands, invoked as `<shell> -c <command>`.
    #[serde(default = "default_shell")]
    pub shell: String,

    /// Placeholder replaced by the command's value.
    #[serde(default = "default_marker")]
    pub marker: String,

    /// Command starting a directional move, the value is the direction word.
    #[serde(default)]
    pub move_cmd: Option<String>,

    /// Command stopping all motion, the value is `stop`.
    #[serde(default)]
    pub stop_cmd: Option<String>,

    /// Command recalling a preset held by the rig, the value is the preset token.
    #[serde(default)]
    pub recall_cmd: Option<String>,

    /// Command recalling the rig's home position, the value is the home index.
    #[serde(default)]
    pub home_cmd: Option<String>,

    /// Bound on a single command, which is killed when it overruns.
    ///
    /// Units: milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Actuator running templated commands.
pub struct TemplateActuator {
    params: TemplateParams,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TemplateActuator {
    pub fn new(params: TemplateParams) -> Self {
        Self { params }
    }

    /// Build the command line for a command, `Ok(None)` if no template is configured for it.
    pub fn command_line(&self, cmd: &ActCmd) -> Result<Option<String>, ActuatorError> {
        let (template, value) = match cmd {
            // Fixed-speed rigs have no absolute positioning
            ActCmd::Pose(_) => return Ok(None),
            ActCmd::Move(dir) => (&self.params.move_cmd, dir.word()),
            ActCmd::Stop => (&self.params.stop_cmd, "stop"),
            ActCmd::Recall(token) => (&self.params.recall_cmd, token.as_str()),
            ActCmd::Home(index) => (&self.params.home_cmd, index.as_str()),
        };

        match template {
            Some(t) => {
                if !is_safe_value(value) {
                    return Err(ActuatorError::UnsafeValue(value.to_string()));
                }
                Ok(Some(t.replacen(&self.params.marker, value, 1)))
            }
            None => Ok(None),
        }
    }

    /// Run a command line, killing it if it overruns the timeout.
    fn run(&self, line: &str) -> Dispatch {
        let timeout = Duration::from_millis(self.params.timeout_ms);

        let mut child = match Command::new(&self.params.shell)
            .arg("-c")
            .arg(line)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(c) => c,
            Err(e) => return Dispatch::Failed(ActuatorError::Spawn(e)),
        };

        let started = Instant::now();

        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    trace!("\"{}\" exited after {:?}", line, started.elapsed());
                    return match status.code() {
                        Some(code) => Dispatch::Completed { code, ok: code == 0 },
                        None => Dispatch::Failed(ActuatorError::Terminated),
                    };
                }
                Ok(None) if started.elapsed() >= timeout => {
                    // Reap the child so it does not linger as a zombie
                    let _ = child.kill();
                    let _ = child.wait();
                    return Dispatch::Failed(ActuatorError::Timeout(timeout));
                }
                Ok(None) => thread::sleep(POLL_PERIOD),
                Err(e) => return Dispatch::Failed(ActuatorError::Wait(e)),
            }
        }
    }
}

impl Actuator for TemplateActuator {
    fn name(&self) -> &'static str {
        "template"
    }

    fn dispatch(&self, cmd: &ActCmd) -> Dispatch {
        let line = match self.command_line(cmd) {
            Ok(Some(l)) => l,
            Ok(None) => return Dispatch::Unsupported,
            Err(e) => return Dispatch::Failed(e),
        };

        debug!("Running \"{}\"", line);
        self.run(&line)
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn default_shell() -> String {
    String::from("sh")
}

fn default_marker() -> String {
    String::from("%s")
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

#[cfg(test)]
mod test {
    use super::*;
    use ptz_if::{Direction, Pose};
    use std::fs;

    fn params() -> TemplateParams {
        TemplateParams {
            shell: default_shell(),
            marker: default_marker(),
            move_cmd: None,
            stop_cmd: None,
            recall_cmd: None,
            home_cmd: None,
            timeout_ms: 1000,
        }
    }

    #[test]
    fn test_substitutes_value() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.txt");

        let act = TemplateActuator::new(TemplateParams {
            recall_cmd: Some(format!("echo preset %s >> {}", out.display())),
            home_cmd: Some(format!("echo home %s >> {}", out.display())),
            ..params()
        });

        assert!(act.dispatch(&ActCmd::Recall("A".into())).is_ok());
        assert!(act.dispatch(&ActCmd::Home("0".into())).is_ok());
        assert_eq!(fs::read_to_string(&out).unwrap(), "preset A\nhome 0\n");
    }

    #[test]
    fn test_single_marker() {
        let act = TemplateActuator::new(TemplateParams {
            move_cmd: Some("ptzctl %s %s".into()),
            ..params()
        });

        assert_eq!(
            act.command_line(&ActCmd::Move(Direction::Up)).unwrap().unwrap(),
            "ptzctl up %s"
        );
    }

    #[test]
    fn test_exit_code_is_recorded() {
        let act = TemplateActuator::new(TemplateParams {
            move_cmd: Some("test %s = left".into()),
            stop_cmd: Some("exit 3".into()),
            ..params()
        });

        assert!(matches!(
            act.dispatch(&ActCmd::Move(Direction::Left)),
            Dispatch::Completed { code: 0, ok: true }
        ));
        assert!(matches!(
            act.dispatch(&ActCmd::Move(Direction::Right)),
            Dispatch::Completed { code: 1, ok: false }
        ));
        assert!(matches!(
            act.dispatch(&ActCmd::Stop),
            Dispatch::Completed { code: 3, ok: false }
        ));
    }

    #[test]
    fn test_timeout_kills_command() {
        let act = TemplateActuator::new(TemplateParams {
            stop_cmd: Some("sleep 5".into()),
            timeout_ms: 100,
            ..params()
        });

        let started = Instant::now();
        assert!(matches!(
            act.dispatch(&ActCmd::Stop),
            Dispatch::Failed(ActuatorError::Timeout(_))
        ));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_unsafe_value_is_not_run() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("ran");

        let act = TemplateActuator::new(TemplateParams {
            recall_cmd: Some(format!("touch {} ; echo %s", marker.display())),
            ..params()
        });

        assert!(matches!(
            act.dispatch(&ActCmd::Recall("1;reboot".into())),
            Dispatch::Failed(ActuatorError::UnsafeValue(_))
        ));
        assert!(!marker.exists());
    }

    #[test]
    fn test_unsupported() {
        let act = TemplateActuator::new(params());

        assert!(matches!(
            act.dispatch(&ActCmd::Pose(Pose::new(1.0, 2.0))),
            Dispatch::Unsupported
        ));
        assert!(matches!(act.dispatch(&ActCmd::Stop), Dispatch::Unsupported));
    }

    #[test]
    fn test_spawn_failure() {
        let act = TemplateActuator::new(TemplateParams {
            shell: "/nonexistent/shell".into(),
            stop_cmd: Some("true".into()),
            ..params()
        });

        assert!(matches!(
            act.dispatch(&ActCmd::Stop),
            Dispatch::Failed(ActuatorError::Spawn(_))
        ));
    }
}
