//! Recording [`Actuator`] for tests.

use ptz_if::ActCmd;
use std::{
    sync::{Arc, Mutex},
    thread,
    time::Duration,
};

use super::{Actuator, Dispatch};

/// Records every command and reports success.
///
/// Commands are recorded when their dispatch completes, the order the rig would act on them.
#[derive(Default, Clone)]
pub(crate) struct RecordingActuator {
    sent: Arc<Mutex<Vec<ActCmd>>>,

    move_delay: Duration,
}

impl RecordingActuator {
    /// An actuator whose `Move` commands take `delay` to complete.
    pub fn with_move_delay(delay: Duration) -> Self {
        Self {
            move_delay: delay,
            ..Self::default()
        }
    }

    /// Commands dispatched so far, in order.
    pub fn sent(&self) -> Vec<ActCmd> {
        self.sent.lock().unwrap().clone()
    }
}

impl Actuator for RecordingActuator {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn dispatch(&self, cmd: &ActCmd) -> Dispatch {
        if let ActCmd::Move(_) = cmd {
            thread::sleep(self.move_delay);
        }

        self.sent.lock().unwrap().push(cmd.clone());
        Dispatch::Completed { code: 0, ok: true }
    }
}
