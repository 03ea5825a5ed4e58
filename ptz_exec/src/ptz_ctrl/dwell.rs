//! Cancellable dwell shared between workers.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::{
    sync::{Condvar, Mutex, PoisonError},
    time::Duration,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Counts stops so that dwelling workers can tell whether one arrived since they started.
#[derive(Debug, Default)]
pub(crate) struct StopGate {
    epoch: Mutex<u64>,

    cvar: Condvar,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl StopGate {
    /// Current stop epoch, to be passed to [`StopGate::dwell`].
    pub fn epoch(&self) -> u64 {
        *self.epoch.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a stop and wake every dwelling worker.
    pub fn trigger(&self) {
        let mut epoch = self.epoch.lock().unwrap_or_else(PoisonError::into_inner);
        *epoch = epoch.wrapping_add(1);
        self.cvar.notify_all();
    }

    /// Block for `duration` unless a stop arrives.
    ///
    /// Returns `true` if the dwell ran to completion with no stop since `since` was taken.
    pub fn dwell(&self, since: u64, duration: Duration) -> bool {
        let epoch = self.epoch.lock().unwrap_or_else(PoisonError::into_inner);

        let (epoch, _) = self
            .cvar
            .wait_timeout_while(epoch, duration, |e| *e == since)
            .unwrap_or_else(PoisonError::into_inner);

        *epoch == since
    }
}
