//! # Pose Register
//!
//! Thread-safe store of the rig's current pan/tilt orientation. Every value that leaves the
//! register lies within the configured [`PoseLimits`], inputs outside them are clamped.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::trace;
use ptz_if::Pose;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError};
use util::maths::clamp;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Mechanical range of each axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseLimits {
    /// Units: degrees
    pub pan_min_deg: f64,

    /// Units: degrees
    pub pan_max_deg: f64,

    /// Units: degrees
    pub tilt_min_deg: f64,

    /// Units: degrees
    pub tilt_max_deg: f64,
}

/// The pose register.
///
/// All operations take the same internal lock and hold it only for the in-memory update.
#[derive(Debug)]
pub struct PoseReg {
    limits: PoseLimits,

    pose: Mutex<Pose>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for PoseLimits {
    fn default() -> Self {
        Self {
            pan_min_deg: 0.0,
            pan_max_deg: 180.0,
            tilt_min_deg: 0.0,
            tilt_max_deg: 180.0,
        }
    }
}

impl PoseLimits {
    /// `true` if every bound is finite and each minimum does not exceed its maximum.
    pub fn is_valid(&self) -> bool {
        [
            self.pan_min_deg,
            self.pan_max_deg,
            self.tilt_min_deg,
            self.tilt_max_deg,
        ]
        .iter()
        .all(|v| v.is_finite())
            && self.pan_min_deg <= self.pan_max_deg
            && self.tilt_min_deg <= self.tilt_max_deg
    }

    /// Clamp a pose into the limits.
    ///
    /// A non-finite axis is replaced by the same axis of `fallback`.
    pub fn clamp(&self, pose: Pose, fallback: Pose) -> Pose {
        let pan = if pose.pan_deg.is_finite() {
            pose.pan_deg
        } else {
            fallback.pan_deg
        };
        let tilt = if pose.tilt_deg.is_finite() {
            pose.tilt_deg
        } else {
            fallback.tilt_deg
        };

        Pose::new(
            clamp(pan, self.pan_min_deg, self.pan_max_deg),
            clamp(tilt, self.tilt_min_deg, self.tilt_max_deg),
        )
    }
}

impl PoseReg {
    /// Create a new register at the origin, clamped into the limits.
    pub fn new(limits: PoseLimits) -> Self {
        let origin = Pose::default();
        Self {
            limits,
            pose: Mutex::new(limits.clamp(origin, origin)),
        }
    }

    /// Limits every stored pose is clamped into.
    pub fn limits(&self) -> &PoseLimits {
        &self.limits
    }

    /// Get the current pose.
    pub fn get(&self) -> Pose {
        *self.lock()
    }

    /// Set the pose, clamping each axis independently. Returns the stored pose.
    pub fn set(&self, pan_deg: f64, tilt_deg: f64) -> Pose {
        let mut pose = self.lock();
        *pose = self.limits.clamp(Pose::new(pan_deg, tilt_deg), *pose);

        trace!("Pose set to {}", *pose);
        *pose
    }

    /// Add deltas to the current pose then clamp. Returns the stored pose.
    pub fn adjust(&self, dpan_deg: f64, dtilt_deg: f64) -> Pose {
        self.step(dpan_deg, dtilt_deg).1
    }

    /// As [`PoseReg::adjust`], returning the pose before and after the change.
    ///
    /// Both poses come from the same locked update, so their difference is the change the
    /// register accepted after clamping.
    pub fn step(&self, dpan_deg: f64, dtilt_deg: f64) -> (Pose, Pose) {
        let mut pose = self.lock();
        let before = *pose;
        let target = Pose::new(before.pan_deg + dpan_deg, before.tilt_deg + dtilt_deg);
        *pose = self.limits.clamp(target, before);

        trace!("Pose adjusted by ({}, {}) to {}", dpan_deg, dtilt_deg, *pose);
        (before, *pose)
    }

    /// A poisoned lock still guards a valid pose, every write leaves it clamped.
    fn lock(&self) -> MutexGuard<'_, Pose> {
        self.pose.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    const WIDE: PoseLimits = PoseLimits {
        pan_min_deg: -1.0e6,
        pan_max_deg: 1.0e6,
        tilt_min_deg: -1.0e6,
        tilt_max_deg: 1.0e6,
    };

    #[test]
    fn test_starts_at_origin() {
        let reg = PoseReg::new(PoseLimits::default());
        assert_eq!(reg.get(), Pose::new(0.0, 0.0));

        // Origin outside the limits is clamped in
        let reg = PoseReg::new(PoseLimits {
            pan_min_deg: 10.0,
            pan_max_deg: 20.0,
            tilt_min_deg: -20.0,
            tilt_max_deg: -10.0,
        });
        assert_eq!(reg.get(), Pose::new(10.0, -10.0));
    }

    #[test]
    fn test_set_clamps() {
        let reg = PoseReg::new(PoseLimits::default());

        for &(pan, tilt, expected) in &[
            (-30.0, 90.0, Pose::new(0.0, 90.0)),
            (400.0, -1.0, Pose::new(180.0, 0.0)),
            (180.0, 181.0, Pose::new(180.0, 180.0)),
            (12.5, 170.25, Pose::new(12.5, 170.25)),
        ] {
            assert_eq!(reg.set(pan, tilt), expected);
            assert_eq!(reg.get(), expected);
        }
    }

    #[test]
    fn test_non_finite_keeps_axis() {
        let reg = PoseReg::new(PoseLimits::default());
        reg.set(10.0, 20.0);

        assert_eq!(reg.set(f64::NAN, 30.0), Pose::new(10.0, 30.0));
        assert_eq!(reg.adjust(5.0, f64::INFINITY), Pose::new(15.0, 30.0));
        assert_eq!(reg.set(f64::NEG_INFINITY, f64::NAN), Pose::new(15.0, 30.0));
    }

    #[test]
    fn test_step_reports_accepted_change() {
        let reg = PoseReg::new(PoseLimits::default());
        reg.set(170.0, 90.0);

        let (before, after) = reg.step(45.0, -10.0);
        assert_eq!(before, Pose::new(170.0, 90.0));
        assert_eq!(after, Pose::new(180.0, 80.0));

        // At the limit nothing is accepted
        let (before, after) = reg.step(5.0, 0.0);
        assert_eq!(before, after);
    }

    #[test]
    fn test_adjust_clamps() {
        let reg = PoseReg::new(PoseLimits::default());

        assert_eq!(reg.adjust(-10.0, 45.0), Pose::new(0.0, 45.0));
        assert_eq!(reg.adjust(200.0, 200.0), Pose::new(180.0, 180.0));
        assert_eq!(reg.adjust(-45.0, -90.0), Pose::new(135.0, 90.0));
    }

    #[test]
    fn test_adjust_additive_within_bounds() {
        let split = PoseReg::new(PoseLimits::default());
        split.set(90.0, 90.0);
        split.adjust(12.25, -7.5);
        split.adjust(-3.0, 20.0);

        let joined = PoseReg::new(PoseLimits::default());
        joined.set(90.0, 90.0);
        joined.adjust(12.25 - 3.0, -7.5 + 20.0);

        assert_eq!(split.get(), joined.get());
    }

    #[test]
    fn test_concurrent_adjust() {
        const NUM_THREADS: usize = 32;
        const CALLS_PER_THREAD: usize = 50;

        let reg = Arc::new(PoseReg::new(WIDE));

        let handles: Vec<_> = (0..NUM_THREADS)
            .map(|_| {
                let reg = reg.clone();
                thread::spawn(move || {
                    for _ in 0..CALLS_PER_THREAD {
                        reg.adjust(0.5, -0.25);
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        let n = (NUM_THREADS * CALLS_PER_THREAD) as f64;
        assert_eq!(reg.get(), Pose::new(n * 0.5, n * -0.25));
    }

    #[test]
    fn test_limits_validity() {
        assert!(PoseLimits::default().is_valid());
        assert!(!PoseLimits {
            pan_min_deg: 10.0,
            pan_max_deg: 0.0,
            ..PoseLimits::default()
        }
        .is_valid());
        assert!(!PoseLimits {
            tilt_max_deg: f64::NAN,
            ..PoseLimits::default()
        }
        .is_valid());
    }
}
