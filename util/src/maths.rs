//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Clamp a value into the range `[min, max]`.
///
/// A NaN `value` is returned unchanged, callers that need finite output must check for it.
pub fn clamp<T>(value: T, min: T, max: T) -> T 
where
    T: Float
{
    let mut ret = value;

    if ret > max {
        ret = max
    }
    if ret < min {
        ret = min
    }

    ret
}

/// Return the sign of a value as -1, 0 or 1.
///
/// Unlike [`Float::signum`] zero (of either sign) maps to zero.
pub fn sign<T>(value: T) -> i8
where
    T: Float
{
    if value > T::zero() {
        1
    }
    else if value < T::zero() {
        -1
    }
    else {
        0
    }
}
