//! Safe casting utilities for the float-to-integer steps of the control math

use crate::{Error, Result};

/// Truncate a pixel coordinate toward zero, rejecting values outside `i32`
///
/// # Errors
///
/// Returns an error for NaN, infinities and out-of-range values
#[allow(clippy::cast_possible_truncation)] // Range checked above
pub fn f64_to_i32(value: f64) -> Result<i32> {
    let in_range = (f64::from(i32::MIN)..=f64::from(i32::MAX)).contains(&value);
    if !in_range {
        return Err(Error::InvalidInput(format!("Coordinate {value} is outside the i32 range")));
    }
    Ok(value as i32)
}

/// Floor a non-negative magnitude and clamp it into `0..=max`
///
/// Non-finite and negative inputs map to 0.
#[must_use]
#[allow(clippy::cast_possible_truncation)] // Clamping ensures safe truncation
#[allow(clippy::cast_sign_loss)] // Negative values are rejected before the cast
pub fn f64_to_u32_clamp(value: f64, max: u32) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }

    let clamped = value.floor().min(f64::from(max));
    (clamped as u32).min(max)
}
