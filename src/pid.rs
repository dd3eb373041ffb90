//! Proportional-integral-derivative smoothing of the pan error signal.
//!
//! The integral term is unbounded. Callers that need anti-windup read
//! [`PidController::integral`] and clamp it through
//! [`PidController::set_integral`].

use crate::{Error, Result};

/// Immutable controller gains
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PidGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

impl PidGains {
    #[must_use]
    pub const fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self { kp, ki, kd }
    }
}

/// PID controller owning the only mutable cross-tick state of the control math
#[derive(Debug, Clone)]
pub struct PidController {
    gains: PidGains,
    integral: f64,
    previous_error: f64,
}

impl PidController {
    /// Create a fresh controller with zero integral and previous error
    #[must_use]
    pub const fn new(gains: PidGains) -> Self {
        Self {
            gains,
            integral: 0.0,
            previous_error: 0.0,
        }
    }

    /// Advance the controller by one sample.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInterval`] if `dt` is not a positive finite number.
    /// State is left untouched in that case.
    pub fn update(&mut self, error: f64, dt: f64) -> Result<f64> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(Error::InvalidInterval(dt));
        }

        self.integral += error * dt;
        let derivative = (error - self.previous_error) / dt;
        let output = self.gains.kp * error + self.gains.ki * self.integral + self.gains.kd * derivative;
        self.previous_error = error;

        Ok(output)
    }

    /// Return to the freshly constructed state
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.previous_error = 0.0;
    }

    #[must_use]
    pub const fn gains(&self) -> PidGains {
        self.gains
    }

    #[must_use]
    pub const fn integral(&self) -> f64 {
        self.integral
    }

    /// Overwrite the accumulated integral (external anti-windup)
    pub fn set_integral(&mut self, integral: f64) {
        self.integral = integral;
    }

    #[must_use]
    pub const fn previous_error(&self) -> f64 {
        self.previous_error
    }
}
