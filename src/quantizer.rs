//! Step quantization and the `<DIR><NNN>` wire command format.

use crate::{
    constants::MAX_ENCODABLE_STEPS,
    position::{self, Direction},
    utils::safe_cast::f64_to_u32_clamp,
    Error, Result,
};
use std::str::FromStr;

/// Direction plus number of motor steps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepCommand {
    pub direction: Direction,
    pub magnitude: u32,
}

impl StepCommand {
    #[must_use]
    pub const fn new(direction: Direction, magnitude: u32) -> Self {
        Self { direction, magnitude }
    }

    /// Format as direction symbol plus zero-padded three digit magnitude.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`] if the magnitude does not fit three digits.
    pub fn encode(&self) -> Result<String> {
        if self.magnitude > MAX_ENCODABLE_STEPS {
            return Err(Error::Encoding(self.magnitude));
        }
        Ok(format!("{}{:03}", self.direction.symbol(), self.magnitude))
    }

    /// Signed displacement: negative for `Left`
    #[must_use]
    pub fn signed_steps(&self) -> i64 {
        match self.direction {
            Direction::Left => -i64::from(self.magnitude),
            Direction::Right => i64::from(self.magnitude),
        }
    }
}

impl FromStr for StepCommand {
    type Err = Error;

    /// Parse `<DIR><digits>`, tolerating surrounding whitespace
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        let direction = chars
            .next()
            .and_then(Direction::from_symbol)
            .ok_or_else(|| Error::InvalidCommand(s.to_string()))?;

        let digits = chars.as_str();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidCommand(s.to_string()));
        }
        let magnitude = digits
            .parse::<u32>()
            .map_err(|_| Error::InvalidCommand(s.to_string()))?;

        Ok(Self { direction, magnitude })
    }
}

/// Maps a correction magnitude to a bounded step command
#[derive(Debug, Clone, Copy)]
pub struct StepQuantizer {
    gain: f64,
    max_steps: u32,
}

impl StepQuantizer {
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for a negative or non-finite gain.
    pub fn new(gain: f64, max_steps: u32) -> Result<Self> {
        if !gain.is_finite() || gain < 0.0 {
            return Err(Error::InvalidInput(format!(
                "Step gain must be finite and non-negative, got {gain}"
            )));
        }
        Ok(Self { gain, max_steps })
    }

    #[must_use]
    pub const fn gain(&self) -> f64 {
        self.gain
    }

    #[must_use]
    pub const fn max_steps(&self) -> u32 {
        self.max_steps
    }

    /// Command for a raw pixel offset
    #[must_use]
    pub fn quantize_offset(&self, offset: i32) -> StepCommand {
        StepCommand::new(
            position::direction(offset),
            position::steps(offset, self.gain, self.max_steps),
        )
    }

    /// Command for a smoothed (PID) correction
    #[must_use]
    pub fn quantize(&self, correction: f64) -> StepCommand {
        StepCommand::new(
            Direction::from_sign(correction),
            f64_to_u32_clamp(correction.abs() * self.gain, self.max_steps),
        )
    }
}
