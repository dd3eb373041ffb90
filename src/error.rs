//! Error types for the face pan tracker.

use std::time::Duration;
use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// Frame source could not be opened or a frame could not be read
    #[error("Camera error: {0}")]
    Camera(String),

    /// Face detector failed on a frame
    #[error("Face detector error: {0}")]
    Detector(String),

    /// A command was sent on a link that has not been connected
    #[error("Actuator link is not open")]
    LinkNotOpen,

    /// No acknowledgment line arrived within the read timeout
    #[error("Actuator link timed out after {0:?} waiting for acknowledgment")]
    LinkTimeout(Duration),

    /// Serial port could not be opened or configured
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// File or link I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// PID update called with a non-positive or non-finite interval
    #[error("Invalid PID interval: dt must be positive and finite, got {0}")]
    InvalidInterval(f64),

    /// Step magnitude does not fit the three digit wire encoding
    #[error("Step magnitude {0} exceeds the 3-digit command width")]
    Encoding(u32),

    /// Wire command could not be parsed
    #[error("Invalid command: {0:?}")]
    InvalidCommand(String),

    /// Operation not valid in the control loop's current state
    #[error("Invalid control loop state: {0}")]
    InvalidState(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Whether the failure is tick-local and the control loop may continue.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::LinkTimeout(_))
    }

    /// Pipeline stage the error originated from.
    #[must_use]
    pub const fn stage(&self) -> &'static str {
        match self {
            Self::Camera(_) => "camera",
            Self::Detector(_) => "detector",
            Self::LinkNotOpen | Self::LinkTimeout(_) | Self::Serial(_) | Self::Io(_) => "link",
            Self::InvalidInterval(_) | Self::Encoding(_) | Self::InvalidCommand(_) | Self::InvalidState(_) => "control",
            Self::ConfigError(_) | Self::InvalidInput(_) => "config",
        }
    }
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
