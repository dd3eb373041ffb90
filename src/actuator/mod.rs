//! Transports that carry step commands to the pan actuator.
//!
//! Commands are newline-delimited ASCII lines of the form `<DIR><NNN>`
//! and each one is answered by a single acknowledgment line, normally `OK`.
//! Any other acknowledgment is handed back to the caller untouched.

/// Physical serial transport
pub mod serial;

/// In-process simulation of the actuator
pub mod simulated;

pub use serial::{PortOpener, SerialActuator, SerialLine, SystemPortOpener};
pub use simulated::SimulatedActuator;

use crate::{config::SerialConfig, Error, Result};
use log::info;

/// Capability set shared by every actuator transport
pub trait ActuatorLink: Send {
    /// Open the transport. Blocks until the peripheral can accept commands.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying device cannot be opened.
    fn connect(&mut self) -> Result<()>;

    /// Transmit one command and wait for its acknowledgment line.
    ///
    /// # Errors
    ///
    /// [`Error::LinkNotOpen`] before [`ActuatorLink::connect`],
    /// [`Error::LinkTimeout`] when no acknowledgment arrives in time.
    fn send_command(&mut self, command: &str) -> Result<String>;

    /// Release the transport. Calling it on a closed link is a no-op.
    fn close(&mut self);

    /// Whether the transport is currently open
    fn is_connected(&self) -> bool;

    /// Transport name for log messages
    fn name(&self) -> &str;
}

impl<T: ActuatorLink + ?Sized> ActuatorLink for Box<T> {
    fn connect(&mut self) -> Result<()> {
        (**self).connect()
    }

    fn send_command(&mut self, command: &str) -> Result<String> {
        (**self).send_command(command)
    }

    fn close(&mut self) {
        (**self).close();
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Create the actuator selected on the command line
///
/// # Errors
///
/// Returns [`Error::ConfigError`] when a serial link is requested without a port.
pub fn create_actuator(config: &SerialConfig, simulate: bool) -> Result<Box<dyn ActuatorLink>> {
    if simulate {
        info!("Using simulated actuator");
        return Ok(Box::new(SimulatedActuator::new()));
    }

    let port = config
        .port
        .as_deref()
        .ok_or_else(|| Error::ConfigError("A serial port is required unless simulating".to_string()))?;

    info!("Using serial actuator on {} at {} baud", port, config.baud_rate);
    Ok(Box::new(SerialActuator::new(
        port,
        config.baud_rate,
        config.timeout(),
        config.settle_delay(),
    )))
}
