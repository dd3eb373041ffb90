use super::ActuatorLink;
use crate::{Error, Result};
use log::{debug, info, warn};
use serialport::{ClearBuffer, SerialPort};
use std::{
    io::{self, Read, Write},
    thread,
    time::{Duration, Instant},
};

/// Byte stream to the peripheral with a bounded read timeout
pub trait SerialLine: Read + Write + Send {
    /// Drop any bytes the peripheral has sent but we have not read
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying device rejects the request.
    fn discard_input(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SerialLine for Box<dyn SerialPort> {
    fn discard_input(&mut self) -> io::Result<()> {
        self.clear(ClearBuffer::Input).map_err(io::Error::from)
    }
}

/// Opens the byte stream for a [`SerialActuator`]
pub trait PortOpener: Send {
    /// # Errors
    ///
    /// Returns an error if the port does not exist or cannot be configured.
    fn open(&self, path: &str, baud_rate: u32, timeout: Duration) -> Result<Box<dyn SerialLine>>;
}

/// Opens real serial devices through `serialport`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPortOpener;

impl PortOpener for SystemPortOpener {
    fn open(&self, path: &str, baud_rate: u32, timeout: Duration) -> Result<Box<dyn SerialLine>> {
        let port = serialport::new(path, baud_rate).timeout(timeout).open()?;
        Ok(Box::new(port))
    }
}

/// Actuator reached over a serial port
pub struct SerialActuator<O = SystemPortOpener> {
    opener: O,
    path: String,
    baud_rate: u32,
    timeout: Duration,
    settle_delay: Duration,
    port: Option<Box<dyn SerialLine>>,
    pending: Vec<u8>,
    resync: bool,
}

impl SerialActuator<SystemPortOpener> {
    /// Create an unopened serial actuator
    #[must_use]
    pub fn new(path: &str, baud_rate: u32, timeout: Duration, settle_delay: Duration) -> Self {
        Self::with_opener(SystemPortOpener, path, baud_rate, timeout, settle_delay)
    }
}

impl<O: PortOpener> SerialActuator<O> {
    /// Create an unopened actuator using a custom port opener
    #[must_use]
    pub fn with_opener(opener: O, path: &str, baud_rate: u32, timeout: Duration, settle_delay: Duration) -> Self {
        Self {
            opener,
            path: path.to_string(),
            baud_rate,
            timeout,
            settle_delay,
            port: None,
            pending: Vec::with_capacity(64),
            resync: false,
        }
    }

    /// Read one newline-terminated line, bounded by the acknowledgment timeout
    fn read_line(&mut self) -> Result<String> {
        let deadline = Instant::now() + self.timeout;
        let mut chunk = [0u8; 64];

        loop {
            if let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = self.pending.drain(..=pos).collect();
                return Ok(String::from_utf8_lossy(&line).trim().to_string());
            }

            if Instant::now() >= deadline {
                return Err(self.timed_out());
            }

            let port = self.port.as_mut().ok_or(Error::LinkNotOpen)?;
            match port.read(&mut chunk) {
                Ok(0) => return Err(self.timed_out()),
                Ok(n) => self.pending.extend_from_slice(&chunk[..n]),
                Err(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) => {
                    return Err(self.timed_out());
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(Error::Io(e)),
            }
        }
    }

    /// Drop the partial line and resynchronise before the next command
    fn timed_out(&mut self) -> Error {
        self.pending.clear();
        self.resync = true;
        Error::LinkTimeout(self.timeout)
    }
}

impl<O: PortOpener> ActuatorLink for SerialActuator<O> {
    fn connect(&mut self) -> Result<()> {
        if self.port.is_some() {
            debug!("Serial port {} already open", self.path);
            return Ok(());
        }

        info!("Opening serial port {} at {} baud", self.path, self.baud_rate);
        let mut port = self.opener.open(&self.path, self.baud_rate, self.timeout)?;

        // The controller resets when the port opens; wait for it to boot
        thread::sleep(self.settle_delay);
        port.discard_input()?;

        self.pending.clear();
        self.resync = false;
        self.port = Some(port);
        info!("Serial port {} ready", self.path);
        Ok(())
    }

    fn send_command(&mut self, command: &str) -> Result<String> {
        let resync = self.resync;
        let port = self.port.as_mut().ok_or(Error::LinkNotOpen)?;

        if resync {
            // A late acknowledgment from a timed-out exchange must not answer this one
            port.discard_input()?;
            self.pending.clear();
            self.resync = false;
        }

        debug!("-> {command}");
        port.write_all(format!("{command}\n").as_bytes())?;
        port.flush()?;

        let response = self.read_line().map_err(|e| {
            if e.is_transient() {
                warn!("No acknowledgment for {command} within {:?}", self.timeout);
            }
            e
        })?;
        debug!("<- {response}");
        Ok(response)
    }

    fn close(&mut self) {
        if let Some(mut port) = self.port.take() {
            if let Err(e) = port.flush() {
                warn!("Failed to flush serial port {}: {e}", self.path);
            }
            info!("Closed serial port {}", self.path);
        }
        self.pending.clear();
    }

    fn is_connected(&self) -> bool {
        self.port.is_some()
    }

    fn name(&self) -> &str {
        &self.path
    }
}
