//! Configuration management for the face pan tracker

use crate::{
    constants::{
        DEFAULT_BAUD_RATE, DEFAULT_CAMERA_INDEX, DEFAULT_DEAD_ZONE, DEFAULT_FPS, DEFAULT_FRAME_HEIGHT,
        DEFAULT_FRAME_WIDTH, DEFAULT_KD, DEFAULT_KI, DEFAULT_KP, DEFAULT_LINK_TIMEOUT_MS, DEFAULT_MAX_STEPS,
        DEFAULT_MIN_FACE_SIZE, DEFAULT_MIN_NEIGHBORS, DEFAULT_SCALE_FACTOR, DEFAULT_SETTLE_MS, DEFAULT_STEP_GAIN,
        MAX_ENCODABLE_STEPS,
    },
    pid::PidGains,
    position::FrameGeometry,
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Camera configuration
    pub camera: CameraConfig,

    /// Tracking (dead zone and step) configuration
    pub tracking: TrackingConfig,

    /// Serial link configuration
    pub serial: SerialConfig,

    /// PID smoothing configuration
    pub pid: PidConfig,

    /// Face detector configuration
    pub detector: DetectorConfig,
}

/// Camera device and frame size
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Camera device index
    pub index: i32,

    /// Requested frame width in pixels
    pub width: i32,

    /// Requested frame height in pixels
    pub height: i32,
}

/// Dead zone and step conversion
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Pixel radius around the frame center where no command is sent
    pub dead_zone: i32,

    /// Steps per pixel of offset
    pub step_gain: f64,

    /// Upper bound on steps in a single command
    pub max_steps: u32,

    /// Stop after this many ticks (0 = run until interrupted)
    pub max_ticks: u64,
}

/// Serial link parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Serial device path, e.g. /dev/ttyUSB0
    pub port: Option<String>,

    /// Baud rate
    pub baud_rate: u32,

    /// Acknowledgment timeout in milliseconds
    pub timeout_ms: u64,

    /// Delay after opening the port before commands are sent, in milliseconds
    pub settle_ms: u64,
}

/// PID smoothing of the pixel offset
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PidConfig {
    /// Feed the offset through the PID controller before quantizing
    pub enabled: bool,

    /// Proportional gain
    pub kp: f64,

    /// Integral gain
    pub ki: f64,

    /// Derivative gain
    pub kd: f64,

    /// Sample interval passed as `dt`, in seconds
    pub sample_interval: f64,
}

/// Face detector parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Haar cascade file for the OpenCV detector
    pub cascade: PathBuf,

    /// Image pyramid scale step
    pub scale_factor: f64,

    /// Neighbouring hits required to keep a detection (confidence filter)
    pub min_neighbors: i32,

    /// Smallest face side in pixels
    pub min_face_size: i32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: DEFAULT_CAMERA_INDEX,
            width: DEFAULT_FRAME_WIDTH,
            height: DEFAULT_FRAME_HEIGHT,
        }
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            dead_zone: DEFAULT_DEAD_ZONE,
            step_gain: DEFAULT_STEP_GAIN,
            max_steps: DEFAULT_MAX_STEPS,
            max_ticks: 0,
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: DEFAULT_BAUD_RATE,
            timeout_ms: DEFAULT_LINK_TIMEOUT_MS,
            settle_ms: DEFAULT_SETTLE_MS,
        }
    }
}

impl Default for PidConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            kp: DEFAULT_KP,
            ki: DEFAULT_KI,
            kd: DEFAULT_KD,
            sample_interval: 1.0 / DEFAULT_FPS,
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            cascade: PathBuf::from("assets/haarcascade_frontalface_default.xml"),
            scale_factor: DEFAULT_SCALE_FACTOR,
            min_neighbors: DEFAULT_MIN_NEIGHBORS,
            min_face_size: DEFAULT_MIN_FACE_SIZE,
        }
    }
}

impl CameraConfig {
    #[must_use]
    pub const fn geometry(&self) -> FrameGeometry {
        FrameGeometry::new(self.width, self.height)
    }
}

impl SerialConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    #[must_use]
    pub const fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

impl PidConfig {
    #[must_use]
    pub const fn gains(&self) -> PidGains {
        PidGains::new(self.kp, self.ki, self.kd)
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.camera.width <= 0 || self.camera.height <= 0 {
            return Err(Error::ConfigError(format!(
                "Frame size must be positive, got {}x{}",
                self.camera.width, self.camera.height
            )));
        }

        if self.tracking.dead_zone < 0 {
            return Err(Error::ConfigError("Dead zone must not be negative".to_string()));
        }
        if !self.tracking.step_gain.is_finite() || self.tracking.step_gain < 0.0 {
            return Err(Error::ConfigError(
                "Step gain must be finite and non-negative".to_string(),
            ));
        }
        if self.tracking.max_steps > MAX_ENCODABLE_STEPS {
            return Err(Error::ConfigError(format!(
                "Max steps must not exceed {MAX_ENCODABLE_STEPS}"
            )));
        }

        if self.serial.baud_rate == 0 {
            return Err(Error::ConfigError("Baud rate must be greater than 0".to_string()));
        }
        if self.serial.timeout_ms == 0 {
            return Err(Error::ConfigError("Serial timeout must be greater than 0".to_string()));
        }

        let gains = [self.pid.kp, self.pid.ki, self.pid.kd];
        if gains.iter().any(|g| !g.is_finite()) {
            return Err(Error::ConfigError("PID gains must be finite".to_string()));
        }
        if !(self.pid.sample_interval.is_finite() && self.pid.sample_interval > 0.0) {
            return Err(Error::ConfigError(
                "PID sample interval must be greater than 0".to_string(),
            ));
        }

        if !(self.detector.scale_factor.is_finite() && self.detector.scale_factor > 1.0) {
            return Err(Error::ConfigError(
                "Detector scale factor must be greater than 1.0".to_string(),
            ));
        }
        if self.detector.min_neighbors < 0 || self.detector.min_face_size < 0 {
            return Err(Error::ConfigError(
                "Detector neighbours and face size must not be negative".to_string(),
            ));
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Face Pan Tracker Configuration

camera:
  index: 0
  width: 640
  height: 480

tracking:
  dead_zone: 50
  step_gain: 0.5
  max_steps: 200
  max_ticks: 0

serial:
  port: "/dev/ttyUSB0"
  baud_rate: 115200
  timeout_ms: 1000
  settle_ms: 2000

pid:
  enabled: false
  kp: 1.0
  ki: 0.1
  kd: 0.05
  sample_interval: 0.0333

detector:
  cascade: "assets/haarcascade_frontalface_default.xml"
  scale_factor: 1.1
  min_neighbors: 5
  min_face_size: 30
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.camera.geometry(), FrameGeometry::new(640, 480));
        assert_eq!(config.tracking.dead_zone, 50);
        assert_eq!(config.tracking.max_steps, 200);
        assert_eq!(config.serial.baud_rate, 115_200);
        assert_eq!(config.serial.settle_delay(), Duration::from_secs(2));
        assert!(!config.pid.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_example_config_parses() {
        let config = Config::from_yaml(EXAMPLE_CONFIG).unwrap();
        assert_eq!(config.serial.port.as_deref(), Some("/dev/ttyUSB0"));
        assert!((config.tracking.step_gain - 0.5).abs() < f64::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config = Config::from_yaml("tracking:\n  dead_zone: 20\n").unwrap();
        assert_eq!(config.tracking.dead_zone, 20);
        assert_eq!(config.tracking.max_steps, 200);
        assert_eq!(config.camera.width, 640);
    }

    #[test]
    fn test_validation_failures() {
        let mut config = Config::default();
        config.tracking.max_steps = 1000;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.pid.sample_interval = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.tracking.dead_zone = -1;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.camera.width = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.detector.scale_factor = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(matches!(Config::from_yaml("camera: [1, 2"), Err(Error::ConfigError(_))));
    }
}
