//! Constants used throughout the application

/// Default camera device index
pub const DEFAULT_CAMERA_INDEX: i32 = 0;

/// Default capture frame size
pub const DEFAULT_FRAME_WIDTH: i32 = 640;
pub const DEFAULT_FRAME_HEIGHT: i32 = 480;

/// Default dead-zone radius around the frame center, in pixels
pub const DEFAULT_DEAD_ZONE: i32 = 50;

/// Default pixels-to-steps multiplier
pub const DEFAULT_STEP_GAIN: f64 = 0.5;

/// Default upper bound on steps per command
pub const DEFAULT_MAX_STEPS: u32 = 200;

/// Largest magnitude the three digit wire field can carry
pub const MAX_ENCODABLE_STEPS: u32 = 999;

/// Most recent commands kept by the simulated actuator
pub const SIM_HISTORY_LIMIT: usize = 1024;

/// Default serial baud rate
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Default acknowledgment read timeout, in milliseconds
pub const DEFAULT_LINK_TIMEOUT_MS: u64 = 1000;

/// Default settle delay after opening the serial port, in milliseconds
pub const DEFAULT_SETTLE_MS: u64 = 2000;

/// Default PID gains
pub const DEFAULT_KP: f64 = 1.0;
pub const DEFAULT_KI: f64 = 0.1;
pub const DEFAULT_KD: f64 = 0.05;

/// Default frames per second assumption, used for the PID sample interval
pub const DEFAULT_FPS: f64 = 30.0;

/// Default Haar cascade parameters
pub const DEFAULT_SCALE_FACTOR: f64 = 1.1;
pub const DEFAULT_MIN_NEIGHBORS: i32 = 5;
pub const DEFAULT_MIN_FACE_SIZE: i32 = 30;

/// Acknowledgment the peripheral sends after executing a command
pub const ACK_OK: &str = "OK";

/// Line the peripheral prints once after power-on or reset
pub const BOOT_BANNER: &str = "READY";
