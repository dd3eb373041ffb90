//! Face pan tracker: keeps a detected face centered by driving a stepper pan
//! mechanism over a serial link.
//!
//! The control pipeline consists of:
//! 1. Position calculation: horizontal offset of the face from the frame center
//! 2. Dead-zone test to suppress jitter around the center
//! 3. Optional PID smoothing of the offset
//! 4. Step quantization into a bounded `<DIR><NNN>` command
//! 5. Command exchange with a serial or simulated actuator
//!
//! # Examples
//!
//! ## Computing a command
//!
//! ```
//! use face_pan_tracker::{
//!     position::{BoundingBox, FrameGeometry, PositionCalculator},
//!     quantizer::StepQuantizer,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let calc = PositionCalculator::new(FrameGeometry::new(640, 480), 50);
//! let offset = calc.offset(&BoundingBox::new(200, 100, 50, 50));
//! assert_eq!(offset, -95);
//! assert!(calc.needs_adjustment(offset));
//!
//! let quantizer = StepQuantizer::new(0.5, 200)?;
//! assert_eq!(quantizer.quantize_offset(offset).encode()?, "L047");
//! # Ok(())
//! # }
//! ```
//!
//! ## Running a simulated session
//!
//! ```
//! use face_pan_tracker::{
//!     actuator::SimulatedActuator,
//!     config::Config,
//!     control::ControlLoop,
//!     vision::{PassthroughDetector, SweepSource},
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut config = Config::default();
//! config.tracking.max_ticks = 100;
//!
//! let source = SweepSource::new(config.camera.geometry(), 60);
//! let mut control = ControlLoop::new(source, PassthroughDetector, SimulatedActuator::new(), &config)?;
//! let stats = control.run()?;
//! println!("{} commands over {} frames", stats.commands, stats.ticks);
//! # Ok(())
//! # }
//! ```

/// Stepper actuator transports (serial and simulated)
pub mod actuator;

/// Configuration management
pub mod config;

/// Constants used throughout the application
pub mod constants;

/// Tracking control loop
pub mod control;

/// Error types and result handling
pub mod error;

/// PID smoothing of the error signal
pub mod pid;

/// Bounding box to frame-center offset
pub mod position;

/// Step quantization and wire command format
pub mod quantizer;

/// Safe numeric conversions
pub mod utils;

/// Frame sources and face detectors
pub mod vision;

pub use error::{Error, Result};
