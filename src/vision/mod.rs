//! Frame sources and face detectors consumed by the control loop.
//!
//! The control loop only depends on the two traits below. Live capture
//! through OpenCV is available with the `opencv` feature; the synthetic
//! source works everywhere and is what `--synthetic` and the tests use.

/// Synthetic frames with a known subject position
pub mod synthetic;

/// OpenCV camera capture
#[cfg(feature = "opencv")]
pub mod camera;

/// OpenCV Haar-cascade face detector
#[cfg(feature = "opencv")]
pub mod cascade;

use crate::{position::BoundingBox, Result};

/// Supplies raster frames on demand
pub trait FrameSource {
    /// Frame type handed to the detector
    type Frame;

    /// Acquire the device
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Camera`] if the device is unavailable.
    fn open(&mut self) -> Result<()>;

    /// Read the next frame, blocking up to the device timeout
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Camera`] if no frame could be read.
    fn read(&mut self) -> Result<Self::Frame>;

    /// Release the device. Calling it on a released source is a no-op.
    fn release(&mut self);
}

/// Finds faces in a frame
pub trait FaceDetector<F> {
    /// Bounding boxes in pixel coordinates, most relevant first. May be empty.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Detector`] if the frame cannot be processed.
    fn detect(&mut self, frame: &F) -> Result<Vec<BoundingBox>>;

    /// Release detector resources
    fn close(&mut self) {}
}

#[cfg(feature = "opencv")]
pub use camera::OpenCvCamera;
#[cfg(feature = "opencv")]
pub use cascade::CascadeFaceDetector;
pub use synthetic::{PassthroughDetector, SweepSource, SyntheticFrame};
