use super::{FaceDetector, FrameSource};
use crate::{
    position::{BoundingBox, FrameGeometry},
    utils::safe_cast::f64_to_i32,
    Error, Result,
};
use std::f64::consts::TAU;

/// Frame whose detections are known up front
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticFrame {
    /// Sequence number, starting at 0
    pub index: u64,
    /// Faces present in the frame, tracked subject first
    pub faces: Vec<BoundingBox>,
}

/// Subject sweeping horizontally across the frame on a sine path
pub struct SweepSource {
    geometry: FrameGeometry,
    face_size: i32,
    amplitude: f64,
    period: u64,
    dropout_every: Option<u64>,
    next_index: u64,
    open: bool,
}

impl SweepSource {
    /// Sweep covering 40% of the frame width either side of center, one cycle per `period` frames
    #[must_use]
    pub fn new(geometry: FrameGeometry, period: u64) -> Self {
        Self {
            geometry,
            face_size: geometry.height / 4,
            amplitude: f64::from(geometry.width) * 0.4,
            period: period.max(1),
            dropout_every: None,
            next_index: 0,
            open: false,
        }
    }

    /// Omit the subject from every `n`th frame
    #[must_use]
    pub fn with_dropout(mut self, n: u64) -> Self {
        self.dropout_every = (n > 0).then_some(n);
        self
    }

    /// Subject box for a given frame index
    ///
    /// # Errors
    ///
    /// Returns an error if the sweep leaves the representable pixel range.
    #[allow(clippy::cast_precision_loss)] // Frame indices stay far below 2^52
    pub fn subject_at(&self, index: u64) -> Result<BoundingBox> {
        let phase = (index % self.period) as f64 / self.period as f64;
        let center_x = f64::from(self.geometry.center_x()) + self.amplitude * (TAU * phase).sin();
        let x = f64_to_i32(center_x)? - self.face_size / 2;
        let y = self.geometry.height / 2 - self.face_size / 2;
        Ok(BoundingBox::new(x, y, self.face_size, self.face_size))
    }
}

impl FrameSource for SweepSource {
    type Frame = SyntheticFrame;

    fn open(&mut self) -> Result<()> {
        self.open = true;
        self.next_index = 0;
        Ok(())
    }

    fn read(&mut self) -> Result<SyntheticFrame> {
        if !self.open {
            return Err(Error::Camera("Synthetic source is not open".to_string()));
        }

        let index = self.next_index;
        self.next_index += 1;

        let dropped = self.dropout_every.is_some_and(|n| index % n == n - 1);
        let faces = if dropped {
            Vec::new()
        } else {
            vec![self.subject_at(index)?]
        };

        Ok(SyntheticFrame { index, faces })
    }

    fn release(&mut self) {
        self.open = false;
    }
}

/// Detector reporting the faces a [`SyntheticFrame`] already carries
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughDetector;

impl FaceDetector<SyntheticFrame> for PassthroughDetector {
    fn detect(&mut self, frame: &SyntheticFrame) -> Result<Vec<BoundingBox>> {
        Ok(frame.faces.clone())
    }
}
