use super::FaceDetector;
use crate::{config::DetectorConfig, position::BoundingBox, Error, Result};
use log::debug;
use opencv::{
    core::{Mat, Rect, Size, Vector},
    imgproc,
    objdetect::CascadeClassifier,
    prelude::*,
};

/// Haar-cascade face detector
pub struct CascadeFaceDetector {
    classifier: CascadeClassifier,
    scale_factor: f64,
    min_neighbors: i32,
    min_size: Size,
}

fn detector_error(e: &opencv::Error) -> Error {
    Error::Detector(e.to_string())
}

impl CascadeFaceDetector {
    /// Load the cascade named in the configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::Detector`] if the cascade file cannot be loaded.
    pub fn new(config: &DetectorConfig) -> Result<Self> {
        let path = config.cascade.to_string_lossy();
        let classifier = CascadeClassifier::new(&path).map_err(|e| detector_error(&e))?;
        if classifier.empty().map_err(|e| detector_error(&e))? {
            return Err(Error::Detector(format!("Cascade file not loaded: {path}")));
        }

        Ok(Self {
            classifier,
            scale_factor: config.scale_factor,
            min_neighbors: config.min_neighbors,
            min_size: Size::new(config.min_face_size, config.min_face_size),
        })
    }
}

impl FaceDetector<Mat> for CascadeFaceDetector {
    fn detect(&mut self, frame: &Mat) -> Result<Vec<BoundingBox>> {
        let mut gray = Mat::default();
        imgproc::cvt_color(frame, &mut gray, imgproc::COLOR_BGR2GRAY, 0).map_err(|e| detector_error(&e))?;
        let mut equalized = Mat::default();
        imgproc::equalize_hist(&gray, &mut equalized).map_err(|e| detector_error(&e))?;

        let mut faces = Vector::<Rect>::new();
        self.classifier
            .detect_multi_scale(
                &equalized,
                &mut faces,
                self.scale_factor,
                self.min_neighbors,
                0,
                self.min_size,
                Size::default(),
            )
            .map_err(|e| detector_error(&e))?;

        debug!("Detected {} face(s)", faces.len());
        Ok(faces
            .iter()
            .map(|r| BoundingBox::new(r.x, r.y, r.width, r.height))
            .collect())
    }
}
