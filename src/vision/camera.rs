use super::FrameSource;
use crate::{config::CameraConfig, Error, Result};
use log::{info, warn};
use opencv::{
    core::Mat,
    prelude::*,
    videoio::{self, VideoCapture, CAP_PROP_BUFFERSIZE, CAP_PROP_FRAME_HEIGHT, CAP_PROP_FRAME_WIDTH},
};

/// Webcam frame source backed by `VideoCapture`
pub struct OpenCvCamera {
    index: i32,
    width: i32,
    height: i32,
    capture: Option<VideoCapture>,
}

impl OpenCvCamera {
    #[must_use]
    pub const fn new(config: &CameraConfig) -> Self {
        Self {
            index: config.index,
            width: config.width,
            height: config.height,
            capture: None,
        }
    }
}

fn camera_error(context: &str, e: &opencv::Error) -> Error {
    Error::Camera(format!("{context}: {e}"))
}

impl FrameSource for OpenCvCamera {
    type Frame = Mat;

    fn open(&mut self) -> Result<()> {
        info!("Opening camera {}", self.index);
        let mut cap = VideoCapture::new(self.index, videoio::CAP_ANY)
            .map_err(|e| camera_error("Cannot open", &e))?;

        if !cap.is_opened().map_err(|e| camera_error("Cannot open", &e))? {
            return Err(Error::Camera(format!("Cannot open camera {}", self.index)));
        }

        cap.set(CAP_PROP_FRAME_WIDTH, f64::from(self.width))
            .map_err(|e| camera_error("Cannot set frame width", &e))?;
        cap.set(CAP_PROP_FRAME_HEIGHT, f64::from(self.height))
            .map_err(|e| camera_error("Cannot set frame height", &e))?;

        // Keep the newest frame only, the loop cares about latency
        if let Err(e) = cap.set(CAP_PROP_BUFFERSIZE, 1.0) {
            warn!("Could not reduce camera buffer size: {e}");
        }

        self.capture = Some(cap);
        Ok(())
    }

    fn read(&mut self) -> Result<Mat> {
        let cap = self
            .capture
            .as_mut()
            .ok_or_else(|| Error::Camera("Camera is not open".to_string()))?;

        let mut frame = Mat::default();
        let ok = cap.read(&mut frame).map_err(|e| camera_error("Read failed", &e))?;
        if !ok || frame.empty() {
            return Err(Error::Camera("Read failed".to_string()));
        }
        Ok(frame)
    }

    fn release(&mut self) {
        if let Some(mut cap) = self.capture.take() {
            if let Err(e) = cap.release() {
                warn!("Failed to release camera {}: {e}", self.index);
            }
            info!("Released camera {}", self.index);
        }
    }
}
