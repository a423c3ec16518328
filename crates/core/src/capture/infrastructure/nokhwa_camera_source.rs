use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType, Resolution};
use nokhwa::Camera;

use crate::capture::domain::frame_source::FrameSource;
use crate::shared::bounding_box::Dimensions;
use crate::shared::frame::Frame;

/// Camera source backed by `nokhwa`.
pub struct NokhwaCameraSource {
    index: u32,
    camera: Option<Camera>,
    dimensions: Dimensions,
}

impl NokhwaCameraSource {
    pub fn new(index: u32) -> Self {
        Self {
            index,
            camera: None,
            dimensions: Dimensions::default(),
        }
    }

    /// Tries progressively looser format requests until one is accepted.
    fn create_camera(&self) -> Result<Camera, Box<dyn std::error::Error>> {
        let index = CameraIndex::Index(self.index);
        let requests = [
            RequestedFormatType::AbsoluteHighestFrameRate,
            RequestedFormatType::HighestResolution(Resolution::new(640, 480)),
            RequestedFormatType::None,
        ];

        let mut last_err = None;
        for request in requests {
            match Camera::new(index.clone(), RequestedFormat::new::<RgbFormat>(request)) {
                Ok(camera) => return Ok(camera),
                Err(e) => {
                    log::debug!("Camera {} rejected format {request:?}: {e}", self.index);
                    last_err = Some(e);
                }
            }
        }
        Err(match last_err {
            Some(e) => format!("Failed to open camera {}: {e}", self.index).into(),
            None => format!("Failed to open camera {}", self.index).into(),
        })
    }
}

impl FrameSource for NokhwaCameraSource {
    fn open(&mut self) -> Result<Dimensions, Box<dyn std::error::Error>> {
        if self.camera.is_some() {
            return Ok(self.dimensions);
        }

        let mut camera = self.create_camera()?;
        camera.open_stream()?;

        let resolution = camera.resolution();
        self.dimensions = Dimensions::new(resolution.width(), resolution.height());
        log::info!(
            "Camera opened: {} ({})",
            camera.info().human_name(),
            self.dimensions
        );
        self.camera = Some(camera);
        Ok(self.dimensions)
    }

    fn current_frame(&mut self) -> Result<Frame, Box<dyn std::error::Error>> {
        let camera = self.camera.as_mut().ok_or("Camera is not open")?;
        let buffer = camera.frame()?;
        let image = buffer.decode_image::<RgbFormat>()?;
        let (width, height) = (image.width(), image.height());
        Ok(Frame::new(image.into_raw(), width, height))
    }

    fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    fn close(&mut self) {
        if let Some(mut camera) = self.camera.take() {
            if let Err(e) = camera.stop_stream() {
                log::warn!("Failed to stop camera stream: {e}");
            }
            log::info!("Camera {} closed", self.index);
        }
    }
}

impl Drop for NokhwaCameraSource {
    fn drop(&mut self) {
        self.close();
    }
}
