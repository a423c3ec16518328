use ndarray::ArrayView3;

use crate::shared::bounding_box::{BoundingBox, Dimensions};

/// A single camera frame or decoded still: contiguous RGB bytes in
/// row-major order.
///
/// Format conversion happens at I/O boundaries only; the domain layer
/// treats pixel data as opaque.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl Frame {
    pub const CHANNELS: usize = 3;

    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * Self::CHANNELS,
            "data length must equal width * height * 3"
        );
        Self {
            data,
            width,
            height,
        }
    }

    pub fn from_rgb_image(image: image::RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Self::new(image.into_raw(), width, height)
    }

    pub fn to_rgb_image(&self) -> Option<image::RgbImage> {
        image::RgbImage::from_raw(self.width, self.height, self.data.clone())
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(
            (self.height as usize, self.width as usize, Self::CHANNELS),
            &self.data,
        )
        .expect("Frame data length must match dimensions")
    }

    /// Copies the pixels under `bbox`, clamped to the frame bounds.
    ///
    /// Returns `None` when the clamped box has no area.
    pub fn crop(&self, bbox: &BoundingBox) -> Option<Frame> {
        let (x, y, w, h) = bbox.clamped_to(self.dimensions())?.to_pixel_rect();
        let x = x as usize;
        let y = y as usize;
        let row_len = self.width as usize * Self::CHANNELS;

        let mut data = Vec::with_capacity(w as usize * h as usize * Self::CHANNELS);
        for row in y..y + h as usize {
            let start = row * row_len + x * Self::CHANNELS;
            data.extend_from_slice(&self.data[start..start + w as usize * Self::CHANNELS]);
        }
        Some(Frame::new(data, w, h))
    }
}
