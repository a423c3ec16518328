use image::Rgba;

use crate::shared::bounding_box::{BoundingBox, Dimensions};

/// A transparent drawing layer sized to the display area and laid over the
/// live video.
///
/// Coordinates are display-space pixels.
pub trait OverlaySurface: Send {
    fn dimensions(&self) -> Dimensions;

    /// Matches the surface to the displayed video size. Contents are
    /// discarded.
    fn resize(&mut self, size: Dimensions);

    /// Erases everything drawn so far.
    fn clear(&mut self);

    fn stroke_rect(&mut self, rect: &BoundingBox, color: Rgba<u8>, line_width: u32);

    fn fill_rect(&mut self, rect: &BoundingBox, color: Rgba<u8>);

    /// Draws `text` with its baseline at `baseline_y`.
    fn draw_text(&mut self, x: f64, baseline_y: f64, size: f32, color: Rgba<u8>, text: &str);
}
