use std::path::{Path, PathBuf};

use ab_glyph::{Font, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;

use crate::overlay::domain::overlay_surface::OverlaySurface;
use crate::shared::bounding_box::{BoundingBox, Dimensions};
use crate::shared::constants::SYSTEM_FONT_CANDIDATES;
use crate::shared::frame::Frame;

pub use ab_glyph::FontVec;

#[derive(Debug, thiserror::Error)]
pub enum FontLoadError {
    #[error("failed to read font {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{0} is not a usable TrueType/OpenType font")]
    Invalid(PathBuf),
}

pub fn load_font(path: &Path) -> Result<FontVec, FontLoadError> {
    let bytes = std::fs::read(path).map_err(|source| FontLoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    FontVec::try_from_vec(bytes).map_err(|_| FontLoadError::Invalid(path.to_path_buf()))
}

/// First usable font from the usual system locations, if any.
pub fn load_system_font() -> Option<FontVec> {
    SYSTEM_FONT_CANDIDATES.iter().find_map(|candidate| {
        let path = Path::new(candidate);
        if !path.exists() {
            return None;
        }
        match load_font(path) {
            Ok(font) => {
                log::debug!("Using overlay font {}", path.display());
                Some(font)
            }
            Err(e) => {
                log::debug!("Skipping font candidate: {e}");
                None
            }
        }
    })
}

/// Overlay layer backed by a transparent RGBA buffer.
///
/// Without a font, label text is skipped but boxes and label strips are
/// still drawn.
pub struct ImageSurface {
    canvas: RgbaImage,
    font: Option<FontVec>,
}

impl ImageSurface {
    pub fn new(size: Dimensions, font: Option<FontVec>) -> Self {
        if font.is_none() {
            log::warn!("No overlay font available; labels will be drawn without text");
        }
        Self {
            canvas: RgbaImage::new(size.width, size.height),
            font,
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.canvas
    }

    /// Blends the overlay over `frame`. The frame is scaled to the surface
    /// size first when the two differ.
    pub fn composite_onto(&self, frame: &Frame) -> Option<Frame> {
        let rgb = frame.to_rgb_image()?;
        let mut base = image::DynamicImage::ImageRgb8(rgb).to_rgba8();
        let (w, h) = self.canvas.dimensions();
        if base.dimensions() != (w, h) && w > 0 && h > 0 {
            base = image::imageops::resize(&base, w, h, image::imageops::FilterType::Triangle);
        }
        image::imageops::overlay(&mut base, &self.canvas, 0, 0);
        Some(Frame::from_rgb_image(
            image::DynamicImage::ImageRgba8(base).to_rgb8(),
        ))
    }
}

impl OverlaySurface for ImageSurface {
    fn dimensions(&self) -> Dimensions {
        let (w, h) = self.canvas.dimensions();
        Dimensions::new(w, h)
    }

    fn resize(&mut self, size: Dimensions) {
        if self.dimensions() != size {
            self.canvas = RgbaImage::new(size.width, size.height);
        }
    }

    fn clear(&mut self) {
        for pixel in self.canvas.pixels_mut() {
            *pixel = Rgba([0, 0, 0, 0]);
        }
    }

    fn stroke_rect(&mut self, rect: &BoundingBox, color: Rgba<u8>, line_width: u32) {
        // Stroke is centred on the box edge.
        let outset = (line_width / 2) as f64;
        for i in 0..line_width {
            let inset = i as f64 - outset;
            let ring = BoundingBox::new(
                rect.x + inset,
                rect.y + inset,
                rect.width - 2.0 * inset,
                rect.height - 2.0 * inset,
            );
            if let Some(r) = to_rect(&ring) {
                draw_hollow_rect_mut(&mut self.canvas, r, color);
            }
        }
    }

    fn fill_rect(&mut self, rect: &BoundingBox, color: Rgba<u8>) {
        if let Some(r) = to_rect(rect) {
            draw_filled_rect_mut(&mut self.canvas, r, color);
        }
    }

    fn draw_text(&mut self, x: f64, baseline_y: f64, size: f32, color: Rgba<u8>, text: &str) {
        let Some(font) = &self.font else {
            return;
        };
        let scale = PxScale::from(size);
        let ascent = font.as_scaled(scale).ascent();
        let top = baseline_y - ascent as f64;
        draw_text_mut(
            &mut self.canvas,
            color,
            x.round() as i32,
            top.round() as i32,
            scale,
            font,
            text,
        );
    }
}

fn to_rect(bbox: &BoundingBox) -> Option<Rect> {
    let (x, y, w, h) = bbox.to_pixel_rect();
    if w == 0 || h == 0 {
        return None;
    }
    Some(Rect::at(x, y).of_size(w, h))
}
