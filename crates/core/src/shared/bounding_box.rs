/// Pixel size of an image or drawing surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Axis-aligned face box in pixel coordinates of some image.
///
/// Stored as floating point so rescaling between coordinate spaces does
/// not accumulate rounding error; rounding happens only when drawing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self::new(x1, y1, x2 - x1, y2 - y1)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Maps the box from `native` pixel space into `display` pixel space.
    ///
    /// Each axis is scaled independently by `display / native`. A native
    /// axis of zero leaves that axis unscaled.
    pub fn rescale(&self, native: Dimensions, display: Dimensions) -> BoundingBox {
        let sx = axis_scale(native.width, display.width);
        let sy = axis_scale(native.height, display.height);
        BoundingBox::new(self.x * sx, self.y * sy, self.width * sx, self.height * sy)
    }

    /// Intersection with the `[0, bounds)` rectangle, snapped outward to
    /// whole pixels. `None` if nothing is left.
    pub fn clamped_to(&self, bounds: Dimensions) -> Option<BoundingBox> {
        let x1 = self.x.max(0.0).floor();
        let y1 = self.y.max(0.0).floor();
        let x2 = self.right().min(bounds.width as f64).ceil();
        let y2 = self.bottom().min(bounds.height as f64).ceil();
        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some(BoundingBox::from_corners(x1, y1, x2, y2))
    }

    /// Rounds to `(x, y, width, height)` integer pixels.
    pub fn to_pixel_rect(&self) -> (i32, i32, u32, u32) {
        (
            self.x.round() as i32,
            self.y.round() as i32,
            self.width.round().max(0.0) as u32,
            self.height.round().max(0.0) as u32,
        )
    }

    pub fn iou(&self, other: &BoundingBox) -> f64 {
        let ix1 = self.x.max(other.x);
        let iy1 = self.y.max(other.y);
        let ix2 = self.right().min(other.right());
        let iy2 = self.bottom().min(other.bottom());

        let inter = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
        if inter == 0.0 {
            return 0.0;
        }
        inter / (self.area() + other.area() - inter)
    }
}

fn axis_scale(native: u32, display: u32) -> f64 {
    if native == 0 {
        1.0
    } else {
        display as f64 / native as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    // ── Rescale ──────────────────────────────────────────────────────

    #[test]
    fn test_rescale_identity_when_sizes_match() {
        let b = BoundingBox::new(10.0, 20.0, 30.0, 40.0);
        let size = Dimensions::new(640, 480);
        assert_eq!(b.rescale(size, size), b);
    }

    #[rstest]
    #[case::upscale(Dimensions::new(320, 240), Dimensions::new(640, 480))]
    #[case::downscale(Dimensions::new(1280, 720), Dimensions::new(640, 480))]
    #[case::anisotropic(Dimensions::new(100, 400), Dimensions::new(300, 100))]
    fn test_rescale_scales_each_axis_independently(
        #[case] native: Dimensions,
        #[case] display: Dimensions,
    ) {
        let b = BoundingBox::new(12.0, 34.0, 56.0, 78.0);
        let scaled = b.rescale(native, display);
        let sx = display.width as f64 / native.width as f64;
        let sy = display.height as f64 / native.height as f64;
        assert_relative_eq!(scaled.x, b.x * sx);
        assert_relative_eq!(scaled.width, b.width * sx);
        assert_relative_eq!(scaled.y, b.y * sy);
        assert_relative_eq!(scaled.height, b.height * sy);
    }

    #[test]
    fn test_rescale_zero_native_axis_is_unscaled() {
        let b = BoundingBox::new(1.0, 2.0, 3.0, 4.0);
        let scaled = b.rescale(Dimensions::new(0, 10), Dimensions::new(50, 20));
        assert_relative_eq!(scaled.x, 1.0);
        assert_relative_eq!(scaled.y, 4.0);
    }

    // ── Clamping ─────────────────────────────────────────────────────

    #[test]
    fn test_clamped_inside_bounds_is_unchanged() {
        let b = BoundingBox::new(2.0, 3.0, 4.0, 5.0);
        assert_eq!(b.clamped_to(Dimensions::new(100, 100)), Some(b));
    }

    #[test]
    fn test_clamped_snaps_outward() {
        let b = BoundingBox::new(2.4, 3.6, 4.0, 5.0);
        let c = b.clamped_to(Dimensions::new(100, 100)).unwrap();
        assert_eq!(c, BoundingBox::new(2.0, 3.0, 5.0, 6.0));
    }

    #[test]
    fn test_clamped_outside_is_none() {
        let b = BoundingBox::new(200.0, 0.0, 10.0, 10.0);
        assert!(b.clamped_to(Dimensions::new(100, 100)).is_none());
    }

    // ── IoU ──────────────────────────────────────────────────────────

    #[test]
    fn test_iou_identical() {
        let a = BoundingBox::new(10.0, 10.0, 100.0, 100.0);
        assert_relative_eq!(a.iou(&a), 1.0);
    }

    #[test]
    fn test_iou_partial_overlap() {
        let a = BoundingBox::new(0.0, 0.0, 100.0, 100.0);
        let b = BoundingBox::new(50.0, 0.0, 100.0, 100.0);
        assert_relative_eq!(a.iou(&b), 5000.0 / 15000.0);
    }

    #[rstest]
    #[case::disjoint(BoundingBox::new(0.0, 0.0, 50.0, 50.0), BoundingBox::new(100.0, 100.0, 50.0, 50.0))]
    #[case::touching(BoundingBox::new(0.0, 0.0, 50.0, 50.0), BoundingBox::new(50.0, 0.0, 50.0, 50.0))]
    #[case::zero_width(BoundingBox::new(0.0, 0.0, 0.0, 100.0), BoundingBox::new(0.0, 0.0, 50.0, 50.0))]
    fn test_iou_no_overlap(#[case] a: BoundingBox, #[case] b: BoundingBox) {
        assert_relative_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn test_to_pixel_rect_rounds() {
        let b = BoundingBox::new(1.4, 1.6, 10.5, 9.49);
        assert_eq!(b.to_pixel_rect(), (1, 2, 11, 9));
    }
}
