use image::Rgba;

use crate::expression::domain::face_detection::DetectionResult;
use crate::overlay::domain::overlay_surface::OverlaySurface;
use crate::shared::bounding_box::BoundingBox;

pub const BOX_COLOR: Rgba<u8> = Rgba([0, 255, 0, 255]);
pub const BOX_LINE_WIDTH: u32 = 2;
/// Label background: the box color at half opacity.
pub const LABEL_BACKGROUND: Rgba<u8> = Rgba([0, 255, 0, 128]);
pub const LABEL_HEIGHT: f64 = 20.0;
pub const LABEL_TEXT_COLOR: Rgba<u8> = Rgba([0, 0, 0, 255]);
pub const LABEL_TEXT_SIZE: f32 = 16.0;
const LABEL_TEXT_INSET: f64 = 5.0;

/// Redraws the surface for one detection result.
///
/// The surface is always cleared first, so an empty result leaves it blank.
/// Each face gets an outlined box plus a filled label strip directly above
/// it carrying `<emotion> (<pct>%)`. Boxes must already be in the surface's
/// coordinate space.
pub fn annotate(surface: &mut dyn OverlaySurface, result: &DetectionResult) {
    surface.clear();

    for face in &result.faces {
        let bbox = face.bbox;
        surface.stroke_rect(&bbox, BOX_COLOR, BOX_LINE_WIDTH);

        let label = BoundingBox::new(bbox.x, bbox.y - LABEL_HEIGHT, bbox.width, LABEL_HEIGHT);
        surface.fill_rect(&label, LABEL_BACKGROUND);

        surface.draw_text(
            bbox.x + LABEL_TEXT_INSET,
            bbox.y - LABEL_TEXT_INSET,
            LABEL_TEXT_SIZE,
            LABEL_TEXT_COLOR,
            &face.top_emotion().label_text(),
        );
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::expression::domain::emotion::Emotion;
    use crate::expression::domain::expression_distribution::ExpressionDistribution;
    use crate::expression::domain::face_detection::FaceDetection;
    use crate::shared::bounding_box::Dimensions;

    #[derive(Clone, Debug, PartialEq)]
    pub enum DrawOp {
        Resize(Dimensions),
        Clear,
        Stroke(BoundingBox, Rgba<u8>, u32),
        Fill(BoundingBox, Rgba<u8>),
        Text(f64, f64, String),
    }

    /// Records every call so tests can assert on the drawing sequence.
    #[derive(Default)]
    pub struct RecordingSurface {
        pub size: Dimensions,
        pub ops: Vec<DrawOp>,
    }

    impl OverlaySurface for RecordingSurface {
        fn dimensions(&self) -> Dimensions {
            self.size
        }

        fn resize(&mut self, size: Dimensions) {
            self.size = size;
            self.ops.push(DrawOp::Resize(size));
        }

        fn clear(&mut self) {
            self.ops.push(DrawOp::Clear);
        }

        fn stroke_rect(&mut self, rect: &BoundingBox, color: Rgba<u8>, line_width: u32) {
            self.ops.push(DrawOp::Stroke(*rect, color, line_width));
        }

        fn fill_rect(&mut self, rect: &BoundingBox, color: Rgba<u8>) {
            self.ops.push(DrawOp::Fill(*rect, color));
        }

        fn draw_text(&mut self, x: f64, baseline_y: f64, _size: f32, _color: Rgba<u8>, text: &str) {
            self.ops.push(DrawOp::Text(x, baseline_y, text.to_string()));
        }
    }

    fn face(bbox: BoundingBox, emotion: Emotion, score: f32) -> FaceDetection {
        FaceDetection::new(bbox, ExpressionDistribution::from_pairs([(emotion, score)]))
    }

    #[test]
    fn test_draws_box_label_strip_and_text() {
        let mut surface = RecordingSurface::default();
        let result = DetectionResult::new(
            vec![face(BoundingBox::new(100.0, 80.0, 50.0, 60.0), Emotion::Neutral, 0.85)],
            Dimensions::new(640, 480),
        );

        annotate(&mut surface, &result);

        assert_eq!(
            surface.ops,
            vec![
                DrawOp::Clear,
                DrawOp::Stroke(BoundingBox::new(100.0, 80.0, 50.0, 60.0), BOX_COLOR, 2),
                DrawOp::Fill(BoundingBox::new(100.0, 60.0, 50.0, 20.0), LABEL_BACKGROUND),
                DrawOp::Text(105.0, 75.0, "neutral (85.00%)".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_result_only_clears() {
        let mut surface = RecordingSurface::default();
        annotate(&mut surface, &DetectionResult::empty(Dimensions::new(640, 480)));
        assert_eq!(surface.ops, vec![DrawOp::Clear]);
    }

    #[test]
    fn test_each_face_is_annotated() {
        let mut surface = RecordingSurface::default();
        let result = DetectionResult::new(
            vec![
                face(BoundingBox::new(10.0, 30.0, 40.0, 40.0), Emotion::Happy, 0.9),
                face(BoundingBox::new(200.0, 50.0, 40.0, 40.0), Emotion::Sad, 0.6),
            ],
            Dimensions::new(640, 480),
        );

        annotate(&mut surface, &result);

        let texts: Vec<_> = surface
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text(_, _, t) => Some(t.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["happy (90.00%)", "sad (60.00%)"]);
        let strokes = surface
            .ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Stroke(..)))
            .count();
        assert_eq!(strokes, 2);
    }

    #[test]
    fn test_label_strip_may_extend_above_surface() {
        let mut surface = RecordingSurface::default();
        let result = DetectionResult::new(
            vec![face(BoundingBox::new(0.0, 5.0, 30.0, 30.0), Emotion::Angry, 0.5)],
            Dimensions::new(100, 100),
        );
        annotate(&mut surface, &result);
        assert!(surface
            .ops
            .contains(&DrawOp::Fill(BoundingBox::new(0.0, -15.0, 30.0, 20.0), LABEL_BACKGROUND)));
    }
}
