use crate::expression::domain::expression_distribution::{ExpressionDistribution, TopEmotion};
use crate::shared::bounding_box::{BoundingBox, Dimensions};

/// One detected face: where it is and how it scored per expression.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceDetection {
    pub bbox: BoundingBox,
    pub expressions: ExpressionDistribution,
}

impl FaceDetection {
    pub fn new(bbox: BoundingBox, expressions: ExpressionDistribution) -> Self {
        Self { bbox, expressions }
    }

    pub fn top_emotion(&self) -> TopEmotion {
        self.expressions.top()
    }
}

/// Everything the detection capability produced for one input image.
///
/// Face order is the detector's internal order and carries no meaning.
/// Boxes are in the pixel space described by `source`.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectionResult {
    pub faces: Vec<FaceDetection>,
    pub source: Dimensions,
}

impl DetectionResult {
    pub fn new(faces: Vec<FaceDetection>, source: Dimensions) -> Self {
        Self { faces, source }
    }

    pub fn empty(source: Dimensions) -> Self {
        Self::new(Vec::new(), source)
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn first(&self) -> Option<&FaceDetection> {
        self.faces.first()
    }

    /// Rescales every box into `display` space.
    pub fn resized_to(self, display: Dimensions) -> DetectionResult {
        let source = self.source;
        let faces = self
            .faces
            .into_iter()
            .map(|face| FaceDetection {
                bbox: face.bbox.rescale(source, display),
                ..face
            })
            .collect();
        DetectionResult::new(faces, display)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::domain::emotion::Emotion;
    use approx::assert_relative_eq;

    fn face(x: f64, y: f64, w: f64, h: f64, emotion: Emotion) -> FaceDetection {
        FaceDetection::new(
            BoundingBox::new(x, y, w, h),
            ExpressionDistribution::from_pairs([(emotion, 0.9)]),
        )
    }

    #[test]
    fn test_resized_to_scales_boxes_and_updates_source() {
        let result = DetectionResult::new(
            vec![
                face(10.0, 20.0, 30.0, 40.0, Emotion::Happy),
                face(100.0, 50.0, 20.0, 20.0, Emotion::Sad),
            ],
            Dimensions::new(320, 240),
        );

        let resized = result.resized_to(Dimensions::new(640, 120));

        assert_eq!(resized.source, Dimensions::new(640, 120));
        assert_eq!(resized.len(), 2);
        let b = resized.faces[0].bbox;
        assert_relative_eq!(b.x, 20.0);
        assert_relative_eq!(b.y, 10.0);
        assert_relative_eq!(b.width, 60.0);
        assert_relative_eq!(b.height, 20.0);
        assert_eq!(resized.faces[1].top_emotion().emotion, Emotion::Sad);
    }

    #[test]
    fn test_resized_preserves_order_and_expressions() {
        let result = DetectionResult::new(
            vec![
                face(0.0, 0.0, 1.0, 1.0, Emotion::Angry),
                face(0.0, 0.0, 1.0, 1.0, Emotion::Fearful),
            ],
            Dimensions::new(10, 10),
        );
        let resized = result.clone().resized_to(Dimensions::new(10, 10));
        assert_eq!(resized, result);
    }

    #[test]
    fn test_empty_result() {
        let result = DetectionResult::empty(Dimensions::new(4, 4));
        assert!(result.is_empty());
        assert!(result.first().is_none());
        assert!(result.resized_to(Dimensions::new(8, 8)).is_empty());
    }
}
