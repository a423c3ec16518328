use std::path::Path;

use crate::capture::infrastructure::still_codec;
use crate::expression::domain::expression_detector::{self, SharedDetector};
use crate::expression::domain::expression_distribution::TopEmotion;
use crate::expression::domain::face_detection::DetectionResult;
use crate::pipeline::error::PipelineError;
use crate::shared::constants::{NO_FACE_LABEL, SNAPSHOT_JPEG_QUALITY};
use crate::shared::frame::Frame;

/// Display outcome of a one-shot detection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StillOutcome {
    Emotion(TopEmotion),
    NoFace,
}

impl StillOutcome {
    /// Only the first face contributes; any others are ignored.
    pub fn from_result(result: &DetectionResult) -> Self {
        match result.first() {
            Some(face) => StillOutcome::Emotion(face.top_emotion()),
            None => StillOutcome::NoFace,
        }
    }

    /// `(label, confidence)` as shown to the user. Confidence is the score
    /// as a percentage with two decimals, empty when no face was found.
    pub fn display(&self) -> (String, String) {
        match self {
            StillOutcome::Emotion(top) => (top.emotion.to_string(), top.confidence_percent()),
            StillOutcome::NoFace => (NO_FACE_LABEL.to_string(), String::new()),
        }
    }
}

impl std::fmt::Display for StillOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.display() {
            (label, confidence) if confidence.is_empty() => f.write_str(&label),
            (label, confidence) => write!(f, "{label} {confidence}%"),
        }
    }
}

/// An encoded still ready for display, plus its decoded pixels for
/// detection.
pub struct PreparedStill {
    pub encoded: Vec<u8>,
    pub frame: Frame,
}

/// Captures the current live frame as a JPEG still at native resolution.
pub fn prepare_capture(frame: &Frame) -> Result<PreparedStill, PipelineError> {
    let encoded = still_codec::encode_jpeg(frame, SNAPSHOT_JPEG_QUALITY)?;
    let frame = still_codec::decode(&encoded)?;
    Ok(PreparedStill { encoded, frame })
}

/// Reads and decodes a user-selected image file.
pub fn prepare_upload(path: &Path) -> Result<PreparedStill, PipelineError> {
    let encoded = still_codec::read_image_file(path)?;
    let frame = still_codec::decode(&encoded)?;
    Ok(PreparedStill { encoded, frame })
}

/// Runs the detection capability once on a still.
///
/// A failed detection call is logged and reported as [`StillOutcome::NoFace`].
pub fn detect_still(detector: &SharedDetector, frame: &Frame) -> StillOutcome {
    match expression_detector::detect_shared(detector, frame) {
        Ok(result) => {
            log::debug!("Still detection found {} face(s)", result.len());
            StillOutcome::from_result(&result)
        }
        Err(e) => {
            log::warn!("Still detection failed: {e}");
            StillOutcome::NoFace
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::domain::emotion::Emotion;
    use crate::expression::domain::expression_detector::ExpressionDetector;
    use crate::expression::domain::expression_distribution::ExpressionDistribution;
    use crate::expression::domain::face_detection::FaceDetection;
    use crate::shared::bounding_box::{BoundingBox, Dimensions};
    use rstest::rstest;

    struct FixedDetector(Vec<FaceDetection>);

    impl ExpressionDetector for FixedDetector {
        fn detect(&mut self, frame: &Frame) -> Result<DetectionResult, Box<dyn std::error::Error>> {
            Ok(DetectionResult::new(self.0.clone(), frame.dimensions()))
        }
    }

    struct FailingDetector;

    impl ExpressionDetector for FailingDetector {
        fn detect(&mut self, _frame: &Frame) -> Result<DetectionResult, Box<dyn std::error::Error>> {
            Err("session crashed".into())
        }
    }

    fn face(pairs: &[(Emotion, f32)]) -> FaceDetection {
        FaceDetection::new(
            BoundingBox::new(0.0, 0.0, 10.0, 10.0),
            ExpressionDistribution::from_pairs(pairs.iter().copied()),
        )
    }

    fn frame() -> Frame {
        Frame::new(vec![0; 4 * 4 * 3], 4, 4)
    }

    #[test]
    fn test_empty_result_is_no_face() {
        let outcome = StillOutcome::from_result(&DetectionResult::empty(Dimensions::new(4, 4)));
        assert_eq!(outcome, StillOutcome::NoFace);
        assert_eq!(
            outcome.display(),
            ("No face detected".to_string(), String::new())
        );
        assert_eq!(outcome.to_string(), "No face detected");
    }

    #[test]
    fn test_only_first_face_contributes() {
        let detector = expression_detector::share(Box::new(FixedDetector(vec![
            face(&[(Emotion::Sad, 0.6)]),
            face(&[(Emotion::Happy, 0.99)]),
        ])));

        let outcome = detect_still(&detector, &frame());

        let StillOutcome::Emotion(top) = outcome else {
            panic!("expected an emotion");
        };
        assert_eq!(top.emotion, Emotion::Sad);
    }

    #[rstest]
    #[case(0.8675, "86.75")]
    #[case(0.85, "85.00")]
    #[case(1.0, "100.00")]
    #[case(0.0, "0.00")]
    fn test_confidence_has_two_decimals(#[case] score: f32, #[case] expected: &str) {
        let outcome = StillOutcome::Emotion(TopEmotion {
            emotion: Emotion::Happy,
            score,
        });
        assert_eq!(outcome.display(), ("happy".to_string(), expected.to_string()));
    }

    #[test]
    fn test_neutral_example_display() {
        let result = DetectionResult::new(
            vec![face(&[
                (Emotion::Happy, 0.1),
                (Emotion::Sad, 0.05),
                (Emotion::Neutral, 0.85),
            ])],
            Dimensions::new(4, 4),
        );
        let outcome = StillOutcome::from_result(&result);
        assert_eq!(outcome.to_string(), "neutral 85.00%");
    }

    #[test]
    fn test_failed_detection_is_no_face() {
        let detector = expression_detector::share(Box::new(FailingDetector));
        assert_eq!(detect_still(&detector, &frame()), StillOutcome::NoFace);
    }

    #[test]
    fn test_prepare_capture_keeps_native_size() {
        let still = prepare_capture(&Frame::new(vec![80; 32 * 24 * 3], 32, 24)).unwrap();
        assert_eq!(still.frame.dimensions(), Dimensions::new(32, 24));
        assert_eq!(&still.encoded[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_prepare_upload_rejects_undecodable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not a png").unwrap();
        assert!(matches!(prepare_upload(&path), Err(PipelineError::Decode(_))));
    }

    #[test]
    fn test_prepare_upload_reads_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("face.png");
        image::RgbImage::new(6, 5).save(&path).unwrap();
        let still = prepare_upload(&path).unwrap();
        assert_eq!(still.frame.dimensions(), Dimensions::new(6, 5));
    }
}
