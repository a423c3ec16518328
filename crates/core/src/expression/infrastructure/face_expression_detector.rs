use crate::expression::domain::expression_classifier::ExpressionClassifier;
use crate::expression::domain::expression_detector::ExpressionDetector;
use crate::expression::domain::face_detection::{DetectionResult, FaceDetection};
use crate::expression::domain::face_locator::FaceLocator;
use crate::shared::frame::Frame;

/// Two-stage detection capability: locate faces, then classify each crop.
pub struct FaceExpressionDetector {
    locator: Box<dyn FaceLocator>,
    classifier: Box<dyn ExpressionClassifier>,
}

impl FaceExpressionDetector {
    pub fn new(locator: Box<dyn FaceLocator>, classifier: Box<dyn ExpressionClassifier>) -> Self {
        Self {
            locator,
            classifier,
        }
    }
}

impl ExpressionDetector for FaceExpressionDetector {
    fn detect(&mut self, frame: &Frame) -> Result<DetectionResult, Box<dyn std::error::Error>> {
        let boxes = self.locator.locate(frame)?;

        let mut faces = Vec::with_capacity(boxes.len());
        for bbox in boxes {
            let Some(crop) = frame.crop(&bbox) else {
                log::warn!("Skipping face box outside frame: {bbox:?}");
                continue;
            };
            match self.classifier.classify(&crop) {
                Ok(expressions) => faces.push(FaceDetection::new(bbox, expressions)),
                Err(e) => log::warn!("Dropping face at {bbox:?}: classification failed: {e}"),
            }
        }

        Ok(DetectionResult::new(faces, frame.dimensions()))
    }
}
