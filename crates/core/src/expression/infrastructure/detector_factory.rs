use crate::expression::domain::expression_detector::ExpressionDetector;
use crate::shared::constants::{EXPRESSION_MODEL_NAME, FACE_MODEL_NAME};
use crate::shared::model_resolver::{self, ModelBase, ProgressFn};

use super::face_expression_detector::FaceExpressionDetector;
use super::onnx_blazeface_locator::OnnxBlazefaceLocator;
use super::onnx_ferplus_classifier::OnnxFerPlusClassifier;

/// Resolves both model artifacts from `base` and builds the two-stage
/// detector.
///
/// Blocks on downloads when `base` is a URL and the cache is cold.
pub fn create_detector(
    base: &ModelBase,
    confidence: f64,
    progress: Option<&ProgressFn>,
) -> Result<Box<dyn ExpressionDetector>, Box<dyn std::error::Error>> {
    log::info!("Loading models from {base}");

    let face_path = model_resolver::resolve(FACE_MODEL_NAME, base, progress)?;
    let expression_path = model_resolver::resolve(EXPRESSION_MODEL_NAME, base, progress)?;

    let locator = OnnxBlazefaceLocator::new(&face_path, confidence)?;
    let classifier = OnnxFerPlusClassifier::new(&expression_path)?;

    log::info!("Models ready (confidence threshold {confidence})");
    Ok(Box::new(FaceExpressionDetector::new(
        Box::new(locator),
        Box::new(classifier),
    )))
}
