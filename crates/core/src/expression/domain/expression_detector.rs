use std::sync::{Arc, Mutex};

use crate::expression::domain::face_detection::DetectionResult;
use crate::shared::frame::Frame;

/// Domain interface for the detection capability: given an image, return
/// zero or more faces each with an expression distribution.
///
/// Implementations may hold inference sessions that need exclusive access,
/// hence `&mut self`.
pub trait ExpressionDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<DetectionResult, Box<dyn std::error::Error>>;
}

/// A detector shared between the live loop and one-shot requests.
pub type SharedDetector = Arc<Mutex<Box<dyn ExpressionDetector>>>;

pub fn share(detector: Box<dyn ExpressionDetector>) -> SharedDetector {
    Arc::new(Mutex::new(detector))
}

/// Runs one detection on a shared detector.
///
/// A poisoned lock means an earlier call panicked mid-inference; the
/// detector is still handed out since every call starts from a fresh frame.
pub fn detect_shared(
    detector: &SharedDetector,
    frame: &Frame,
) -> Result<DetectionResult, Box<dyn std::error::Error>> {
    let mut guard = detector.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.detect(frame)
}
