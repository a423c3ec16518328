use crate::expression::domain::expression_distribution::ExpressionDistribution;
use crate::shared::frame::Frame;

/// Scores a cropped face over the expression set.
pub trait ExpressionClassifier: Send {
    fn classify(&mut self, face: &Frame)
        -> Result<ExpressionDistribution, Box<dyn std::error::Error>>;
}
