/// FER+ expression classifier using ONNX Runtime via `ort`.
///
/// Takes a 64×64 grayscale face crop with raw 0–255 intensities and
/// produces eight logits in the order neutral, happiness, surprise,
/// sadness, anger, disgust, fear, contempt.
use std::path::Path;

use image::imageops::FilterType;

use crate::expression::domain::emotion::Emotion;
use crate::expression::domain::expression_classifier::ExpressionClassifier;
use crate::expression::domain::expression_distribution::ExpressionDistribution;
use crate::expression::infrastructure::execution_provider::preferred_execution_providers;
use crate::shared::frame::Frame;

const INPUT_SIZE: u32 = 64;

/// Model output index → expression label. Contempt has no label of its
/// own and folds into disgusted.
const OUTPUT_LABELS: [Emotion; 8] = [
    Emotion::Neutral,
    Emotion::Happy,
    Emotion::Surprised,
    Emotion::Sad,
    Emotion::Angry,
    Emotion::Disgusted,
    Emotion::Fearful,
    Emotion::Disgusted,
];

pub struct OnnxFerPlusClassifier {
    session: ort::session::Session,
}

impl OnnxFerPlusClassifier {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let session = ort::session::Session::builder()?
            .with_execution_providers(preferred_execution_providers())?
            .commit_from_file(model_path)?;
        log::debug!("Loaded expression classifier from {}", model_path.display());
        Ok(Self { session })
    }
}

impl ExpressionClassifier for OnnxFerPlusClassifier {
    fn classify(
        &mut self,
        face: &Frame,
    ) -> Result<ExpressionDistribution, Box<dyn std::error::Error>> {
        let input = preprocess(face)?;
        let input_value = ort::value::Tensor::from_array(input)?;
        let outputs = self.session.run(ort::inputs![input_value])?;

        let logits = outputs[0].try_extract_array::<f32>()?;
        let logits = logits.as_slice().ok_or("Cannot get logits slice")?;
        if logits.len() < OUTPUT_LABELS.len() {
            return Err(format!(
                "Expression model expected {} outputs, got {}",
                OUTPUT_LABELS.len(),
                logits.len()
            )
            .into());
        }

        Ok(distribution_from_logits(&logits[..OUTPUT_LABELS.len()]))
    }
}

/// Grayscale, resize to 64×64 and lay out as `[1, 1, 64, 64]`.
fn preprocess(face: &Frame) -> Result<ndarray::Array4<f32>, Box<dyn std::error::Error>> {
    let rgb = face.to_rgb_image().ok_or("Face crop has invalid dimensions")?;
    let gray = image::imageops::grayscale(&rgb);
    let resized = image::imageops::resize(&gray, INPUT_SIZE, INPUT_SIZE, FilterType::Triangle);

    let s = INPUT_SIZE as usize;
    let mut tensor = ndarray::Array4::<f32>::zeros((1, 1, s, s));
    for (x, y, pixel) in resized.enumerate_pixels() {
        tensor[[0, 0, y as usize, x as usize]] = pixel.0[0] as f32;
    }
    Ok(tensor)
}

fn distribution_from_logits(logits: &[f32]) -> ExpressionDistribution {
    let probs = softmax(logits);
    ExpressionDistribution::from_pairs(OUTPUT_LABELS.iter().copied().zip(probs))
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_preprocess_shape_and_range() {
        let face = Frame::new(vec![255u8; 30 * 20 * 3], 30, 20);
        let tensor = preprocess(&face).unwrap();
        assert_eq!(tensor.shape(), &[1, 1, 64, 64]);
        assert_relative_eq!(tensor[[0, 0, 10, 10]], 255.0);
    }

    #[test]
    fn test_preprocess_uses_luma() {
        let face = Frame::new(vec![0u8; 8 * 8 * 3], 8, 8);
        let tensor = preprocess(&face).unwrap();
        assert!(tensor.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let probs = softmax(&[1.0, 2.0, 3.0, -1.0]);
        assert_relative_eq!(probs.iter().sum::<f32>(), 1.0, epsilon = 1e-6);
        assert!(probs[2] > probs[1] && probs[1] > probs[0]);
    }

    #[test]
    fn test_softmax_is_stable_for_large_logits() {
        let probs = softmax(&[1000.0, 1000.0]);
        assert_relative_eq!(probs[0], 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_logits_map_to_labels() {
        let mut logits = [0.0f32; 8];
        logits[2] = 10.0; // surprise
        let dist = distribution_from_logits(&logits);
        assert_eq!(dist.top().emotion, Emotion::Surprised);
    }

    #[test]
    fn test_contempt_folds_into_disgusted() {
        let mut logits = [-10.0f32; 8];
        logits[5] = 2.0; // disgust
        logits[7] = 2.0; // contempt
        let dist = distribution_from_logits(&logits);
        assert_relative_eq!(dist.score(Emotion::Disgusted), 1.0, epsilon = 1e-3);
        assert_eq!(dist.top().emotion, Emotion::Disgusted);
    }
}
