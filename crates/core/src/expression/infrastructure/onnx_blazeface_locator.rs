/// BlazeFace face locator using ONNX Runtime via `ort`.
///
/// The lightweight first stage of the detection capability: boxes only,
/// no landmarks, no tracking.
use std::path::Path;

use crate::expression::domain::face_locator::FaceLocator;
use crate::expression::infrastructure::execution_provider::preferred_execution_providers;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// BlazeFace model input resolution.
const INPUT_SIZE: u32 = 128;

/// Default confidence threshold.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// NMS IoU threshold.
const NMS_IOU_THRESH: f64 = 0.3;

/// Number of BlazeFace anchors (short-range model).
const NUM_ANCHORS: usize = 896;

/// Values per anchor in the regressor output (box + 6 keypoints).
const REGRESSOR_STRIDE: usize = 16;

pub struct OnnxBlazefaceLocator {
    session: ort::session::Session,
    confidence: f64,
    anchors: Vec<[f32; 2]>,
}

impl OnnxBlazefaceLocator {
    pub fn new(model_path: &Path, confidence: f64) -> Result<Self, Box<dyn std::error::Error>> {
        let session = ort::session::Session::builder()?
            .with_execution_providers(preferred_execution_providers())?
            .commit_from_file(model_path)?;
        log::debug!("Loaded face locator from {}", model_path.display());
        Ok(Self {
            session,
            confidence,
            anchors: generate_anchors(),
        })
    }
}

impl FaceLocator for OnnxBlazefaceLocator {
    fn locate(&mut self, frame: &Frame) -> Result<Vec<BoundingBox>, Box<dyn std::error::Error>> {
        if frame.is_empty() {
            return Ok(Vec::new());
        }

        let input_tensor = preprocess(frame, INPUT_SIZE);
        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;

        // regressors: [1, 896, 16], classificators: [1, 896, 1]
        if outputs.len() < 2 {
            return Err(
                format!("BlazeFace model expected 2 outputs, got {}", outputs.len()).into(),
            );
        }

        let regressors = outputs[0].try_extract_array::<f32>()?;
        let scores = outputs[1].try_extract_array::<f32>()?;
        let reg_data = regressors.as_slice().ok_or("Cannot get regressor slice")?;
        let score_data = scores.as_slice().ok_or("Cannot get score slice")?;

        let raw = decode(
            reg_data,
            score_data,
            &self.anchors,
            self.confidence as f32,
            frame.width() as f32,
            frame.height() as f32,
        );
        Ok(nms(raw, NMS_IOU_THRESH)
            .into_iter()
            .map(|d| d.bbox)
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

/// Nearest-neighbour resize to `size × size`, scaled to [0,1], NCHW.
fn preprocess(frame: &Frame, size: u32) -> ndarray::Array4<f32> {
    let src = frame.as_ndarray();
    let s = size as usize;
    let sample = |dst: usize, src_len: u32| {
        let pos = (dst as f64 + 0.5) * src_len as f64 / s as f64;
        (pos as usize).min(src_len as usize - 1)
    };

    ndarray::Array4::from_shape_fn((1, 3, s, s), |(_, c, y, x)| {
        src[[sample(y, frame.height()), sample(x, frame.width()), c]] as f32 / 255.0
    })
}

// ---------------------------------------------------------------------------
// Anchors + decoding
// ---------------------------------------------------------------------------

/// `(stride, anchors per cell)` for each feature map of the short-range
/// model: 16×16 cells with 2 anchors, then 8×8 cells with 6.
const FEATURE_MAPS: [(u32, usize); 2] = [(8, 2), (16, 6)];

/// Anchor centres in normalized input coordinates, in model output order.
fn generate_anchors() -> Vec<[f32; 2]> {
    FEATURE_MAPS
        .iter()
        .flat_map(|&(stride, per_cell)| {
            let cells = INPUT_SIZE / stride;
            let centre = move |i: u32| (i as f32 + 0.5) / cells as f32;
            (0..cells).flat_map(move |row| {
                (0..cells).flat_map(move |col| {
                    std::iter::repeat([centre(col), centre(row)]).take(per_cell)
                })
            })
        })
        .collect()
}

#[derive(Clone, Debug)]
struct RawDet {
    bbox: BoundingBox,
    score: f64,
}

/// Turns raw model outputs into frame-space boxes above `confidence`.
fn decode(
    reg_data: &[f32],
    score_data: &[f32],
    anchors: &[[f32; 2]],
    confidence: f32,
    fw: f32,
    fh: f32,
) -> Vec<RawDet> {
    let mut dets = Vec::new();
    let num_anchors = anchors.len().min(NUM_ANCHORS);

    for (i, &raw_score) in score_data.iter().enumerate().take(num_anchors) {
        let score = sigmoid(raw_score);
        if score < confidence {
            continue;
        }

        let reg_offset = i * REGRESSOR_STRIDE;
        if reg_offset + 4 > reg_data.len() {
            break;
        }

        let anchor = &anchors[i];
        let cx = anchor[0] + reg_data[reg_offset] / INPUT_SIZE as f32;
        let cy = anchor[1] + reg_data[reg_offset + 1] / INPUT_SIZE as f32;
        let w = reg_data[reg_offset + 2] / INPUT_SIZE as f32;
        let h = reg_data[reg_offset + 3] / INPUT_SIZE as f32;

        let x1 = ((cx - w / 2.0) * fw).max(0.0);
        let y1 = ((cy - h / 2.0) * fh).max(0.0);
        let x2 = ((cx + w / 2.0) * fw).min(fw);
        let y2 = ((cy + h / 2.0) * fh).min(fh);
        if x2 <= x1 || y2 <= y1 {
            continue;
        }

        dets.push(RawDet {
            bbox: BoundingBox::from_corners(x1 as f64, y1 as f64, x2 as f64, y2 as f64),
            score: score as f64,
        });
    }

    dets
}

// ---------------------------------------------------------------------------
// NMS
// ---------------------------------------------------------------------------

/// Greedy NMS: keeps the best remaining box and drops everything that
/// overlaps it by more than `iou_thresh`.
fn nms(mut dets: Vec<RawDet>, iou_thresh: f64) -> Vec<RawDet> {
    dets.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut keep: Vec<RawDet> = Vec::new();
    for det in dets {
        if keep.iter().all(|k| k.bbox.iou(&det.bbox) <= iou_thresh) {
            keep.push(det);
        }
    }
    keep
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
