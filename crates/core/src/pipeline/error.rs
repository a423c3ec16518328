use std::path::PathBuf;

/// Failures surfaced by the capture/detect/annotate pipeline.
///
/// Detection-call failures never show up here: both paths log them and carry
/// on as if no face was found.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("models are not loaded yet")]
    ModelsNotReady,
    #[error("model loading failed: {0}")]
    ModelsFailed(String),
    #[error("camera unavailable: {0}")]
    Capture(String),
    #[error("failed to decode image: {0}")]
    Decode(String),
    #[error("failed to encode image: {0}")]
    Encode(String),
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{0} is not a supported image file")]
    UnsupportedFile(PathBuf),
    #[error("failed to start live loop: {0}")]
    Spawn(std::io::Error),
}
