use std::time::Duration;

pub const FACE_MODEL_NAME: &str = "blazeface-128.onnx";
pub const EXPRESSION_MODEL_NAME: &str = "emotion-ferplus-8.onnx";

/// Model base used when none is configured: a `models/` directory next to
/// the working directory.
pub const DEFAULT_MODEL_BASE: &str = "models";

/// Minimum pause between the end of one live cycle and the start of the next.
pub const DEFAULT_LOOP_DELAY: Duration = Duration::from_millis(100);

pub const DEFAULT_CAMERA_INDEX: u32 = 0;

pub const NO_FACE_LABEL: &str = "No face detected";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif", "webp", "tiff", "tif"];

/// JPEG quality used when a live frame is captured as a still.
pub const SNAPSHOT_JPEG_QUALITY: u8 = 92;

/// Font files tried, in order, when no overlay font is configured.
pub const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];
