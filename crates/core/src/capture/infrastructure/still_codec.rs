use std::path::Path;

use image::codecs::jpeg::JpegEncoder;

use crate::pipeline::error::PipelineError;
use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::frame::Frame;

/// Encodes a frame as JPEG at its native resolution.
pub fn encode_jpeg(frame: &Frame, quality: u8) -> Result<Vec<u8>, PipelineError> {
    let image = frame
        .to_rgb_image()
        .ok_or_else(|| PipelineError::Encode("frame has invalid dimensions".into()))?;
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality)
        .encode_image(&image)
        .map_err(|e| PipelineError::Encode(e.to_string()))?;
    Ok(bytes)
}

/// Decodes an encoded still (any format the `image` crate reads) to RGB.
pub fn decode(bytes: &[u8]) -> Result<Frame, PipelineError> {
    let image = image::load_from_memory(bytes).map_err(|e| PipelineError::Decode(e.to_string()))?;
    Ok(Frame::from_rgb_image(image.to_rgb8()))
}

/// Reads an image file's bytes, refusing files without an image extension.
pub fn read_image_file(path: &Path) -> Result<Vec<u8>, PipelineError> {
    if !is_image_path(path) {
        return Err(PipelineError::UnsupportedFile(path.to_path_buf()));
    }
    std::fs::read(path).map_err(|source| PipelineError::Read {
        path: path.to_path_buf(),
        source,
    })
}

pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::path::PathBuf;

    fn frame(w: u32, h: u32) -> Frame {
        Frame::new(vec![120u8; (w * h * 3) as usize], w, h)
    }

    #[test]
    fn test_jpeg_keeps_native_resolution() {
        let bytes = encode_jpeg(&frame(64, 48), 90).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.width(), 64);
        assert_eq!(decoded.height(), 48);
    }

    #[test]
    fn test_decode_png() {
        let mut bytes = Vec::new();
        image::RgbImage::new(5, 3)
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        let decoded = decode(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (5, 3));
    }

    #[test]
    fn test_decode_garbage_is_error() {
        let err = decode(b"definitely not an image").unwrap_err();
        assert!(matches!(err, PipelineError::Decode(_)));
    }

    #[rstest]
    #[case("photo.jpg", true)]
    #[case("photo.JPEG", true)]
    #[case("scan.tif", true)]
    #[case("anim.webp", true)]
    #[case("notes.txt", false)]
    #[case("no_extension", false)]
    fn test_is_image_path(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_image_path(&PathBuf::from(name)), expected);
    }

    #[test]
    fn test_read_image_file_rejects_other_extensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"hi").unwrap();
        assert!(matches!(
            read_image_file(&path),
            Err(PipelineError::UnsupportedFile(_))
        ));
    }

    #[test]
    fn test_read_image_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.png");
        assert!(matches!(read_image_file(&path), Err(PipelineError::Read { .. })));
    }
}
