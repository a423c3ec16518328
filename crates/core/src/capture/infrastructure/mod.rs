pub mod nokhwa_camera_source;
pub mod still_codec;
