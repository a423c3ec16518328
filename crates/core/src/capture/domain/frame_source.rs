use crate::shared::bounding_box::Dimensions;
use crate::shared::frame::Frame;

/// A live source of frames, such as a camera.
///
/// Frames are not buffered: `current_frame` returns whatever the device has
/// at the moment of the call. Implementations need not be `Send`; the live
/// loop builds its source on the thread that reads from it.
pub trait FrameSource {
    /// Acquires the device and starts streaming. Returns the native frame
    /// size.
    fn open(&mut self) -> Result<Dimensions, Box<dyn std::error::Error>>;

    fn current_frame(&mut self) -> Result<Frame, Box<dyn std::error::Error>>;

    /// Native frame size, or zero before `open`.
    fn dimensions(&self) -> Dimensions;

    /// Stops streaming and releases the device.
    fn close(&mut self);
}
