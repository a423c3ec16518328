use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};

use moodlens_core::capture::domain::frame_source::FrameSource;
use moodlens_core::capture::infrastructure::nokhwa_camera_source::NokhwaCameraSource;
use moodlens_core::overlay::infrastructure::image_surface::{FontVec, ImageSurface};
use moodlens_core::pipeline::cycle_logger::TimingCycleLogger;
use moodlens_core::pipeline::live_detection_loop::{
    CycleOutcome, LiveDetectionLoop, LiveLoopConfig, LiveLoopHandle,
};
use moodlens_core::pipeline::model_loader::ModelLoader;
use moodlens_core::shared::bounding_box::Dimensions;
use moodlens_core::shared::frame::Frame;

pub enum LiveMessage {
    Started(LiveLoopHandle),
    /// Latest native frame plus the overlay drawn for it (display size).
    Cycle {
        frame: Frame,
        overlay: Option<image::RgbaImage>,
    },
    Error(String),
}

pub struct LiveParams {
    pub camera_index: u32,
    pub min_delay: Duration,
    pub display_size: Dimensions,
    pub font: Option<FontVec>,
    pub loader: Arc<ModelLoader>,
}

/// Starts the camera and live loop in the background.
///
/// Cycle messages go through a small bounded channel; when the UI falls
/// behind, new cycles are dropped rather than queued.
pub fn spawn(params: LiveParams) -> Receiver<LiveMessage> {
    let (tx, rx) = crossbeam_channel::bounded::<LiveMessage>(2);

    thread::spawn(move || {
        let cycle_tx = tx.clone();
        let camera_index = params.camera_index;
        let started = LiveDetectionLoop::start(
            move || Box::new(NokhwaCameraSource::new(camera_index)) as Box<dyn FrameSource>,
            params.loader,
            ImageSurface::new(params.display_size, params.font),
            LiveLoopConfig {
                min_delay: params.min_delay,
                display_size: Some(params.display_size),
            },
            Box::new(TimingCycleLogger::new()),
            move |frame: &Frame, surface: &ImageSurface, outcome: &CycleOutcome| {
                publish(&cycle_tx, frame, surface, outcome);
            },
        );

        // Control messages must not be dropped, so block for them.
        let message = match started {
            Ok(handle) => LiveMessage::Started(handle),
            Err(e) => LiveMessage::Error(e.to_string()),
        };
        let _ = tx.send(message);
    });

    rx
}

fn publish(tx: &Sender<LiveMessage>, frame: &Frame, surface: &ImageSurface, outcome: &CycleOutcome) {
    let overlay = match outcome {
        CycleOutcome::Annotated(_) => Some(surface.image().clone()),
        CycleOutcome::Skipped => None,
    };
    let _ = tx.try_send(LiveMessage::Cycle {
        frame: frame.clone(),
        overlay,
    });
}
