use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{RecvTimeoutError, Sender};

use crate::capture::domain::frame_source::FrameSource;
use crate::expression::domain::expression_detector::{self, SharedDetector};
use crate::expression::domain::face_detection::DetectionResult;
use crate::overlay::domain::annotation;
use crate::overlay::domain::overlay_surface::OverlaySurface;
use crate::pipeline::cycle_logger::CycleLogger;
use crate::pipeline::error::PipelineError;
use crate::pipeline::model_loader::ModelLoader;
use crate::shared::bounding_box::Dimensions;
use crate::shared::constants::DEFAULT_LOOP_DELAY;
use crate::shared::frame::Frame;

#[derive(Clone, Copy, Debug)]
pub struct LiveLoopConfig {
    /// Pause between the end of one cycle and the start of the next.
    pub min_delay: Duration,
    /// Size the overlay is drawn at. `None` draws at the frame's own size.
    pub display_size: Option<Dimensions>,
}

impl Default for LiveLoopConfig {
    fn default() -> Self {
        Self {
            min_delay: DEFAULT_LOOP_DELAY,
            display_size: None,
        }
    }
}

/// What a single live cycle did.
#[derive(Clone, Debug, PartialEq)]
pub enum CycleOutcome {
    /// Models not ready yet; nothing was detected or drawn.
    Skipped,
    /// The overlay was redrawn for these faces, in display coordinates.
    Annotated(DetectionResult),
}

/// One detect → resize → clear → draw pass over `frame`.
///
/// A failed detection is logged and drawn as an empty result, so the
/// overlay never keeps boxes from an earlier frame.
pub fn run_cycle(
    frame: &Frame,
    detector: Option<&SharedDetector>,
    display_size: Option<Dimensions>,
    surface: &mut dyn OverlaySurface,
    logger: &mut dyn CycleLogger,
) -> CycleOutcome {
    let Some(detector) = detector else {
        return CycleOutcome::Skipped;
    };

    let display = display_size.unwrap_or_else(|| frame.dimensions());
    surface.resize(display);

    let t0 = Instant::now();
    let native = match expression_detector::detect_shared(detector, frame) {
        Ok(result) => result,
        Err(e) => {
            logger.cycle_failed("detect", &e.to_string());
            DetectionResult::empty(frame.dimensions())
        }
    };
    logger.timing("detect", t0.elapsed().as_secs_f64() * 1000.0);

    let result = native.resized_to(display);
    logger.faces(result.len());

    let t0 = Instant::now();
    annotation::annotate(surface, &result);
    logger.timing("draw", t0.elapsed().as_secs_f64() * 1000.0);

    CycleOutcome::Annotated(result)
}

/// Real-time detect-and-annotate loop over a live frame source.
///
/// Runs on its own thread. Each cycle starts only after the previous one
/// finished plus `min_delay`, so detection calls never overlap.
pub struct LiveDetectionLoop;

impl LiveDetectionLoop {
    /// Opens the source on the loop thread and starts cycling.
    ///
    /// Returns once the source has opened. If it cannot be opened the error
    /// is returned and no loop runs. `on_cycle` receives each native frame
    /// and the surface as it was left by that cycle.
    pub fn start<F, S, C>(
        make_source: F,
        loader: Arc<ModelLoader>,
        surface: S,
        config: LiveLoopConfig,
        logger: Box<dyn CycleLogger>,
        on_cycle: C,
    ) -> Result<LiveLoopHandle, PipelineError>
    where
        F: FnOnce() -> Box<dyn FrameSource> + Send + 'static,
        S: OverlaySurface + 'static,
        C: FnMut(&Frame, &S, &CycleOutcome) + Send + 'static,
    {
        let (opened_tx, opened_rx) = crossbeam_channel::bounded::<Result<Dimensions, String>>(1);
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);

        let thread = thread::Builder::new()
            .name("live-detection".to_string())
            .spawn(move || {
                let mut source = make_source();
                match source.open() {
                    Ok(dims) => {
                        let _ = opened_tx.send(Ok(dims));
                    }
                    Err(e) => {
                        let _ = opened_tx.send(Err(e.to_string()));
                        return;
                    }
                }
                drop(opened_tx);

                run_loop(
                    source.as_mut(),
                    &loader,
                    surface,
                    config,
                    logger,
                    on_cycle,
                    &stop_rx,
                );
                source.close();
            })
            .map_err(PipelineError::Spawn)?;

        let opened = opened_rx
            .recv()
            .unwrap_or_else(|_| Err("live loop thread exited before opening the camera".into()));

        match opened {
            Ok(dims) => {
                log::info!("Live loop started ({dims}, min delay {:?})", config.min_delay);
                Ok(LiveLoopHandle {
                    stop_tx: Some(stop_tx),
                    thread: Some(thread),
                })
            }
            Err(message) => {
                let _ = thread.join();
                log::error!("Live capture unavailable: {message}");
                Err(PipelineError::Capture(message))
            }
        }
    }
}

fn run_loop<S, C>(
    source: &mut dyn FrameSource,
    loader: &ModelLoader,
    mut surface: S,
    config: LiveLoopConfig,
    mut logger: Box<dyn CycleLogger>,
    mut on_cycle: C,
    stop_rx: &crossbeam_channel::Receiver<()>,
) where
    S: OverlaySurface,
    C: FnMut(&Frame, &S, &CycleOutcome),
{
    loop {
        match source.current_frame() {
            Ok(frame) => {
                let detector = loader.detector();
                let outcome = run_cycle(
                    &frame,
                    detector.as_ref(),
                    config.display_size,
                    &mut surface,
                    logger.as_mut(),
                );
                on_cycle(&frame, &surface, &outcome);
            }
            Err(e) => logger.cycle_failed("frame", &e.to_string()),
        }

        match stop_rx.recv_timeout(config.min_delay) {
            Err(RecvTimeoutError::Timeout) => continue,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    logger.summary();
    log::info!("Live loop stopped");
}

/// Owns a running live loop. Stopping (or dropping) the handle ends the
/// loop after its current cycle, closes the source and joins the thread.
pub struct LiveLoopHandle {
    stop_tx: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl LiveLoopHandle {
    pub fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.try_send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("Live loop thread panicked");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for LiveLoopHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
