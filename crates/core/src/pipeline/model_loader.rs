use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use crate::expression::domain::expression_detector::{self, ExpressionDetector, SharedDetector};
use crate::pipeline::error::PipelineError;

/// Observable state of the one-time model load.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoaderState {
    Loading,
    Ready,
    Failed(String),
}

enum Slot {
    Loading,
    Ready(SharedDetector),
    Failed(String),
}

/// Loads the detection capability once, in the background, and hands it
/// out once ready.
///
/// A failed load is final: it is logged, reported through [`state`], and
/// never retried.
///
/// [`state`]: ModelLoader::state
pub struct ModelLoader {
    slot: Mutex<Slot>,
    ready: Condvar,
}

impl ModelLoader {
    /// Starts loading on a background thread.
    pub fn spawn<F>(init: F) -> Arc<Self>
    where
        F: FnOnce() -> Result<Box<dyn ExpressionDetector>, Box<dyn std::error::Error>>
            + Send
            + 'static,
    {
        let loader = Arc::new(Self {
            slot: Mutex::new(Slot::Loading),
            ready: Condvar::new(),
        });

        let background = loader.clone();
        thread::spawn(move || {
            let slot = match init() {
                Ok(detector) => {
                    log::info!("Detection models loaded");
                    Slot::Ready(expression_detector::share(detector))
                }
                Err(e) => {
                    log::error!("Failed to load detection models: {e}");
                    Slot::Failed(e.to_string())
                }
            };
            *background.lock() = slot;
            background.ready.notify_all();
        });

        loader
    }

    pub fn state(&self) -> LoaderState {
        match &*self.lock() {
            Slot::Loading => LoaderState::Loading,
            Slot::Ready(_) => LoaderState::Ready,
            Slot::Failed(message) => LoaderState::Failed(message.clone()),
        }
    }

    /// The loaded detector, or `None` while loading or after a failure.
    /// Never blocks on the load itself.
    pub fn detector(&self) -> Option<SharedDetector> {
        match &*self.lock() {
            Slot::Ready(detector) => Some(detector.clone()),
            _ => None,
        }
    }

    /// Blocks until the load resolves. Returns early with
    /// [`PipelineError::ModelsNotReady`] if `cancelled` is set.
    pub fn wait(&self, cancelled: &AtomicBool) -> Result<SharedDetector, PipelineError> {
        let mut guard = self.lock();
        loop {
            match &*guard {
                Slot::Ready(detector) => return Ok(detector.clone()),
                Slot::Failed(message) => return Err(PipelineError::ModelsFailed(message.clone())),
                Slot::Loading => {}
            }
            if cancelled.load(Ordering::Relaxed) {
                return Err(PipelineError::ModelsNotReady);
            }
            guard = match self.ready.wait_timeout(guard, Duration::from_millis(100)) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::expression::domain::face_detection::DetectionResult;
    use crate::shared::frame::Frame;
    use std::sync::atomic::AtomicUsize;

    /// Detector that counts calls and returns an empty result.
    pub struct CountingDetector {
        pub calls: Arc<AtomicUsize>,
    }

    impl ExpressionDetector for CountingDetector {
        fn detect(&mut self, frame: &Frame) -> Result<DetectionResult, Box<dyn std::error::Error>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(DetectionResult::empty(frame.dimensions()))
        }
    }

    #[test]
    fn test_successful_load_becomes_ready() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let loader = ModelLoader::spawn(move || {
            Ok(Box::new(CountingDetector { calls: c }) as Box<dyn ExpressionDetector>)
        });

        let detector = loader.wait(&AtomicBool::new(false)).unwrap();
        assert_eq!(loader.state(), LoaderState::Ready);
        assert!(loader.detector().is_some());

        let frame = Frame::new(vec![0; 12], 2, 2);
        expression_detector::detect_shared(&detector, &frame).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_load_is_reported_and_final() {
        let loader = ModelLoader::spawn(|| Err("model file missing".into()));

        let Err(err) = loader.wait(&AtomicBool::new(false)) else {
            panic!("expected the load to fail");
        };
        assert!(matches!(err, PipelineError::ModelsFailed(ref m) if m == "model file missing"));
        assert_eq!(
            loader.state(),
            LoaderState::Failed("model file missing".to_string())
        );
        assert!(loader.detector().is_none());
    }

    #[test]
    fn test_detector_is_none_while_loading() {
        let (release_tx, release_rx) = crossbeam_channel::bounded::<()>(0);
        let loader = ModelLoader::spawn(move || {
            let _ = release_rx.recv();
            Err("released".into())
        });

        assert_eq!(loader.state(), LoaderState::Loading);
        assert!(loader.detector().is_none());
        drop(release_tx);
        assert!(loader.wait(&AtomicBool::new(false)).is_err());
    }

    #[test]
    fn test_wait_honours_cancellation() {
        let (_hold_tx, hold_rx) = crossbeam_channel::bounded::<()>(0);
        let loader = ModelLoader::spawn(move || {
            let _ = hold_rx.recv();
            Err("never".into())
        });

        let Err(err) = loader.wait(&AtomicBool::new(true)) else {
            panic!("expected wait to give up");
        };
        assert!(matches!(err, PipelineError::ModelsNotReady));
    }
}
