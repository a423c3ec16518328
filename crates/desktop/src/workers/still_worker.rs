use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{Receiver, Sender};

use moodlens_core::pipeline::detect_still_use_case::{
    detect_still, prepare_capture, prepare_upload, StillOutcome,
};
use moodlens_core::pipeline::display_board::Ticket;
use moodlens_core::pipeline::model_loader::ModelLoader;
use moodlens_core::shared::frame::Frame;

pub enum StillMessage {
    /// The still decoded fine and can be shown while detection runs.
    Stored(Ticket, Vec<u8>),
    Resolved(Ticket, StillOutcome),
    Error(Ticket, String),
    Cancelled(Ticket),
}

pub enum StillRequest {
    Capture(Frame),
    Upload(PathBuf),
}

pub struct StillParams {
    pub ticket: Ticket,
    pub request: StillRequest,
    pub loader: Arc<ModelLoader>,
}

/// Spawn a one-shot capture/upload worker. Returns the channel receiver and
/// cancellation token.
pub fn spawn(params: StillParams) -> (Receiver<StillMessage>, Arc<AtomicBool>) {
    let (tx, rx) = crossbeam_channel::unbounded::<StillMessage>();
    let cancelled = Arc::new(AtomicBool::new(false));
    let cancelled_clone = cancelled.clone();

    thread::spawn(move || {
        let ticket = params.ticket;
        if let Err(e) = run_still(&tx, &cancelled_clone, params) {
            if cancelled_clone.load(Ordering::Relaxed) {
                let _ = tx.send(StillMessage::Cancelled(ticket));
            } else {
                let _ = tx.send(StillMessage::Error(ticket, e.to_string()));
            }
        }
    });

    (rx, cancelled)
}

fn run_still(
    tx: &Sender<StillMessage>,
    cancelled: &AtomicBool,
    params: StillParams,
) -> Result<(), Box<dyn std::error::Error>> {
    let still = match &params.request {
        StillRequest::Capture(frame) => prepare_capture(frame)?,
        StillRequest::Upload(path) => prepare_upload(path)?,
    };
    let _ = tx.send(StillMessage::Stored(params.ticket, still.encoded));

    let detector = params.loader.wait(cancelled)?;
    let outcome = detect_still(&detector, &still.frame);
    let _ = tx.send(StillMessage::Resolved(params.ticket, outcome));
    Ok(())
}
