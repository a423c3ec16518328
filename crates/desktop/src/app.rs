use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, TryRecvError};
use iced::widget::image as picture;
use iced::widget::{button, column, container, row, scrollable, stack, text};
use iced::{Alignment, ContentFit, Element, Length, Subscription, Task, Theme};

use moodlens_core::expression::infrastructure::detector_factory::create_detector;
use moodlens_core::overlay::infrastructure::image_surface::{
    load_font, load_system_font, FontVec,
};
use moodlens_core::pipeline::display_board::{
    DisplayBoard, DisplaySnapshot, StillPanel, StillSource,
};
use moodlens_core::pipeline::live_detection_loop::LiveLoopHandle;
use moodlens_core::pipeline::model_loader::{LoaderState, ModelLoader};
use moodlens_core::shared::bounding_box::Dimensions;
use moodlens_core::shared::constants::IMAGE_EXTENSIONS;
use moodlens_core::shared::frame::Frame;
use moodlens_core::shared::model_resolver::ModelBase;

use crate::settings::Settings;
use crate::workers::live_worker::{self, LiveMessage, LiveParams};
use crate::workers::still_worker::{self, StillMessage, StillParams, StillRequest};

/// Size the live video and its overlay are shown at.
const VIDEO_SIZE: Dimensions = Dimensions::new(640, 480);
const PANEL_WIDTH: f32 = 300.0;
const POLL_INTERVAL: Duration = Duration::from_millis(30);

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum Message {
    Poll,
    CapturePhoto,
    SelectUpload,
    UploadSelected(Option<PathBuf>),
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

struct StillJob {
    source: StillSource,
    rx: Receiver<StillMessage>,
    cancelled: Arc<AtomicBool>,
}

/// Decoded still kept alongside the bytes it was built from, so the
/// texture is only rebuilt when the panel's image changes.
struct CachedStill {
    bytes: Arc<Vec<u8>>,
    handle: picture::Handle,
}

pub struct App {
    loader: Arc<ModelLoader>,
    live_rx: Option<Receiver<LiveMessage>>,
    live: Option<LiveLoopHandle>,
    latest_frame: Option<Frame>,
    video: Option<picture::Handle>,
    overlay: Option<picture::Handle>,
    camera_error: Option<String>,
    board: DisplayBoard,
    display: DisplaySnapshot,
    captured_still: Option<CachedStill>,
    uploaded_still: Option<CachedStill>,
    still_jobs: Vec<StillJob>,
    status: Option<String>,
}

impl App {
    pub fn new() -> (Self, Task<Message>) {
        let settings = Settings::load();
        settings.save();

        let base = ModelBase::parse(&settings.model_base);
        let confidence = settings.confidence_threshold();
        let loader = ModelLoader::spawn(move || create_detector(&base, confidence, None));

        let live_rx = live_worker::spawn(LiveParams {
            camera_index: settings.camera_index,
            min_delay: Duration::from_millis(settings.loop_delay_ms),
            display_size: VIDEO_SIZE,
            font: overlay_font(&settings),
            loader: loader.clone(),
        });

        (
            Self {
                loader,
                live_rx: Some(live_rx),
                live: None,
                latest_frame: None,
                video: None,
                overlay: None,
                camera_error: None,
                board: DisplayBoard::new(),
                display: DisplaySnapshot::default(),
                captured_still: None,
                uploaded_still: None,
                still_jobs: Vec::new(),
                status: None,
            },
            Task::none(),
        )
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Poll => {
                self.poll_live();
                self.poll_stills();
            }
            Message::CapturePhoto => match self.latest_frame.clone() {
                Some(frame) => self.start_still(StillSource::Captured, StillRequest::Capture(frame)),
                None => self.status = Some("Camera is not ready yet".into()),
            },
            Message::SelectUpload => {
                return Task::perform(
                    async {
                        rfd::AsyncFileDialog::new()
                            .set_title("Select an image")
                            .add_filter("Images", IMAGE_EXTENSIONS)
                            .pick_file()
                            .await
                            .map(|h| h.path().to_path_buf())
                    },
                    Message::UploadSelected,
                );
            }
            Message::UploadSelected(Some(path)) => {
                self.start_still(StillSource::Uploaded, StillRequest::Upload(path));
            }
            Message::UploadSelected(None) => {}
        }
        Task::none()
    }

    fn start_still(&mut self, source: StillSource, request: StillRequest) {
        // Older requests for this source can no longer be displayed.
        for job in self.still_jobs.iter().filter(|j| j.source == source) {
            job.cancelled.store(true, Ordering::Relaxed);
        }

        let ticket = self.board.issue(source);
        let (rx, cancelled) = still_worker::spawn(StillParams {
            ticket,
            request,
            loader: self.loader.clone(),
        });
        self.still_jobs.push(StillJob {
            source,
            rx,
            cancelled,
        });
        self.status = None;
    }

    fn poll_live(&mut self) {
        let Some(rx) = &self.live_rx else {
            return;
        };

        let mut latest = None;
        let mut disconnected = false;
        loop {
            match rx.try_recv() {
                Ok(LiveMessage::Started(handle)) => self.live = Some(handle),
                Ok(LiveMessage::Cycle { frame, overlay }) => latest = Some((frame, overlay)),
                Ok(LiveMessage::Error(e)) => {
                    log::error!("Live view unavailable: {e}");
                    self.camera_error = Some(e);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    disconnected = true;
                    break;
                }
            }
        }
        if disconnected {
            self.live_rx = None;
        }

        if let Some((frame, overlay)) = latest {
            self.video = frame_handle(&frame);
            if let Some(overlay) = overlay {
                let (w, h) = overlay.dimensions();
                self.overlay = Some(picture::Handle::from_rgba(w, h, overlay.into_raw()));
            }
            self.latest_frame = Some(frame);
        }
    }

    fn poll_stills(&mut self) {
        let mut changed = false;
        let board = &mut self.board;
        let status = &mut self.status;

        self.still_jobs.retain(|job| loop {
            match job.rx.try_recv() {
                Ok(StillMessage::Stored(ticket, bytes)) => {
                    changed |= board.store_image(ticket, bytes);
                }
                Ok(StillMessage::Resolved(ticket, outcome)) => {
                    changed |= board.resolve(ticket, outcome);
                }
                Ok(StillMessage::Error(ticket, e)) => {
                    log::warn!("One-shot request failed: {e}");
                    if board.is_current(ticket) {
                        *status = Some(e);
                    }
                }
                Ok(StillMessage::Cancelled(_)) => {}
                Err(TryRecvError::Empty) => break true,
                Err(TryRecvError::Disconnected) => break false,
            }
        });

        if changed {
            self.display = self.board.snapshot();
            refresh_still(
                &mut self.captured_still,
                self.display.panel(StillSource::Captured),
            );
            refresh_still(
                &mut self.uploaded_still,
                self.display.panel(StillSource::Uploaded),
            );
        }
    }

    pub fn view(&self) -> Element<'_, Message> {
        let header = text("MoodLens").size(24);
        let status = text(self.status_line()).size(13);

        let capture = button(text("Capture Photo"))
            .on_press_maybe(self.latest_frame.is_some().then_some(Message::CapturePhoto))
            .padding([8, 16]);
        let upload = button(text("Upload Image"))
            .on_press(Message::SelectUpload)
            .padding([8, 16])
            .style(button::secondary);

        let panels = row![
            still_view(
                "Captured Photo",
                self.display.panel(StillSource::Captured),
                self.captured_still.as_ref()
            ),
            still_view(
                "Uploaded Image",
                self.display.panel(StillSource::Uploaded),
                self.uploaded_still.as_ref()
            ),
        ]
        .spacing(24);

        let content = column![
            header,
            status,
            self.live_view(),
            row![capture, upload].spacing(12),
            panels
        ]
        .spacing(16)
        .align_x(Alignment::Center);

        container(scrollable(container(content).center_x(Length::Fill)))
            .padding(16)
            .into()
    }

    fn live_view(&self) -> Element<'_, Message> {
        let width = Length::Fixed(VIDEO_SIZE.width as f32);
        let height = Length::Fixed(VIDEO_SIZE.height as f32);

        let Some(video) = &self.video else {
            let message = match &self.camera_error {
                Some(e) => format!("Camera unavailable: {e}"),
                None => "Starting camera...".to_string(),
            };
            return container(text(message))
                .width(width)
                .height(height)
                .center_x(width)
                .center_y(height)
                .style(container::rounded_box)
                .into();
        };

        let video = picture(video.clone())
            .width(width)
            .height(height)
            .content_fit(ContentFit::Fill);
        match &self.overlay {
            Some(overlay) => stack![
                video,
                picture(overlay.clone())
                    .width(width)
                    .height(height)
                    .content_fit(ContentFit::Fill)
            ]
            .into(),
            None => video.into(),
        }
    }

    fn status_line(&self) -> String {
        let models = match self.loader.state() {
            LoaderState::Loading => "Loading models...".to_string(),
            LoaderState::Ready => "Models ready".to_string(),
            LoaderState::Failed(e) => format!("Model loading failed: {e}"),
        };
        if let Some(status) = &self.status {
            return format!("{models} | {status}");
        }
        if let Some(e) = &self.camera_error {
            return format!("{models} | Camera unavailable: {e}");
        }
        match &self.live {
            Some(live) if !live.is_running() => format!("{models} | Live view stopped"),
            _ => models,
        }
    }

    pub fn theme(&self) -> Theme {
        Theme::Dark
    }

    pub fn subscription(&self) -> Subscription<Message> {
        iced::time::every(POLL_INTERVAL).map(|_| Message::Poll)
    }
}

fn still_view<'a>(
    title: &'a str,
    panel: Option<&StillPanel>,
    cached: Option<&CachedStill>,
) -> Element<'a, Message> {
    let body: Element<'a, Message> = match (panel, cached) {
        (Some(panel), Some(cached)) => {
            let caption = match &panel.outcome {
                Some(outcome) => format!("Emotion Detected: {outcome}"),
                None => "Detecting...".to_string(),
            };
            column![
                picture(cached.handle.clone()).width(Length::Fixed(PANEL_WIDTH)),
                text(caption).size(15),
            ]
            .spacing(8)
            .into()
        }
        _ => text("Nothing yet").size(13).into(),
    };

    column![text(title).size(17), body]
        .spacing(8)
        .width(Length::Fixed(PANEL_WIDTH))
        .into()
}

fn refresh_still(cached: &mut Option<CachedStill>, panel: Option<&StillPanel>) {
    let Some(panel) = panel else {
        *cached = None;
        return;
    };
    if cached
        .as_ref()
        .is_some_and(|c| Arc::ptr_eq(&c.bytes, &panel.image))
    {
        return;
    }
    *cached = Some(CachedStill {
        bytes: panel.image.clone(),
        handle: picture::Handle::from_bytes(panel.image.as_ref().clone()),
    });
}

fn frame_handle(frame: &Frame) -> Option<picture::Handle> {
    let rgba = image::DynamicImage::ImageRgb8(frame.to_rgb_image()?).to_rgba8();
    let (w, h) = rgba.dimensions();
    Some(picture::Handle::from_rgba(w, h, rgba.into_raw()))
}

fn overlay_font(settings: &Settings) -> Option<FontVec> {
    match &settings.font_path {
        Some(path) => match load_font(path) {
            Ok(font) => Some(font),
            Err(e) => {
                log::warn!("{e}; falling back to a system font");
                load_system_font()
            }
        },
        None => load_system_font(),
    }
}
