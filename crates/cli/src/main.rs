use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use moodlens_core::capture::domain::frame_source::FrameSource;
use moodlens_core::capture::infrastructure::nokhwa_camera_source::NokhwaCameraSource;
use moodlens_core::expression::domain::expression_detector::{self, SharedDetector};
use moodlens_core::expression::infrastructure::detector_factory::create_detector;
use moodlens_core::overlay::infrastructure::image_surface::{
    load_font, load_system_font, FontVec, ImageSurface,
};
use moodlens_core::pipeline::cycle_logger::{NullCycleLogger, TimingCycleLogger};
use moodlens_core::pipeline::detect_still_use_case::{
    detect_still, prepare_capture, prepare_upload, StillOutcome,
};
use moodlens_core::pipeline::live_detection_loop::{
    run_cycle, CycleOutcome, LiveDetectionLoop, LiveLoopConfig,
};
use moodlens_core::pipeline::model_loader::ModelLoader;
use moodlens_core::shared::constants::{
    DEFAULT_CAMERA_INDEX, DEFAULT_LOOP_DELAY, DEFAULT_MODEL_BASE,
};
use moodlens_core::shared::frame::Frame;
use moodlens_core::shared::model_resolver::{ModelBase, ProgressFn};

/// Face expression detection on camera frames and image files.
#[derive(Parser)]
#[command(name = "moodlens")]
struct Cli {
    #[command(flatten)]
    options: Options,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct Options {
    /// Model directory or URL prefix holding the model files.
    #[arg(long, global = true, default_value = DEFAULT_MODEL_BASE)]
    models: String,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long, global = true, default_value = "0.5")]
    confidence: f64,

    /// Camera index for live capture.
    #[arg(long, global = true, default_value_t = DEFAULT_CAMERA_INDEX)]
    camera: u32,

    /// Pause between live cycles in milliseconds.
    #[arg(long, global = true, default_value_t = DEFAULT_LOOP_DELAY.as_millis() as u64)]
    delay_ms: u64,

    /// TrueType font used for overlay labels.
    #[arg(long, global = true)]
    font: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Report the top expression of the first face in each image.
    Detect {
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },
    /// Draw boxes and expression labels for every face in an image.
    Annotate {
        image: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Capture one camera frame, save it as JPEG and report its expression.
    Snapshot {
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Run the real-time loop against the camera.
    Live {
        /// Stop after this many cycles (runs until killed if omitted).
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        frames: Option<u64>,
        /// Keep writing the latest annotated frame to this file.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli.options)?;

    match cli.command {
        Command::Detect { images } => run_detect(&cli.options, &images),
        Command::Annotate { image, output } => run_annotate(&cli.options, &image, &output),
        Command::Snapshot { output } => run_snapshot(&cli.options, &output),
        Command::Live { frames, output } => run_live(&cli.options, frames, output),
    }
}

fn run_detect(options: &Options, images: &[PathBuf]) -> Result<(), Box<dyn std::error::Error>> {
    let detector = build_detector(options)?;
    for path in images {
        match prepare_upload(path) {
            Ok(still) => {
                let outcome = detect_still(&detector, &still.frame);
                println!("{}: {outcome}", path.display());
            }
            Err(e) => eprintln!("{}: {e}", path.display()),
        }
    }
    Ok(())
}

fn run_annotate(
    options: &Options,
    image: &Path,
    output: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let still = prepare_upload(image)?;
    let detector = build_detector(options)?;
    let mut surface = ImageSurface::new(still.frame.dimensions(), overlay_font(options)?);

    let outcome = run_cycle(
        &still.frame,
        Some(&detector),
        None,
        &mut surface,
        &mut NullCycleLogger,
    );
    if let CycleOutcome::Annotated(result) = &outcome {
        for face in &result.faces {
            println!("{}", face.top_emotion());
        }
        if result.is_empty() {
            println!("{}", StillOutcome::NoFace);
        }
    }

    write_composite(&surface, &still.frame, output)?;
    log::info!("Output written to {}", output.display());
    Ok(())
}

fn run_snapshot(options: &Options, output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let detector = build_detector(options)?;

    let mut camera = NokhwaCameraSource::new(options.camera);
    camera.open()?;
    let frame = camera.current_frame();
    camera.close();

    let still = prepare_capture(&frame?)?;
    std::fs::write(output, &still.encoded)?;
    log::info!("Snapshot written to {}", output.display());

    println!("{}", detect_still(&detector, &still.frame));
    Ok(())
}

fn run_live(
    options: &Options,
    frames: Option<u64>,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let base = ModelBase::parse(&options.models);
    let confidence = options.confidence;
    let loader = ModelLoader::spawn(move || {
        let progress: ProgressFn = Box::new(download_progress);
        create_detector(&base, confidence, Some(&progress))
    });

    let font = overlay_font(options)?;
    let camera_index = options.camera;
    let config = LiveLoopConfig {
        min_delay: Duration::from_millis(options.delay_ms),
        display_size: None,
    };
    let (cycle_tx, cycle_rx) = crossbeam_channel::unbounded::<()>();

    let mut handle = LiveDetectionLoop::start(
        move || Box::new(NokhwaCameraSource::new(camera_index)) as Box<dyn FrameSource>,
        loader.clone(),
        ImageSurface::new(Default::default(), font),
        config,
        Box::new(TimingCycleLogger::new()),
        move |frame: &Frame, surface: &ImageSurface, outcome: &CycleOutcome| {
            let CycleOutcome::Annotated(result) = outcome else {
                return;
            };
            let labels: Vec<String> = result
                .faces
                .iter()
                .map(|f| f.top_emotion().to_string())
                .collect();
            log::info!("{} face(s): {}", labels.len(), labels.join(", "));
            if let Some(path) = &output {
                if let Err(e) = write_composite(surface, frame, path) {
                    log::warn!("Failed to write {}: {e}", path.display());
                }
            }
            let _ = cycle_tx.send(());
        },
    )?;

    // Fail fast if the models can never load.
    loader.wait(&AtomicBool::new(false))?;

    let mut completed = 0u64;
    while cycle_rx.recv().is_ok() {
        completed += 1;
        if frames.is_some_and(|n| completed >= n) {
            break;
        }
    }
    handle.stop();
    Ok(())
}

fn build_detector(options: &Options) -> Result<SharedDetector, Box<dyn std::error::Error>> {
    let base = ModelBase::parse(&options.models);
    let progress: ProgressFn = Box::new(download_progress);
    let detector = create_detector(&base, options.confidence, Some(&progress))?;
    Ok(expression_detector::share(detector))
}

fn overlay_font(options: &Options) -> Result<Option<FontVec>, Box<dyn std::error::Error>> {
    match &options.font {
        Some(path) => Ok(Some(load_font(path)?)),
        None => Ok(load_system_font()),
    }
}

fn write_composite(
    surface: &ImageSurface,
    frame: &Frame,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let annotated = surface
        .composite_onto(frame)
        .ok_or("Frame has invalid dimensions")?;
    let image = annotated
        .to_rgb_image()
        .ok_or("Annotated frame has invalid dimensions")?;
    image.save(path)?;
    Ok(())
}

fn validate(options: &Options) -> Result<(), Box<dyn std::error::Error>> {
    if !(0.0..=1.0).contains(&options.confidence) {
        return Err(format!(
            "Confidence must be between 0.0 and 1.0, got {}",
            options.confidence
        )
        .into());
    }
    if let Some(font) = &options.font {
        if !font.exists() {
            return Err(format!("Font file not found: {}", font.display()).into());
        }
    }
    Ok(())
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading model... {pct}%");
    } else {
        eprint!("\rDownloading model... {downloaded} bytes");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_live_frames_must_be_positive() {
        assert!(Cli::try_parse_from(["moodlens", "live", "--frames", "0"]).is_err());

        let cli = Cli::try_parse_from(["moodlens", "live", "--frames", "3"]).unwrap();
        assert!(matches!(cli.command, Command::Live { frames: Some(3), .. }));
    }

    #[test]
    fn test_live_frames_default_to_unbounded() {
        let cli = Cli::try_parse_from(["moodlens", "live"]).unwrap();
        assert!(matches!(cli.command, Command::Live { frames: None, .. }));
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let cli =
            Cli::try_parse_from(["moodlens", "detect", "a.png", "--confidence", "0.7"]).unwrap();
        assert!((cli.options.confidence - 0.7).abs() < f64::EPSILON);
        assert_eq!(cli.options.models, DEFAULT_MODEL_BASE);
    }
}
