use anyhow::Context;
use clap::{Parser, ValueEnum};
use log::{error, info};
use mooncap_core::{DeviceCapabilities, InstructionUpdate};
use mooncap_cv::pipeline::{frame_queue, CameraWorker, FramePipeline, PipelineChannels};
use mooncap_cv::{CaptureConfig, CircleAnnotator, IdentityAnnotator, LuminanceAnnotator};
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;

mod camera;
mod source;

use camera::SimulatedCamera;
use source::FileFrameSource;

/// Replay moon photos through the capture pipeline
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// JSON capture configuration (defaults when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Circle detection backend
    #[arg(long, value_enum, default_value_t = AnnotatorKind::Luminance)]
    annotator: AnnotatorKind,

    /// Luma threshold for the luminance backend
    #[arg(long, default_value_t = LuminanceAnnotator::DEFAULT_THRESHOLD)]
    luma_threshold: u8,

    /// Maximum zoom factor of the simulated camera
    #[arg(long, default_value_t = 10.0)]
    max_zoom: f64,

    /// Replay frame rate
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Simulate a camera without focus/exposure points of interest
    #[arg(long)]
    fixed_focus: bool,

    /// Number of passes over the frame list
    #[arg(long, default_value_t = 1)]
    loops: u32,

    /// Legacy behavior: random 8-10x zoom on every hit
    #[arg(long, conflicts_with = "config")]
    reference: bool,

    /// Image files to replay as frames
    #[arg(required = true)]
    frames: Vec<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum AnnotatorKind {
    /// Frames already carry marker overlays
    Identity,
    /// Bright-disc threshold
    Luminance,
    /// OpenCV Hough circle transform
    #[cfg(feature = "opencv")]
    Hough,
}

fn build_annotator(kind: AnnotatorKind, luma_threshold: u8) -> Box<dyn CircleAnnotator> {
    match kind {
        AnnotatorKind::Identity => Box::new(IdentityAnnotator),
        AnnotatorKind::Luminance => Box::new(LuminanceAnnotator::new(luma_threshold)),
        #[cfg(feature = "opencv")]
        AnnotatorKind::Hough => Box::new(mooncap_cv::HoughCircleAnnotator::default()),
    }
}

fn load_config(args: &Args) -> anyhow::Result<CaptureConfig> {
    if args.reference {
        return Ok(CaptureConfig::reference());
    }
    match &args.config {
        Some(path) => CaptureConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config: {:?}", path)),
        None => Ok(CaptureConfig::default()),
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let config = load_config(&args)?;

    let capabilities = DeviceCapabilities::with_max_zoom(args.max_zoom)?;
    let mut camera = SimulatedCamera::new(capabilities);
    if args.fixed_focus {
        camera = camera.without_point_of_interest();
    }
    let (commands, capabilities, worker) = CameraWorker::spawn(camera)?;

    let (instructions, updates) = crossbeam_channel::unbounded::<InstructionUpdate>();
    let ui = thread::Builder::new()
        .name("ui".into())
        .spawn(move || {
            for update in updates {
                if update.changed {
                    info!("instruction: {}", update.text);
                }
            }
        })
        .context("Failed to spawn ui thread")?;

    let annotator = build_annotator(args.annotator, args.luma_threshold);
    let mut pipeline = FramePipeline::from_config(
        annotator,
        &config,
        capabilities,
        PipelineChannels {
            commands,
            instructions,
            applied_zoom: worker.applied_zoom(),
        },
    )?;

    let (feeder, frames) = frame_queue(config.queue.depth, config.queue.drop_policy);
    let source = FileFrameSource::new(args.frames, args.fps, args.loops)
        .spawn(feeder)
        .context("Failed to spawn frame source")?;

    let processed = pipeline.run(&frames);
    let source_stats = source
        .join()
        .map_err(|_| anyhow::anyhow!("frame source thread panicked"))?;

    drop(pipeline);
    let camera_stats = worker.join()?;
    if ui.join().is_err() {
        error!("ui thread panicked");
    }

    info!(
        "processed {} of {} frame(s) ({} dropped, {} unreadable); camera applied {}, rejected {}",
        processed,
        source_stats.offered,
        source_stats.dropped,
        source_stats.unreadable,
        camera_stats.applied,
        camera_stats.failed
    );
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Capture failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
