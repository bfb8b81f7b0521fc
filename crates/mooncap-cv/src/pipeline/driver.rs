//! Frame pipeline driver
//!
//! One detection cycle per frame: detect, update the instruction, compute a
//! zoom command, then hand both results to their consumers without waiting.

use super::queue::FrameReceiver;
use super::worker::AppliedZoom;
use crate::Frame;
use crate::Result;
use crate::detection::{CaptureConfig, MoonDetector};
use crate::traits::CircleAnnotator;
use crate::utils::ImageUtils;
use crossbeam_channel::Sender;
use log::{debug, info, warn};
use mooncap_core::{
    DeviceCapabilities, InstructionMachine, InstructionState, InstructionUpdate, Region,
    ZoomCommand, ZoomController,
};
use serde::Serialize;
use std::time::{Duration, Instant};

/// Outcome of one detection cycle
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub frame_index: u64,
    pub region: Option<Region>,
    pub instruction: InstructionUpdate,
    pub command: Option<ZoomCommand>,
    pub elapsed: Duration,
}

/// Where cycle results go: camera commands and UI instruction updates.
/// `applied_zoom` carries back the zoom the camera actually accepted.
#[derive(Debug, Clone)]
pub struct PipelineChannels {
    pub commands: Sender<ZoomCommand>,
    pub instructions: Sender<InstructionUpdate>,
    pub applied_zoom: AppliedZoom,
}

/// Serial frame processor
pub struct FramePipeline<A> {
    detector: MoonDetector<A>,
    controller: ZoomController,
    instructions: InstructionMachine,
    capabilities: DeviceCapabilities,
    channels: PipelineChannels,
    frames_processed: u64,
}

impl<A: CircleAnnotator> FramePipeline<A> {
    pub fn new(
        detector: MoonDetector<A>,
        controller: ZoomController,
        instructions: InstructionMachine,
        capabilities: DeviceCapabilities,
        channels: PipelineChannels,
    ) -> Self {
        Self {
            detector,
            controller,
            instructions,
            capabilities,
            channels,
            frames_processed: 0,
        }
    }

    /// Assemble a pipeline from a validated configuration
    pub fn from_config(
        annotator: A,
        config: &CaptureConfig,
        capabilities: DeviceCapabilities,
        channels: PipelineChannels,
    ) -> Result<Self> {
        config.validate()?;

        let detector = MoonDetector::new(annotator, &config.detection);
        let controller = ZoomController::from_boxed(config.zoom.build()?);
        let instructions =
            InstructionMachine::with_miss_tolerance(config.instruction.miss_tolerance);

        info!(
            "pipeline: annotator {}, zoom policy {}, max zoom {:.1}",
            detector.annotator().name(),
            controller.policy_name(),
            capabilities.max_zoom()
        );

        Ok(Self::new(detector, controller, instructions, capabilities, channels))
    }

    pub fn state(&self) -> InstructionState {
        self.instructions.state()
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    /// Zoom factor the camera last accepted, the base for the next command
    pub fn current_zoom(&self) -> f64 {
        self.channels.applied_zoom.get()
    }

    /// Run one detection cycle. Never fails; a bad frame is a miss.
    pub fn process_frame(&mut self, frame: &Frame) -> CycleReport {
        let started = Instant::now();
        let frame_index = self.frames_processed;
        self.frames_processed += 1;

        let region = self.detector.detect(frame);
        let instruction = self.instructions.observe(region.is_some());

        let current_zoom = self.current_zoom();
        let command = region.map(|region| {
            self.controller.compute_command(
                &region,
                ImageUtils::frame_size(frame),
                &self.capabilities,
                current_zoom,
            )
        });

        if self.channels.instructions.send(instruction).is_err() {
            debug!("instruction receiver gone, update for frame {} dropped", frame_index);
        }
        if let Some(command) = command {
            if self.channels.commands.send(command).is_err() {
                warn!("camera-control worker gone, command for frame {} dropped", frame_index);
            }
        }

        let elapsed = started.elapsed();
        debug!("frame {} processed in {:?}", frame_index, elapsed);

        CycleReport {
            frame_index,
            region,
            instruction,
            command,
            elapsed,
        }
    }

    /// Process frames in arrival order until every feeder is dropped.
    ///
    /// Returns the number of frames processed by this call.
    pub fn run(&mut self, frames: &FrameReceiver) -> u64 {
        let start = self.frames_processed;
        for frame in frames.iter() {
            self.process_frame(&frame);
        }
        let processed = self.frames_processed - start;
        info!("frame source closed after {} frame(s)", processed);
        processed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotate::IdentityAnnotator;
    use crate::detection::DetectionConfig;
    use crate::pipeline::queue::{DropPolicy, frame_queue};
    use crate::pipeline::worker::CameraWorker;
    use approx::assert_relative_eq;
    use crossbeam_channel::{Receiver, unbounded};
    use mooncap_core::{CameraControl, CameraError, RandomRangeZoom};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    struct Harness {
        pipeline: FramePipeline<IdentityAnnotator>,
        commands: Receiver<ZoomCommand>,
        instructions: Receiver<InstructionUpdate>,
        applied_zoom: AppliedZoom,
    }

    fn harness_with(controller: ZoomController, max_zoom: f64) -> Harness {
        let (commands_tx, commands) = unbounded();
        let (instructions_tx, instructions) = unbounded();
        let applied_zoom = AppliedZoom::new(1.0);

        let pipeline = FramePipeline::new(
            MoonDetector::new(IdentityAnnotator, &DetectionConfig::default()),
            controller,
            InstructionMachine::new(),
            DeviceCapabilities::with_max_zoom(max_zoom).unwrap(),
            PipelineChannels {
                commands: commands_tx,
                instructions: instructions_tx,
                applied_zoom: applied_zoom.clone(),
            },
        );

        Harness {
            pipeline,
            commands,
            instructions,
            applied_zoom,
        }
    }

    fn harness(max_zoom: f64) -> Harness {
        let policy = RandomRangeZoom::with_rng(8.0, 10.0, StdRng::seed_from_u64(3)).unwrap();
        harness_with(ZoomController::new(policy), max_zoom)
    }

    fn marked_frame() -> Frame {
        let mut frame = ImageUtils::solid_frame(100, 100, [0, 0, 0]);
        ImageUtils::fill_region(&mut frame, &Region::new(20, 30, 40, 20).unwrap(), [100, 200, 50]);
        frame
    }

    /// 20x20 marker square in a 100x100 frame: occupancy 0.2
    fn small_moon_frame() -> Frame {
        let mut frame = ImageUtils::solid_frame(100, 100, [0, 0, 0]);
        ImageUtils::fill_region(&mut frame, &Region::new(40, 40, 20, 20).unwrap(), [100, 200, 50]);
        frame
    }

    /// Refuses every command
    struct RejectingCamera;

    impl CameraControl for RejectingCamera {
        fn capabilities(&self) -> DeviceCapabilities {
            DeviceCapabilities::with_max_zoom(10.0).unwrap()
        }

        fn apply(&mut self, _command: &ZoomCommand) -> std::result::Result<(), CameraError> {
            Err(CameraError::PointOfInterestUnsupported)
        }
    }

    #[test]
    fn test_hit_publishes_command_and_tracking() {
        let mut h = harness(12.0);
        let report = h.pipeline.process_frame(&marked_frame());

        assert_eq!(report.region, Region::new(20, 30, 40, 20));
        assert_eq!(report.instruction.state, InstructionState::Tracking);

        let command = h.commands.try_recv().expect("command dispatched");
        assert_eq!(Some(command), report.command);
        assert!((8.0..=10.0).contains(&command.zoom_factor));

        // Nothing applied the command yet
        assert_eq!(h.pipeline.current_zoom(), 1.0);
        h.applied_zoom.set(command.zoom_factor);
        assert_eq!(h.pipeline.current_zoom(), command.zoom_factor);

        let update = h.instructions.try_recv().expect("instruction published");
        assert!(update.changed);
        assert_eq!(update.text, "Hold the camera steady");
    }

    #[test]
    fn test_proportional_zoom_builds_on_applied_zoom() {
        let mut h = harness_with(ZoomController::default(), 10.0);
        let frame = small_moon_frame();

        for _ in 0..3 {
            let command = h.pipeline.process_frame(&frame).command.unwrap();
            assert_relative_eq!(command.zoom_factor, 2.0);
        }

        h.applied_zoom.set(2.0);
        let command = h.pipeline.process_frame(&frame).command.unwrap();
        assert_relative_eq!(command.zoom_factor, 4.0);
    }

    #[test]
    fn test_rejecting_camera_leaves_zoom_estimate() -> Result<()> {
        let (commands, caps, worker) = CameraWorker::spawn(RejectingCamera)?;
        let applied_zoom = worker.applied_zoom();
        let (instructions, _updates) = unbounded();

        let mut pipeline = FramePipeline::from_config(
            IdentityAnnotator,
            &CaptureConfig::default(),
            caps,
            PipelineChannels {
                commands,
                instructions,
                applied_zoom: applied_zoom.clone(),
            },
        )?;

        let frame = small_moon_frame();
        for _ in 0..4 {
            let command = pipeline.process_frame(&frame).command.unwrap();
            assert_relative_eq!(command.zoom_factor, 2.0);
        }
        drop(pipeline);

        let stats = worker.join()?;
        assert_eq!(stats.applied, 0);
        assert_eq!(stats.failed, 4);
        assert_eq!(applied_zoom.get(), 1.0);
        Ok(())
    }

    #[test]
    fn test_miss_publishes_instruction_only() {
        let mut h = harness(12.0);
        let blank = ImageUtils::solid_frame(100, 100, [0, 0, 0]);
        let report = h.pipeline.process_frame(&blank);

        assert_eq!(report.region, None);
        assert_eq!(report.command, None);
        assert!(h.commands.try_recv().is_err());

        let update = h.instructions.try_recv().expect("instruction published");
        assert_eq!(update.state, InstructionState::Searching);
        assert!(!update.changed);
    }

    #[test]
    fn test_state_tracks_latest_cycle() {
        let mut h = harness(12.0);
        let blank = ImageUtils::solid_frame(100, 100, [0, 0, 0]);
        let marked = marked_frame();

        for found in [true, false, false, true, true, false] {
            let frame = if found { &marked } else { &blank };
            h.pipeline.process_frame(frame);
            assert_eq!(h.pipeline.state().is_tracking(), found);
        }
        assert_eq!(h.instructions.try_iter().count(), 6);
        assert_eq!(h.commands.try_iter().count(), 3);
    }

    #[test]
    fn test_disconnected_consumers_do_not_stop_processing() {
        let Harness {
            mut pipeline,
            commands,
            instructions,
            ..
        } = harness(12.0);
        drop(commands);
        drop(instructions);

        for _ in 0..3 {
            let report = pipeline.process_frame(&marked_frame());
            assert!(report.command.is_some());
        }
        assert_eq!(pipeline.frames_processed(), 3);
    }

    #[test]
    fn test_run_drains_queue_in_order() {
        let mut h = harness(12.0);
        let (feeder, frames) = frame_queue(4, DropPolicy::DropNewest);

        feeder.offer(marked_frame());
        feeder.offer(ImageUtils::solid_frame(100, 100, [0, 0, 0]));
        feeder.offer(marked_frame());
        drop(feeder);

        assert_eq!(h.pipeline.run(&frames), 3);
        let states: Vec<InstructionState> = h.instructions.try_iter().map(|u| u.state).collect();
        assert_eq!(
            states,
            vec![
                InstructionState::Tracking,
                InstructionState::Searching,
                InstructionState::Tracking
            ]
        );
    }

    #[test]
    fn test_from_config_rejects_invalid_config() {
        let (commands, _) = unbounded();
        let (instructions, _) = unbounded();
        let mut config = CaptureConfig::default();
        config.queue.depth = 0;

        let result = FramePipeline::from_config(
            IdentityAnnotator,
            &config,
            DeviceCapabilities::with_max_zoom(5.0).unwrap(),
            PipelineChannels {
                commands,
                instructions,
                applied_zoom: AppliedZoom::new(1.0),
            },
        );
        assert!(result.is_err());
    }
}
