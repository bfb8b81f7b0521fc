//! Frame pipeline: queueing, per-frame processing and camera hand-off

pub mod driver;
pub mod queue;
pub mod worker;

pub use driver::{CycleReport, FramePipeline, PipelineChannels};
pub use queue::{DropPolicy, FrameFeeder, FrameReceiver, Offer, frame_queue};
pub use worker::{AppliedZoom, CameraWorker, WorkerStats};
