//! File-backed frame source
//!
//! Replays still images as a live feed at a fixed frame rate, offering each
//! one to the frame queue the way a camera delivers samples.

use log::{debug, warn};
use mooncap_cv::pipeline::{FrameFeeder, Offer};
use mooncap_cv::utils::ImageUtils;
use mooncap_cv::Frame;
use std::path::PathBuf;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Replay statistics
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceStats {
    pub offered: u64,
    pub unreadable: u64,
    pub dropped: u64,
}

pub struct FileFrameSource {
    paths: Vec<PathBuf>,
    interval: Duration,
    loops: u32,
}

impl FileFrameSource {
    pub fn new(paths: Vec<PathBuf>, fps: u32, loops: u32) -> Self {
        Self {
            paths,
            interval: Duration::from_secs_f64(1.0 / fps.max(1) as f64),
            loops: loops.max(1),
        }
    }

    /// Decode every file once up front; unreadable files are logged and skipped
    fn load(&self, stats: &mut SourceStats) -> Vec<Frame> {
        self.paths
            .iter()
            .filter_map(|path| match ImageUtils::load_frame(path) {
                Ok(frame) => Some(frame),
                Err(e) => {
                    warn!("skipping frame: {:#}", e);
                    stats.unreadable += 1;
                    None
                }
            })
            .collect()
    }

    /// Start delivering frames on a background thread.
    ///
    /// The feeder is dropped when the replay ends, which stops the pipeline.
    pub fn spawn(self, feeder: FrameFeeder) -> std::io::Result<JoinHandle<SourceStats>> {
        thread::Builder::new()
            .name("frame-source".into())
            .spawn(move || {
                let mut stats = SourceStats::default();
                let frames = self.load(&mut stats);

                for _ in 0..self.loops {
                    for frame in &frames {
                        let tick = Instant::now();
                        if feeder.offer(frame.clone()) == Offer::Dropped {
                            debug!("pipeline busy, frame dropped");
                        }
                        stats.offered += 1;
                        if let Some(rest) = self.interval.checked_sub(tick.elapsed()) {
                            thread::sleep(rest);
                        }
                    }
                }
                stats.dropped = feeder.dropped();
                stats
            })
    }
}
