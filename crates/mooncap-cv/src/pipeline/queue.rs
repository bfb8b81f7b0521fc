//! Bounded frame hand-off between the camera source and the pipeline

use crate::Frame;
use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// What happens to a frame that arrives while the queue is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropPolicy {
    /// Discard the arriving frame; the pipeline finishes what it has
    #[default]
    DropNewest,
    /// Evict the oldest queued frame to make room for the arriving one
    DropOldest,
}

/// Outcome of offering a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    Queued,
    /// Queued after evicting an older frame
    ReplacedOldest,
    Dropped,
}

/// Receiving end consumed by [`FramePipeline::run`](super::FramePipeline::run)
pub type FrameReceiver = Receiver<Frame>;

/// Producer side handed to the camera source.
///
/// Never blocks: a full queue resolves through the drop policy. The pipeline
/// stops once every feeder is dropped.
#[derive(Debug, Clone)]
pub struct FrameFeeder {
    tx: Sender<Frame>,
    evict: Receiver<Frame>,
    policy: DropPolicy,
    dropped: Arc<AtomicU64>,
}

/// Create a frame queue holding at most `depth` frames (minimum 1)
pub fn frame_queue(depth: usize, policy: DropPolicy) -> (FrameFeeder, FrameReceiver) {
    let (tx, rx) = bounded(depth.max(1));
    let feeder = FrameFeeder {
        tx,
        evict: rx.clone(),
        policy,
        dropped: Arc::new(AtomicU64::new(0)),
    };
    (feeder, rx)
}

impl FrameFeeder {
    pub fn offer(&self, frame: Frame) -> Offer {
        let frame = match self.tx.try_send(frame) {
            Ok(()) => return Offer::Queued,
            Err(TrySendError::Full(frame)) => frame,
            Err(TrySendError::Disconnected(_)) => {
                self.count_drop();
                return Offer::Dropped;
            }
        };

        match self.policy {
            DropPolicy::DropNewest => {
                self.count_drop();
                Offer::Dropped
            }
            DropPolicy::DropOldest => {
                if self.evict.try_recv().is_ok() {
                    self.count_drop();
                }
                match self.tx.try_send(frame) {
                    Ok(()) => Offer::ReplacedOldest,
                    Err(_) => {
                        self.count_drop();
                        Offer::Dropped
                    }
                }
            }
        }
    }

    pub fn policy(&self) -> DropPolicy {
        self.policy
    }

    /// Frames discarded so far, by any clone of this feeder
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn count_drop(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }
}
