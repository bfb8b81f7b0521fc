//! Camera-control worker thread
//!
//! Owns the single camera handle and applies commands as they arrive, off the
//! frame-processing thread.

use crate::Result;
use anyhow::{Context, anyhow};
use crossbeam_channel::{Sender, unbounded};
use log::{debug, warn};
use mooncap_core::{CameraControl, DeviceCapabilities, ZoomCommand};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};

/// Zoom factor the camera last accepted.
///
/// Written by the worker after each successful `apply`, read by the pipeline
/// without blocking. Rejected commands leave it untouched.
#[derive(Debug, Clone)]
pub struct AppliedZoom(Arc<AtomicU64>);

impl AppliedZoom {
    pub fn new(zoom_factor: f64) -> Self {
        Self(Arc::new(AtomicU64::new(zoom_factor.to_bits())))
    }

    pub fn get(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Acquire))
    }

    pub fn set(&self, zoom_factor: f64) {
        self.0.store(zoom_factor.to_bits(), Ordering::Release);
    }
}

/// Counters reported when the worker shuts down
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub applied: u64,
    pub failed: u64,
}

/// Handle to a running camera-control worker
pub struct CameraWorker {
    handle: JoinHandle<WorkerStats>,
    applied_zoom: AppliedZoom,
}

impl CameraWorker {
    /// Move the camera onto its own thread.
    ///
    /// Returns the command sender for the pipeline and the capabilities read
    /// from the camera before the hand-off. The applied zoom starts at the
    /// device minimum. The worker exits once every sender has been dropped.
    pub fn spawn<C: CameraControl + 'static>(
        mut camera: C,
    ) -> Result<(Sender<ZoomCommand>, DeviceCapabilities, CameraWorker)> {
        let capabilities = camera.capabilities();
        let (tx, rx) = unbounded::<ZoomCommand>();
        let applied_zoom = AppliedZoom::new(capabilities.min_zoom());
        let published = applied_zoom.clone();

        let handle = thread::Builder::new()
            .name("camera-control".into())
            .spawn(move || {
                let mut stats = WorkerStats::default();
                for command in rx {
                    match camera.apply(&command) {
                        Ok(()) => {
                            stats.applied += 1;
                            published.set(command.zoom_factor);
                            debug!("applied zoom {:.2}", command.zoom_factor);
                        }
                        Err(e) => {
                            stats.failed += 1;
                            warn!("error setting camera zoom: {}", e);
                        }
                    }
                }
                stats
            })
            .context("Failed to spawn camera-control thread")?;

        Ok((
            tx,
            capabilities,
            CameraWorker {
                handle,
                applied_zoom,
            },
        ))
    }

    /// Shared view of the zoom the camera last accepted
    pub fn applied_zoom(&self) -> AppliedZoom {
        self.applied_zoom.clone()
    }

    /// Wait for the worker to drain its queue and exit
    pub fn join(self) -> Result<WorkerStats> {
        self.handle
            .join()
            .map_err(|_| anyhow!("camera-control thread panicked"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mooncap_core::{CameraError, NormalizedPoint};
    use std::sync::{Arc, Mutex};

    /// Rejects zoom above 4x, records everything it accepts
    struct PickyCamera {
        applied: Arc<Mutex<Vec<f64>>>,
    }

    impl CameraControl for PickyCamera {
        fn capabilities(&self) -> DeviceCapabilities {
            DeviceCapabilities::with_max_zoom(6.0).unwrap()
        }

        fn apply(&mut self, command: &ZoomCommand) -> std::result::Result<(), CameraError> {
            if command.zoom_factor > 4.0 {
                return Err(CameraError::UnsupportedZoom(command.zoom_factor));
            }
            self.applied.lock().unwrap().push(command.zoom_factor);
            Ok(())
        }
    }

    fn command(zoom_factor: f64) -> ZoomCommand {
        ZoomCommand {
            zoom_factor,
            focus_point: NormalizedPoint::CENTER,
            exposure_point: NormalizedPoint::CENTER,
        }
    }

    #[test]
    fn test_worker_survives_camera_failures() -> Result<()> {
        let applied = Arc::new(Mutex::new(Vec::new()));
        let camera = PickyCamera {
            applied: applied.clone(),
        };

        let (tx, caps, worker) = CameraWorker::spawn(camera)?;
        assert_eq!(caps.max_zoom(), 6.0);
        let applied_zoom = worker.applied_zoom();
        assert_eq!(applied_zoom.get(), 1.0);

        for zoom in [2.0, 5.0, 3.0, 6.0, 1.5] {
            tx.send(command(zoom))?;
        }
        drop(tx);

        let stats = worker.join()?;
        assert_eq!(stats, WorkerStats { applied: 3, failed: 2 });
        assert_eq!(*applied.lock().unwrap(), vec![2.0, 3.0, 1.5]);
        assert_eq!(applied_zoom.get(), 1.5);
        Ok(())
    }

    #[test]
    fn test_rejected_command_keeps_last_applied_zoom() -> Result<()> {
        let camera = PickyCamera {
            applied: Arc::new(Mutex::new(Vec::new())),
        };
        let (tx, _, worker) = CameraWorker::spawn(camera)?;
        let applied_zoom = worker.applied_zoom();

        for zoom in [2.0, 3.5, 5.0, 6.0] {
            tx.send(command(zoom))?;
        }
        drop(tx);

        assert_eq!(worker.join()?, WorkerStats { applied: 2, failed: 2 });
        assert_eq!(applied_zoom.get(), 3.5);
        Ok(())
    }
}
