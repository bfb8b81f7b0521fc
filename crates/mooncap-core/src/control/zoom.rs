//! Zoom policies and the focus/exposure command builder

use super::camera::DeviceCapabilities;
use crate::error::ControlError;
use crate::region::{FrameSize, NormalizedPoint, Region};
use log::trace;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

/// Zoom range sampled by the reference random policy
pub const DEFAULT_ZOOM_RANGE: (f64, f64) = (8.0, 10.0);

/// Viewport fraction the proportional policy steers the moon toward
pub const DEFAULT_TARGET_FRACTION: f64 = 0.4;

/// Command handed to the camera: applied atomically, never partially
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ZoomCommand {
    pub zoom_factor: f64,
    pub focus_point: NormalizedPoint,
    pub exposure_point: NormalizedPoint,
}

/// Strategy choosing a zoom factor for a detected region
pub trait ZoomPolicy: Send {
    /// Unclamped zoom factor; the controller applies device limits
    fn zoom_factor(&mut self, region: &Region, frame: FrameSize, current_zoom: f64) -> f64;

    fn name(&self) -> &str;
}

impl<P: ZoomPolicy + ?Sized> ZoomPolicy for Box<P> {
    fn zoom_factor(&mut self, region: &Region, frame: FrameSize, current_zoom: f64) -> f64 {
        (**self).zoom_factor(region, frame, current_zoom)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Uniform sample from a fixed range, independent of the region.
#[derive(Debug, Clone)]
pub struct RandomRangeZoom<R = StdRng> {
    min: f64,
    max: f64,
    rng: R,
}

impl RandomRangeZoom<StdRng> {
    /// Create with an entropy-seeded generator
    pub fn new(min: f64, max: f64) -> Result<Self, ControlError> {
        Self::with_rng(min, max, StdRng::from_entropy())
    }
}

impl<R: Rng + Send> RandomRangeZoom<R> {
    /// Create with a caller-supplied generator (seeded in tests)
    pub fn with_rng(min: f64, max: f64, rng: R) -> Result<Self, ControlError> {
        let valid = min.is_finite() && max.is_finite() && min > 0.0 && min <= max;
        if !valid {
            return Err(ControlError::InvalidZoomRange { min, max });
        }
        Ok(Self { min, max, rng })
    }

    pub fn range(&self) -> (f64, f64) {
        (self.min, self.max)
    }
}

impl<R: Rng + Send> ZoomPolicy for RandomRangeZoom<R> {
    fn zoom_factor(&mut self, _region: &Region, _frame: FrameSize, _current_zoom: f64) -> f64 {
        self.rng.gen_range(self.min..=self.max)
    }

    fn name(&self) -> &str {
        "random_range"
    }
}

/// Proportional control on the region's share of the viewport.
///
/// With the moon occupying fraction `f` of the frame at zoom `z`, the next
/// zoom is `z * target / f`, so the disc converges on the target framing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProportionalZoom {
    target_fraction: f64,
}

impl ProportionalZoom {
    pub fn new(target_fraction: f64) -> Result<Self, ControlError> {
        if !(target_fraction > 0.0 && target_fraction <= 1.0) {
            return Err(ControlError::InvalidTargetFraction(target_fraction));
        }
        Ok(Self { target_fraction })
    }

    pub fn target_fraction(&self) -> f64 {
        self.target_fraction
    }
}

impl Default for ProportionalZoom {
    fn default() -> Self {
        Self {
            target_fraction: DEFAULT_TARGET_FRACTION,
        }
    }
}

impl ZoomPolicy for ProportionalZoom {
    fn zoom_factor(&mut self, region: &Region, frame: FrameSize, current_zoom: f64) -> f64 {
        let occupancy = region.occupancy(frame);
        if occupancy <= 0.0 {
            return current_zoom;
        }
        current_zoom * self.target_fraction / occupancy
    }

    fn name(&self) -> &str {
        "proportional"
    }
}

/// Maps a detected region to a camera command.
///
/// Holds no state of its own beyond the policy; it never talks to hardware.
pub struct ZoomController {
    policy: Box<dyn ZoomPolicy>,
}

impl ZoomController {
    pub fn new(policy: impl ZoomPolicy + 'static) -> Self {
        Self {
            policy: Box::new(policy),
        }
    }

    pub fn from_boxed(policy: Box<dyn ZoomPolicy>) -> Self {
        Self { policy }
    }

    pub fn policy_name(&self) -> &str {
        self.policy.name()
    }

    /// Build the command for one detection.
    ///
    /// The zoom factor is clamped to the device limits; focus and exposure
    /// both target the region's center, normalized to the frame.
    pub fn compute_command(
        &mut self,
        region: &Region,
        frame: FrameSize,
        capabilities: &DeviceCapabilities,
        current_zoom: f64,
    ) -> ZoomCommand {
        let requested = self.policy.zoom_factor(region, frame, current_zoom);
        let zoom_factor = capabilities.clamp_zoom(requested);

        let (cx, cy) = region.center();
        let point = NormalizedPoint::from_pixel(cx, cy, frame);

        trace!(
            "{} zoom: requested {:.3}, clamped {:.3}, poi ({:.3}, {:.3})",
            self.policy.name(),
            requested,
            zoom_factor,
            point.x,
            point.y
        );

        ZoomCommand {
            zoom_factor,
            focus_point: point,
            exposure_point: point,
        }
    }
}

impl Default for ZoomController {
    fn default() -> Self {
        Self::new(ProportionalZoom::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn seeded(min: f64, max: f64, seed: u64) -> RandomRangeZoom<StdRng> {
        RandomRangeZoom::with_rng(min, max, StdRng::seed_from_u64(seed)).unwrap()
    }

    #[test]
    fn test_random_policy_stays_in_range() {
        let mut policy = seeded(8.0, 10.0, 7);
        let region = Region::new(0, 0, 10, 10).unwrap();
        let frame = FrameSize::new(100, 100);

        for _ in 0..500 {
            let zoom = policy.zoom_factor(&region, frame, 1.0);
            assert!((8.0..=10.0).contains(&zoom));
        }
    }

    #[test]
    fn test_random_policy_rejects_bad_ranges() {
        assert!(RandomRangeZoom::new(10.0, 8.0).is_err());
        assert!(RandomRangeZoom::new(0.0, 8.0).is_err());
        assert!(RandomRangeZoom::new(1.0, f64::NAN).is_err());
        assert!(RandomRangeZoom::new(3.0, 3.0).is_ok());
    }

    #[test]
    fn test_zoom_is_clamped_to_device_max() -> Result<(), ControlError> {
        let caps = DeviceCapabilities::with_max_zoom(5.0)?;
        let mut controller = ZoomController::new(seeded(8.0, 10.0, 42));
        let region = Region::new(40, 40, 20, 20).unwrap();
        let frame = FrameSize::new(100, 100);

        for _ in 0..200 {
            let command = controller.compute_command(&region, frame, &caps, 1.0);
            assert_eq!(command.zoom_factor, 5.0);
        }
        Ok(())
    }

    #[test]
    fn test_focus_and_exposure_target_region_center() -> Result<(), ControlError> {
        let caps = DeviceCapabilities::with_max_zoom(10.0)?;
        let mut controller = ZoomController::default();
        let region = Region::new(50, 60, 10, 10).unwrap();
        let frame = FrameSize::new(200, 100);

        let command = controller.compute_command(&region, frame, &caps, 1.0);
        assert_relative_eq!(command.focus_point.x, 55.0 / 200.0);
        assert_relative_eq!(command.focus_point.y, 65.0 / 100.0);
        assert_eq!(command.focus_point, command.exposure_point);
        Ok(())
    }

    #[test]
    fn test_proportional_policy_converges_on_target() -> Result<(), ControlError> {
        let mut policy = ProportionalZoom::new(0.5)?;
        let frame = FrameSize::new(100, 100);

        // Moon spans a tenth of the frame at 2x: zoom in by 5.
        let small = Region::new(45, 45, 10, 10).unwrap();
        assert_relative_eq!(policy.zoom_factor(&small, frame, 2.0), 10.0);

        // Already at target: hold.
        let framed = Region::new(25, 25, 50, 50).unwrap();
        assert_relative_eq!(policy.zoom_factor(&framed, frame, 3.0), 3.0);

        // Overfilled: zoom out.
        let large = Region::new(0, 0, 100, 100).unwrap();
        assert_relative_eq!(policy.zoom_factor(&large, frame, 4.0), 2.0);
        Ok(())
    }

    #[test]
    fn test_proportional_policy_rejects_bad_target() {
        assert!(ProportionalZoom::new(0.0).is_err());
        assert!(ProportionalZoom::new(1.5).is_err());
        assert!(ProportionalZoom::new(f64::NAN).is_err());
    }
}
