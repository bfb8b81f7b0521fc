//! Simulated camera device for replaying recorded frames

use log::info;
use mooncap_core::{CameraControl, CameraError, DeviceCapabilities, NormalizedPoint, ZoomCommand};

/// Camera state after the last successful command
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSettings {
    pub zoom_factor: f64,
    pub focus_point: NormalizedPoint,
    pub exposure_point: NormalizedPoint,
}

/// In-memory stand-in for the back camera.
///
/// Validates every command the way a device would and keeps the settings it
/// would have applied. Commands are all-or-nothing.
#[derive(Debug, Clone)]
pub struct SimulatedCamera {
    capabilities: DeviceCapabilities,
    point_of_interest_supported: bool,
    settings: CameraSettings,
}

impl SimulatedCamera {
    pub fn new(capabilities: DeviceCapabilities) -> Self {
        Self {
            capabilities,
            point_of_interest_supported: true,
            settings: CameraSettings {
                zoom_factor: capabilities.min_zoom(),
                focus_point: NormalizedPoint::CENTER,
                exposure_point: NormalizedPoint::CENTER,
            },
        }
    }

    /// Fixed-focus module without focus/exposure points of interest
    pub fn without_point_of_interest(mut self) -> Self {
        self.point_of_interest_supported = false;
        self
    }

    #[cfg(test)]
    pub fn settings(&self) -> CameraSettings {
        self.settings
    }
}

impl CameraControl for SimulatedCamera {
    fn capabilities(&self) -> DeviceCapabilities {
        self.capabilities
    }

    fn apply(&mut self, command: &ZoomCommand) -> Result<(), CameraError> {
        let zoom = command.zoom_factor;
        if !(self.capabilities.min_zoom()..=self.capabilities.max_zoom()).contains(&zoom) {
            return Err(CameraError::UnsupportedZoom(zoom));
        }
        if !self.point_of_interest_supported {
            return Err(CameraError::PointOfInterestUnsupported);
        }

        self.settings = CameraSettings {
            zoom_factor: zoom,
            focus_point: command.focus_point,
            exposure_point: command.exposure_point,
        };
        let CameraSettings {
            zoom_factor,
            focus_point,
            exposure_point,
        } = self.settings;
        info!(
            "camera: zoom {:.2}x, focus ({:.3}, {:.3}), exposure ({:.3}, {:.3})",
            zoom_factor, focus_point.x, focus_point.y, exposure_point.x, exposure_point.y
        );
        Ok(())
    }
}
