//! The camera hardware seam

use super::zoom::ZoomCommand;
use crate::error::{CameraError, ControlError};
use serde::Serialize;

/// Read-only zoom limits of the active camera format
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DeviceCapabilities {
    min_zoom: f64,
    max_zoom: f64,
}

impl DeviceCapabilities {
    /// Validate and build; limits must be finite with `1 <= min <= max`
    pub fn new(min_zoom: f64, max_zoom: f64) -> Result<Self, ControlError> {
        let valid = min_zoom.is_finite()
            && max_zoom.is_finite()
            && min_zoom >= 1.0
            && max_zoom >= min_zoom;
        if !valid {
            return Err(ControlError::InvalidDeviceZoom {
                min: min_zoom,
                max: max_zoom,
            });
        }
        Ok(Self { min_zoom, max_zoom })
    }

    /// Device without optical zoom below 1x
    pub fn with_max_zoom(max_zoom: f64) -> Result<Self, ControlError> {
        Self::new(1.0, max_zoom)
    }

    pub fn min_zoom(&self) -> f64 {
        self.min_zoom
    }

    pub fn max_zoom(&self) -> f64 {
        self.max_zoom
    }

    /// Clamp a requested zoom factor into the supported range.
    ///
    /// Non-finite requests fall back to the minimum zoom.
    pub fn clamp_zoom(&self, requested: f64) -> f64 {
        if !requested.is_finite() {
            return self.min_zoom;
        }
        requested.clamp(self.min_zoom, self.max_zoom)
    }
}

/// Exclusive handle to the physical camera's zoom, focus and exposure.
///
/// One handle is injected at setup; its capabilities are read once and the
/// handle is then owned by whichever context applies commands.
pub trait CameraControl: Send {
    fn capabilities(&self) -> DeviceCapabilities;

    /// Apply zoom, focus point and exposure point together
    fn apply(&mut self, command: &ZoomCommand) -> Result<(), CameraError>;
}

impl<C: CameraControl + ?Sized> CameraControl for Box<C> {
    fn capabilities(&self) -> DeviceCapabilities {
        (**self).capabilities()
    }

    fn apply(&mut self, command: &ZoomCommand) -> Result<(), CameraError> {
        (**self).apply(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities_validation() {
        assert!(DeviceCapabilities::new(1.0, 5.0).is_ok());
        assert!(DeviceCapabilities::new(1.0, 1.0).is_ok());
        assert!(DeviceCapabilities::new(0.5, 5.0).is_err());
        assert!(DeviceCapabilities::new(2.0, 1.5).is_err());
        assert!(DeviceCapabilities::with_max_zoom(f64::INFINITY).is_err());
        assert!(DeviceCapabilities::with_max_zoom(f64::NAN).is_err());
    }

    #[test]
    fn test_clamp_zoom() -> Result<(), ControlError> {
        let caps = DeviceCapabilities::with_max_zoom(5.0)?;
        assert_eq!(caps.clamp_zoom(9.3), 5.0);
        assert_eq!(caps.clamp_zoom(0.2), 1.0);
        assert_eq!(caps.clamp_zoom(3.0), 3.0);
        assert_eq!(caps.clamp_zoom(f64::NAN), 1.0);
        Ok(())
    }
}
