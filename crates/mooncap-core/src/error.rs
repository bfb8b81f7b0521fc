//! Typed errors for camera control

use thiserror::Error;

/// Invalid control parameters, rejected at setup time
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ControlError {
    #[error("invalid zoom range [{min}, {max}]: bounds must be finite, positive and ordered")]
    InvalidZoomRange { min: f64, max: f64 },

    #[error("invalid device zoom limits: min {min}, max {max}")]
    InvalidDeviceZoom { min: f64, max: f64 },

    #[error("target framing fraction must be in (0, 1], got {0}")]
    InvalidTargetFraction(f64),
}

/// Failure reported by a camera while applying a command
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CameraError {
    #[error("zoom factor {0} is not supported by the active format")]
    UnsupportedZoom(f64),

    #[error("point of interest is not supported")]
    PointOfInterestUnsupported,
}
