//! Camera control: zoom policies, commands and the hardware seam

pub mod camera;
pub mod zoom;

pub use camera::{CameraControl, DeviceCapabilities};
pub use zoom::{
    DEFAULT_TARGET_FRACTION, DEFAULT_ZOOM_RANGE, ProportionalZoom, RandomRangeZoom, ZoomCommand,
    ZoomController, ZoomPolicy,
};
