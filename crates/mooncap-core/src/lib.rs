//! Moon capture domain logic
//!
//! Frame geometry, the zoom/focus/exposure control policy and the user
//! instruction state machine. Nothing here touches pixels or hardware; the
//! image side lives in `mooncap-cv`.

pub mod control;
pub mod error;
pub mod instruction;
pub mod region;

// Re-export commonly used types
pub use control::{
    CameraControl, DeviceCapabilities, ProportionalZoom, RandomRangeZoom, ZoomCommand,
    ZoomController, ZoomPolicy,
};
pub use error::{CameraError, ControlError};
pub use instruction::{InstructionMachine, InstructionState, InstructionUpdate};
pub use region::{FrameSize, NormalizedPoint, Region};
