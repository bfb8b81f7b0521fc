//! Moon Capture Computer Vision Library
//!
//! Per-frame moon detection (annotate, mask, bounding box) and the pipeline
//! that turns each detection into a camera command and a user instruction.

pub mod annotate;
pub mod bbox;
pub mod detection;
pub mod mask;
pub mod pipeline;
pub mod utils;

// Re-export commonly used types
pub use annotate::{IdentityAnnotator, LuminanceAnnotator};
pub use bbox::bounding_box;
pub use detection::{CaptureConfig, DetectionConfig, MoonDetector};
pub use mask::{ColorRange, Mask, MaskExtractor, MaskStrategy, extract_mask};
pub use pipeline::{CycleReport, FramePipeline, PipelineChannels};
pub use traits::CircleAnnotator;

#[cfg(feature = "opencv")]
pub use annotate::hough::HoughCircleAnnotator;

// Error handling
pub type Result<T> = anyhow::Result<T>;

/// One camera sample: 8-bit RGBA, row-major.
pub type Frame = image::RgbaImage;

/// Core traits for the CV system
pub mod traits {
    use super::*;

    /// Opaque circle detector.
    ///
    /// Returns a copy of the frame with every detected circular region drawn
    /// over in the marker color. The result must have the frame's dimensions.
    pub trait CircleAnnotator: Send {
        fn annotate(&self, frame: &Frame) -> Result<Frame>;

        fn name(&self) -> &str;
    }

    impl<A: CircleAnnotator + ?Sized> CircleAnnotator for Box<A> {
        fn annotate(&self, frame: &Frame) -> Result<Frame> {
            (**self).annotate(frame)
        }

        fn name(&self) -> &str {
            (**self).name()
        }
    }
}
