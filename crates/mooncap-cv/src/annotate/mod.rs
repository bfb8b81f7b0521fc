//! Circle annotator backends
//!
//! Each backend returns a copy of the frame with detected circular regions
//! painted in [`MARKER_COLOR`]; the detector only ever looks for that color.

#[cfg(feature = "opencv")]
pub mod hough;

use crate::mask::MARKER_COLOR;
use crate::traits::CircleAnnotator;
use crate::utils::ImageUtils;
use crate::{Frame, Result};
use image::Rgba;

/// Passes frames through untouched.
///
/// For feeds that already carry marker overlays, such as pre-annotated
/// replays and synthetic test frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityAnnotator;

impl CircleAnnotator for IdentityAnnotator {
    fn annotate(&self, frame: &Frame) -> Result<Frame> {
        Ok(frame.clone())
    }

    fn name(&self) -> &str {
        "identity"
    }
}

/// Brightness threshold backend with no native dependencies.
///
/// Against a night sky the moon is the brightest object in view; every pixel
/// at or above the luma threshold is painted with the marker, the rest black.
#[derive(Debug, Clone, Copy)]
pub struct LuminanceAnnotator {
    threshold: u8,
}

impl LuminanceAnnotator {
    pub const DEFAULT_THRESHOLD: u8 = 200;

    pub fn new(threshold: u8) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }
}

impl Default for LuminanceAnnotator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_THRESHOLD)
    }
}

impl CircleAnnotator for LuminanceAnnotator {
    fn annotate(&self, frame: &Frame) -> Result<Frame> {
        let background = Rgba([0, 0, 0, 255]);
        let mut annotated = Frame::new(frame.width(), frame.height());

        for (dst, px) in annotated.pixels_mut().zip(frame.pixels()) {
            *dst = if ImageUtils::luma(px) >= self.threshold {
                MARKER_COLOR
            } else {
                background
            };
        }

        Ok(annotated)
    }

    fn name(&self) -> &str {
        "luminance"
    }
}
