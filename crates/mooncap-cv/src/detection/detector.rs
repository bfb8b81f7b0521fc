//! Moon detector: annotate, mask, bound

use super::config::DetectionConfig;
use crate::Frame;
use crate::bbox::bounding_box;
use crate::mask::{Mask, MaskExtractor};
use crate::traits::CircleAnnotator;
use log::{debug, warn};
use mooncap_core::Region;

/// Finds the moon's bounding box in a single frame.
///
/// Strictly sequential and stateless across frames. Every failure degrades
/// to "not found"; nothing here can stop the next frame from being processed.
pub struct MoonDetector<A> {
    annotator: A,
    extractor: MaskExtractor,
}

impl<A: CircleAnnotator> MoonDetector<A> {
    pub fn new(annotator: A, config: &DetectionConfig) -> Self {
        Self {
            annotator,
            extractor: MaskExtractor::new(config.marker, config.strategy),
        }
    }

    pub fn annotator(&self) -> &A {
        &self.annotator
    }

    pub fn extractor(&self) -> &MaskExtractor {
        &self.extractor
    }

    /// Region of the marked circle, or `None` when the moon is not in view
    pub fn detect(&self, frame: &Frame) -> Option<Region> {
        let mask = self.marker_mask(frame)?;
        let region = bounding_box(&mask);

        match region {
            Some(region) => debug!("moon region found: {}", region),
            None => debug!("moon not found"),
        }
        region
    }

    /// Annotate the frame and isolate the marker, or `None` if the annotator
    /// produced nothing usable
    pub fn marker_mask(&self, frame: &Frame) -> Option<Mask> {
        if frame.width() == 0 || frame.height() == 0 {
            debug!("skipping empty frame");
            return None;
        }

        let annotated = match self.annotator.annotate(frame) {
            Ok(annotated) => annotated,
            Err(e) => {
                warn!("{} annotator failed: {:#}", self.annotator.name(), e);
                return None;
            }
        };

        if annotated.dimensions() != frame.dimensions() {
            warn!(
                "{} annotator returned {:?} for a {:?} frame, discarding",
                self.annotator.name(),
                annotated.dimensions(),
                frame.dimensions()
            );
            return None;
        }

        Some(self.extractor.extract(&annotated))
    }
}
