//! Detected regions and frame coordinates
//!
//! Core abstraction for representing where the moon sits in a frame.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Pixel dimensions of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of pixels
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// True when the frame holds no pixels at all
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for FrameSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Axis-aligned bounding rectangle of a detected moon candidate, in frame
/// pixel coordinates.
///
/// Width and height are never zero. A missing detection is represented by
/// `Option::None`, so there is no way to build an empty `Region`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Region {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

impl Region {
    /// Create a region, or `None` when either side is zero or the far edge
    /// does not fit in `u32`
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        x.checked_add(width - 1)?;
        y.checked_add(height - 1)?;
        Some(Self {
            x,
            y,
            width,
            height,
        })
    }

    /// Create from inclusive pixel extents
    pub fn from_extents(min_x: u32, min_y: u32, max_x: u32, max_y: u32) -> Option<Self> {
        if min_x > max_x || min_y > max_y {
            return None;
        }
        let width = (max_x - min_x).checked_add(1)?;
        let height = (max_y - min_y).checked_add(1)?;
        Self::new(min_x, min_y, width, height)
    }

    pub fn x(&self) -> u32 {
        self.x
    }

    pub fn y(&self) -> u32 {
        self.y
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Rightmost covered column (inclusive)
    pub fn max_x(&self) -> u32 {
        self.x + self.width - 1
    }

    /// Bottom covered row (inclusive)
    pub fn max_y(&self) -> u32 {
        self.y + self.height - 1
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Geometric center in pixel coordinates
    pub fn center(&self) -> (f64, f64) {
        (
            self.x as f64 + self.width as f64 / 2.0,
            self.y as f64 + self.height as f64 / 2.0,
        )
    }

    /// Check whether a pixel lies inside the region
    pub fn contains(&self, px: u32, py: u32) -> bool {
        px >= self.x && px <= self.max_x() && py >= self.y && py <= self.max_y()
    }

    /// Fraction of the viewport the region occupies along its dominant axis.
    ///
    /// Returns `max(width / frame.width, height / frame.height)`, or `0.0` for
    /// an empty frame.
    pub fn occupancy(&self, frame: FrameSize) -> f64 {
        if frame.is_empty() {
            return 0.0;
        }
        let fx = self.width as f64 / frame.width as f64;
        let fy = self.height as f64 / frame.height as f64;
        fx.max(fy)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}) {}x{}",
            self.x, self.y, self.width, self.height
        )
    }
}

/// Point of interest in normalized frame coordinates.
///
/// Both axes run from 0.0 at the top-left corner to 1.0 at the bottom-right,
/// the convention camera focus and exposure controls expect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPoint {
    pub x: f64,
    pub y: f64,
}

impl NormalizedPoint {
    pub const CENTER: NormalizedPoint = NormalizedPoint { x: 0.5, y: 0.5 };

    /// Normalize a pixel position against the frame, clamped to `[0, 1]`
    pub fn from_pixel(px: f64, py: f64, frame: FrameSize) -> Self {
        if frame.is_empty() {
            return Self::CENTER;
        }
        Self {
            x: (px / frame.width as f64).clamp(0.0, 1.0),
            y: (py / frame.height as f64).clamp(0.0, 1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_zero_sized_region_is_rejected() {
        assert!(Region::new(3, 4, 0, 5).is_none());
        assert!(Region::new(3, 4, 5, 0).is_none());
        assert!(Region::new(3, 4, 1, 1).is_some());
    }

    #[test]
    fn test_extents_are_inclusive() {
        let region = Region::from_extents(50, 60, 59, 69).unwrap();
        assert_eq!(region, Region::new(50, 60, 10, 10).unwrap());
        assert_eq!(region.max_x(), 59);
        assert_eq!(region.max_y(), 69);

        assert!(Region::from_extents(5, 0, 4, 0).is_none());
    }

    #[test]
    fn test_center() {
        let region = Region::new(50, 60, 10, 10).unwrap();
        assert_eq!(region.center(), (55.0, 65.0));

        let pixel = Region::new(7, 9, 1, 1).unwrap();
        assert_eq!(pixel.center(), (7.5, 9.5));
    }

    #[test]
    fn test_far_edge_must_fit() {
        assert!(Region::new(u32::MAX, 0, 2, 1).is_none());
        assert!(Region::new(0, u32::MAX, 1, 2).is_none());

        let edge = Region::new(u32::MAX, u32::MAX, 1, 1).unwrap();
        assert_eq!(edge.max_x(), u32::MAX);
        assert_eq!(edge.max_y(), u32::MAX);
        assert!(Region::from_extents(0, 0, u32::MAX, 0).is_none());
    }

    #[test]
    fn test_occupancy_uses_dominant_axis() {
        let frame = FrameSize::new(200, 100);
        let region = Region::new(0, 0, 50, 50).unwrap();
        assert_relative_eq!(region.occupancy(frame), 0.5);
        assert_eq!(region.occupancy(FrameSize::new(0, 100)), 0.0);
    }

    #[test]
    fn test_normalized_point() {
        let frame = FrameSize::new(200, 100);
        let point = NormalizedPoint::from_pixel(55.0, 65.0, frame);
        assert_relative_eq!(point.x, 0.275);
        assert_relative_eq!(point.y, 0.65);

        let outside = NormalizedPoint::from_pixel(400.0, -3.0, frame);
        assert_eq!(outside, NormalizedPoint { x: 1.0, y: 0.0 });
    }
}
