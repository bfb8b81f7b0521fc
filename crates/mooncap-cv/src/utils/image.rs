//! Frame helpers on top of the image crate

use crate::{Frame, Result};
use anyhow::Context;
use image::Rgba;
use mooncap_core::{FrameSize, Region};
use std::path::Path;

/// Frame utility functions
pub struct ImageUtils;

impl ImageUtils {
    /// Load any supported image file as an RGBA frame
    pub fn load_frame<P: AsRef<Path>>(path: P) -> Result<Frame> {
        let frame = image::open(&path)
            .with_context(|| format!("Failed to open image: {:?}", path.as_ref()))?
            .to_rgba8();
        Ok(frame)
    }

    pub fn frame_size(frame: &Frame) -> FrameSize {
        FrameSize::new(frame.width(), frame.height())
    }

    /// Opaque frame of a single color
    pub fn solid_frame(width: u32, height: u32, [r, g, b]: [u8; 3]) -> Frame {
        Frame::from_pixel(width, height, Rgba([r, g, b, 255]))
    }

    /// Paint a rectangle, clipped to the frame
    pub fn fill_region(frame: &mut Frame, region: &Region, [r, g, b]: [u8; 3]) {
        let x_end = (region.max_x() + 1).min(frame.width());
        let y_end = (region.max_y() + 1).min(frame.height());

        for y in region.y()..y_end {
            for x in region.x()..x_end {
                frame.put_pixel(x, y, Rgba([r, g, b, 255]));
            }
        }
    }

    /// Paint a filled disc, clipped to the frame
    pub fn fill_disc(frame: &mut Frame, (cx, cy): (u32, u32), radius: u32, [r, g, b]: [u8; 3]) {
        let r2 = radius as i64 * radius as i64;
        let (cx, cy) = (cx as i64, cy as i64);

        for (x, y, px) in frame.enumerate_pixels_mut() {
            let dx = x as i64 - cx;
            let dy = y as i64 - cy;
            if dx * dx + dy * dy <= r2 {
                *px = Rgba([r, g, b, 255]);
            }
        }
    }

    /// Rec. 601 luma of a pixel, integer arithmetic
    pub fn luma(pixel: &Rgba<u8>) -> u8 {
        let [r, g, b, _] = pixel.0;
        ((299 * r as u32 + 587 * g as u32 + 114 * b as u32) / 1000) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_region_is_clipped() {
        let mut frame = ImageUtils::solid_frame(10, 10, [0, 0, 0]);
        let region = Region::new(8, 8, 5, 5).unwrap();
        ImageUtils::fill_region(&mut frame, &region, [9, 9, 9]);

        assert_eq!(frame.get_pixel(9, 9), &Rgba([9, 9, 9, 255]));
        assert_eq!(frame.get_pixel(7, 7), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_luma() {
        assert_eq!(ImageUtils::luma(&Rgba([255, 255, 255, 255])), 255);
        assert_eq!(ImageUtils::luma(&Rgba([0, 0, 0, 255])), 0);
        assert_eq!(ImageUtils::luma(&Rgba([100, 200, 50, 255])), 153);
    }

    #[test]
    fn test_load_missing_file_fails_with_context() {
        let err = ImageUtils::load_frame("/nonexistent/moon.png").unwrap_err();
        assert!(format!("{err:#}").contains("moon.png"));
    }
}
