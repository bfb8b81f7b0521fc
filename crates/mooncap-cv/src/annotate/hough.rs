//! Hough-gradient circle detection through OpenCV
//!
//! The frame is reduced to luma in Rust, handed to OpenCV for median blur and
//! `HOUGH_GRADIENT`, and the circles found are drawn back onto a copy of the
//! frame as marker-colored rings.

use crate::mask::MARKER_COLOR;
use crate::traits::CircleAnnotator;
use crate::utils::ImageUtils;
use crate::{Frame, Result};
use anyhow::{Context, bail};
use image::GrayImage;
use opencv::{
    core::{Mat, Vec3f, Vector},
    imgproc,
    prelude::*,
};
use serde::{Deserialize, Serialize};

/// Parameters of the circle transform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoughParams {
    /// Inverse accumulator resolution
    pub dp: f64,
    /// Minimum distance between centers, as a fraction of the shorter side
    pub min_dist_fraction: f64,
    /// Upper Canny threshold
    pub canny_high: f64,
    /// Accumulator votes needed to accept a circle
    pub accumulator_threshold: f64,
    pub min_radius: i32,
    /// 0 lets OpenCV pick
    pub max_radius: i32,
    /// Median blur aperture, odd
    pub blur_ksize: i32,
    /// Ring thickness drawn per circle, in pixels
    pub ring_thickness: u32,
}

impl Default for HoughParams {
    fn default() -> Self {
        Self {
            dp: 1.0,
            min_dist_fraction: 0.125,
            canny_high: 100.0,
            accumulator_threshold: 30.0,
            min_radius: 10,
            max_radius: 0,
            blur_ksize: 5,
            ring_thickness: 3,
        }
    }
}

/// OpenCV-backed circle annotator
#[derive(Debug, Clone, Default)]
pub struct HoughCircleAnnotator {
    params: HoughParams,
}

impl HoughCircleAnnotator {
    pub fn new(params: HoughParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &HoughParams {
        &self.params
    }

    /// Detect circles as `(cx, cy, radius)` in pixels
    pub fn find_circles(&self, frame: &Frame) -> Result<Vec<(f32, f32, f32)>> {
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            bail!("cannot run circle transform on an empty frame");
        }

        let gray = GrayImage::from_fn(width, height, |x, y| {
            image::Luma([ImageUtils::luma(frame.get_pixel(x, y))])
        });
        let src =
            Mat::new_rows_cols_with_data(height as i32, width as i32, gray.as_raw().as_slice())
                .context("Failed to wrap frame as OpenCV Mat")?;

        let mut blurred = Mat::default();
        imgproc::median_blur(&*src, &mut blurred, self.params.blur_ksize)
            .context("Median blur failed")?;

        let min_dist = width.min(height) as f64 * self.params.min_dist_fraction;
        let mut circles: Vector<Vec3f> = Vector::new();
        imgproc::hough_circles(
            &blurred,
            &mut circles,
            imgproc::HOUGH_GRADIENT,
            self.params.dp,
            min_dist.max(1.0),
            self.params.canny_high,
            self.params.accumulator_threshold,
            self.params.min_radius,
            self.params.max_radius,
        )
        .context("Hough circle transform failed")?;

        Ok(circles.iter().map(|c| (c[0], c[1], c[2])).collect())
    }
}

impl CircleAnnotator for HoughCircleAnnotator {
    fn annotate(&self, frame: &Frame) -> Result<Frame> {
        let circles = self.find_circles(frame)?;
        let mut annotated = frame.clone();

        for &(cx, cy, radius) in &circles {
            draw_ring(&mut annotated, cx, cy, radius, self.params.ring_thickness);
        }

        log::trace!("hough: {} circle(s)", circles.len());
        Ok(annotated)
    }

    fn name(&self) -> &str {
        "hough"
    }
}

fn draw_ring(frame: &mut Frame, cx: f32, cy: f32, radius: f32, thickness: u32) {
    let half = thickness.max(1) as f32 / 2.0;
    let inner = (radius - half).max(0.0);
    let outer = radius + half;

    let x0 = (cx - outer).floor().max(0.0) as u32;
    let y0 = (cy - outer).floor().max(0.0) as u32;
    let x1 = ((cx + outer).ceil() as u32).min(frame.width().saturating_sub(1));
    let y1 = ((cy + outer).ceil() as u32).min(frame.height().saturating_sub(1));

    for y in y0..=y1 {
        for x in x0..=x1 {
            let d = ((x as f32 - cx).powi(2) + (y as f32 - cy).powi(2)).sqrt();
            if d >= inner && d <= outer {
                frame.put_pixel(x, y, MARKER_COLOR);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bbox::bounding_box;
    use crate::mask::{ColorRange, extract_mask};

    #[test]
    fn test_bright_disc_is_ringed() -> Result<()> {
        let mut frame = ImageUtils::solid_frame(200, 200, [0, 0, 0]);
        ImageUtils::fill_disc(&mut frame, (100, 100), 40, [230, 230, 230]);

        let annotated = HoughCircleAnnotator::default().annotate(&frame)?;
        let region = bounding_box(&extract_mask(&annotated, &ColorRange::MARKER))
            .expect("disc should be detected");

        let (cx, cy) = region.center();
        assert!((cx - 100.0).abs() < 6.0 && (cy - 100.0).abs() < 6.0);
        Ok(())
    }

    #[test]
    fn test_empty_frame_is_an_error() {
        assert!(HoughCircleAnnotator::default().annotate(&Frame::new(0, 0)).is_err());
    }
}
