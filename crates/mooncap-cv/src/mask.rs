//! Marker color masks
//!
//! Isolates the pixels an annotator painted in its marker color.

use crate::Frame;
use image::{GrayImage, Luma, Rgba};
use mooncap_core::FrameSize;
use serde::{Deserialize, Serialize};

/// Mask value of an "on" pixel
pub const ON: u8 = 255;

/// Paint color annotators use for detected circles; inside [`ColorRange::MARKER`]
pub const MARKER_COLOR: Rgba<u8> = Rgba([100, 200, 50, 255]);

/// Inclusive interval of one 8-bit channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelRange {
    pub min: u8,
    pub max: u8,
}

impl ChannelRange {
    pub const FULL: ChannelRange = ChannelRange::new(0, 255);

    pub const fn new(min: u8, max: u8) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn contains(&self, value: u8) -> bool {
        value >= self.min && value <= self.max
    }

    /// An inverted interval matches nothing
    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }
}

/// Independent per-channel intervals; a pixel matches when all three do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColorRange {
    pub red: ChannelRange,
    pub green: ChannelRange,
    pub blue: ChannelRange,
}

impl ColorRange {
    /// Green marker drawn by the circle annotator (not the moon's own color)
    pub const MARKER: ColorRange = ColorRange {
        red: ChannelRange::new(20, 200),
        green: ChannelRange::new(150, 255),
        blue: ChannelRange::new(0, 150),
    };

    pub const fn new(red: ChannelRange, green: ChannelRange, blue: ChannelRange) -> Self {
        Self { red, green, blue }
    }

    #[inline]
    pub fn contains(&self, [r, g, b]: [u8; 3]) -> bool {
        self.red.contains(r) && self.green.contains(g) && self.blue.contains(b)
    }

    pub fn contains_pixel(&self, pixel: &Rgba<u8>) -> bool {
        self.contains([pixel[0], pixel[1], pixel[2]])
    }

    /// Channels whose interval is inverted, by name
    pub fn empty_channels(&self) -> Vec<&'static str> {
        [("red", self.red), ("green", self.green), ("blue", self.blue)]
            .into_iter()
            .filter(|(_, range)| range.is_empty())
            .map(|(name, _)| name)
            .collect()
    }
}

impl Default for ColorRange {
    fn default() -> Self {
        Self::MARKER
    }
}

/// How the per-pixel color decision is evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskStrategy {
    /// Three interval comparisons per pixel
    Direct,
    /// Precomputed per-channel membership tables, no branches per pixel
    #[default]
    LookupTable,
}

/// Per-channel 256-entry membership tables for a [`ColorRange`].
///
/// Each entry is 0 or 1, so a pixel's decision is the AND of three loads.
#[derive(Debug, Clone)]
pub struct ColorLut {
    red: [u8; 256],
    green: [u8; 256],
    blue: [u8; 256],
}

impl ColorLut {
    pub fn new(range: &ColorRange) -> Self {
        let table = |channel: ChannelRange| {
            let mut table = [0u8; 256];
            for (value, slot) in table.iter_mut().enumerate() {
                *slot = channel.contains(value as u8) as u8;
            }
            table
        };

        Self {
            red: table(range.red),
            green: table(range.green),
            blue: table(range.blue),
        }
    }

    /// 1 when the color is inside the range, 0 otherwise
    #[inline]
    pub fn lookup(&self, r: u8, g: u8, b: u8) -> u8 {
        self.red[r as usize] & self.green[g as usize] & self.blue[b as usize]
    }

    #[inline]
    pub fn contains(&self, r: u8, g: u8, b: u8) -> bool {
        self.lookup(r, g, b) != 0
    }
}

/// Binary raster, same size as the frame it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    image: GrayImage,
}

impl Mask {
    /// All-off mask
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: GrayImage::new(width, height),
        }
    }

    pub fn from_fn(width: u32, height: u32, mut on: impl FnMut(u32, u32) -> bool) -> Self {
        Self {
            image: GrayImage::from_fn(width, height, |x, y| Luma([if on(x, y) { ON } else { 0 }])),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn size(&self) -> FrameSize {
        FrameSize::new(self.width(), self.height())
    }

    /// Out-of-bounds positions read as off
    pub fn is_on(&self, x: u32, y: u32) -> bool {
        self.image
            .get_pixel_checked(x, y)
            .is_some_and(|pixel| pixel[0] != 0)
    }

    /// Out-of-bounds writes are ignored
    pub fn set(&mut self, x: u32, y: u32, on: bool) {
        if let Some(pixel) = self.image.get_pixel_mut_checked(x, y) {
            pixel[0] = if on { ON } else { 0 };
        }
    }

    /// Rows of raw mask bytes, top to bottom
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        let width = self.width().max(1) as usize;
        self.image.as_raw().chunks_exact(width)
    }

    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn count_on(&self) -> usize {
        self.image.as_raw().iter().filter(|&&v| v != 0).count()
    }

    /// True when no pixel is on
    pub fn is_blank(&self) -> bool {
        self.image.as_raw().iter().all(|&v| v == 0)
    }
}

/// Reusable extractor; builds its lookup table once
#[derive(Debug, Clone)]
pub struct MaskExtractor {
    range: ColorRange,
    lut: Option<ColorLut>,
}

impl MaskExtractor {
    pub fn new(range: ColorRange, strategy: MaskStrategy) -> Self {
        let lut = match strategy {
            MaskStrategy::Direct => None,
            MaskStrategy::LookupTable => Some(ColorLut::new(&range)),
        };
        Self { range, lut }
    }

    pub fn range(&self) -> &ColorRange {
        &self.range
    }

    pub fn strategy(&self) -> MaskStrategy {
        match self.lut {
            Some(_) => MaskStrategy::LookupTable,
            None => MaskStrategy::Direct,
        }
    }

    /// Mask of pixels whose RGB channels all fall inside the range; alpha is ignored
    pub fn extract(&self, frame: &Frame) -> Mask {
        let mut image = GrayImage::new(frame.width(), frame.height());
        let out = image.pixels_mut().zip(frame.pixels());

        match &self.lut {
            Some(lut) => {
                for (dst, px) in out {
                    dst[0] = ON * lut.lookup(px[0], px[1], px[2]);
                }
            }
            None => {
                for (dst, px) in out {
                    dst[0] = if self.range.contains_pixel(px) { ON } else { 0 };
                }
            }
        }

        Mask { image }
    }
}

impl Default for MaskExtractor {
    fn default() -> Self {
        Self::new(ColorRange::MARKER, MaskStrategy::default())
    }
}

/// One-shot extraction with the default strategy
pub fn extract_mask(frame: &Frame, range: &ColorRange) -> Mask {
    MaskExtractor::new(*range, MaskStrategy::default()).extract(frame)
}
