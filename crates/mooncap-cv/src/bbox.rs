//! Bounding box of a mask's "on" pixels
//!
//! A full-frame scan: every row is visited because the whole extent is
//! needed. Within a row the first and last on pixels are found from each end.

use crate::mask::Mask;
use mooncap_core::Region;

/// Inclusive pixel extent accumulated during a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Extent {
    min_x: u32,
    max_x: u32,
    min_y: u32,
    max_y: u32,
}

impl Extent {
    fn merge(self, other: Extent) -> Extent {
        Extent {
            min_x: self.min_x.min(other.min_x),
            max_x: self.max_x.max(other.max_x),
            min_y: self.min_y.min(other.min_y),
            max_y: self.max_y.max(other.max_y),
        }
    }

    fn into_region(self) -> Option<Region> {
        Region::from_extents(self.min_x, self.min_y, self.max_x, self.max_y)
    }
}

/// Scan consecutive rows starting at `first_row`
fn scan_rows<'a>(rows: impl Iterator<Item = &'a [u8]>, first_row: u32) -> Option<Extent> {
    let mut extent: Option<Extent> = None;

    for (dy, row) in rows.enumerate() {
        let Some(first) = row.iter().position(|&v| v != 0) else {
            continue;
        };
        let last = row.iter().rposition(|&v| v != 0).unwrap_or(first);
        let y = first_row + dy as u32;

        let row_extent = Extent {
            min_x: first as u32,
            max_x: last as u32,
            min_y: y,
            max_y: y,
        };
        extent = Some(match extent {
            Some(e) => e.merge(row_extent),
            None => row_extent,
        });
    }

    extent
}

/// Minimal axis-aligned region enclosing every "on" pixel, or `None` when
/// the mask is blank.
#[cfg(not(feature = "parallel"))]
pub fn bounding_box(mask: &Mask) -> Option<Region> {
    scan_rows(mask.rows(), 0).and_then(Extent::into_region)
}

/// Rows per band handed to a rayon task
#[cfg(feature = "parallel")]
const BAND_ROWS: usize = 64;

/// Minimal axis-aligned region enclosing every "on" pixel, or `None` when
/// the mask is blank.
///
/// Bands of rows are scanned in parallel and their extents merged.
#[cfg(feature = "parallel")]
pub fn bounding_box(mask: &Mask) -> Option<Region> {
    use rayon::prelude::*;

    let width = mask.width() as usize;
    if width == 0 {
        return None;
    }

    mask.as_raw()
        .par_chunks(width * BAND_ROWS)
        .enumerate()
        .filter_map(|(band, chunk)| scan_rows(chunk.chunks_exact(width), (band * BAND_ROWS) as u32))
        .reduce_with(Extent::merge)
        .and_then(Extent::into_region)
}
