//! Black border detection on a luma plane.
//!
//! Each edge is scanned inward one line at a time. A line counts as picture
//! once its luma sum exceeds `(8 + 16)` per sample, i.e. it is brighter on
//! average than video black plus a small margin. The crop for an edge is the
//! number of lines skipped before the first picture line, capped at half
//! the dimension.

use framestage_core::{CropInsets, FrameStageError, Result};
use tracing::debug;

/// Minimum average level above video black (16) that counts as picture.
const MIN_DETECT: u64 = 8;
const VIDEO_BLACK: u64 = 16;

/// Scan a luma plane for black borders.
///
/// `luma` holds `height` rows of `stride` bytes, of which the first `width`
/// are samples.
pub fn detect_crop(luma: &[u8], stride: usize, width: u32, height: u32) -> Result<CropInsets> {
    let (w, h) = (width as usize, height as usize);
    if w == 0 || h == 0 {
        return Err(FrameStageError::InvalidParameter(format!(
            "cannot scan a {}x{} plane",
            width, height
        )));
    }
    if stride < w || luma.len() < stride * (h - 1) + w {
        return Err(FrameStageError::InvalidParameter(format!(
            "luma buffer of {} bytes too small for {}x{} at stride {}",
            luma.len(),
            width,
            height,
            stride
        )));
    }

    let row_threshold = (MIN_DETECT + VIDEO_BLACK) * w as u64;
    let col_threshold = (MIN_DETECT + VIDEO_BLACK) * h as u64;

    let row_sum = |y: usize| -> u64 { luma[y * stride..y * stride + w].iter().map(|&v| v as u64).sum() };
    let col_sum = |x: usize| -> u64 { (0..h).map(|y| luma[y * stride + x] as u64).sum() };

    let skipped = |limit: usize, is_picture: &dyn Fn(usize) -> bool| -> u32 {
        (0..limit).find(|&i| is_picture(i)).unwrap_or(limit) as u32
    };

    let crop = CropInsets {
        top: skipped(h / 2, &|i| row_sum(i) > row_threshold),
        bottom: skipped(h / 2, &|i| row_sum(h - 1 - i) > row_threshold),
        left: skipped(w / 2, &|i| col_sum(i) > col_threshold),
        right: skipped(w / 2, &|i| col_sum(w - 1 - i) > col_threshold),
    };

    debug!(
        left = crop.left,
        top = crop.top,
        right = crop.right,
        bottom = crop.bottom,
        "Auto crop scan"
    );
    Ok(crop)
}
