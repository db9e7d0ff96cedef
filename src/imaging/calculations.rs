//! Pure calculation functions for image geometry.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::CropBox;

/// Offset of the copyright text from the left edge.
const TEXT_MARGIN_LEFT: i64 = 5;
/// Offset of the copyright text from the bottom edge.
const TEXT_MARGIN_BOTTOM: i64 = 15;

/// Orient a `(a, b)` bounding box to match the source orientation.
///
/// Landscape sources (`w > h`) get the box as given; portrait and square
/// sources get it swapped to `(b, a)`.
///
/// # Examples
/// ```
/// # use photo_mirror::imaging::calculations::orient_box;
/// assert_eq!(orient_box((800, 600), (400, 300)), (400, 300));
/// assert_eq!(orient_box((600, 800), (400, 300)), (300, 400));
/// ```
pub fn orient_box(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (w, h) = source;
    let (a, b) = target;
    if w > h { (a, b) } else { (b, a) }
}

/// Largest centered square inside the source.
///
/// `offset = (max - min) / 2` is removed from the leading side of the longer
/// dimension; the box is always `min × min`. Odd differences truncate, so the
/// trailing side loses one pixel more than the leading side.
pub fn square_crop_box(source: (u32, u32)) -> CropBox {
    let (w, h) = source;
    let side = w.min(h);
    let offset = (w.max(h) - side) / 2;

    if w > h {
        CropBox {
            left: offset,
            top: 0,
            right: offset + side,
            bottom: h,
        }
    } else {
        CropBox {
            left: 0,
            top: offset,
            right: w,
            bottom: offset + side,
        }
    }
}

/// Box a thumbnail is fitted into.
///
/// Square thumbnails use `(thumb_w, thumb_w)`; the source is expected to be
/// square-cropped already. Otherwise the thumbnail size follows the same
/// orientation rule as the main resize.
pub fn thumbnail_box(source: (u32, u32), thumb_size: (u32, u32), square: bool) -> (u32, u32) {
    if square {
        (thumb_size.0, thumb_size.0)
    } else {
        orient_box(source, thumb_size)
    }
}

/// Fit `source` inside `bounds`, preserving aspect ratio. Never upscales.
///
/// Returns the source dimensions unchanged when it already fits.
pub fn fit_within(source: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let (w, h) = source;
    let (max_w, max_h) = bounds;
    if w <= max_w && h <= max_h {
        return source;
    }

    let scale = (max_w as f64 / w as f64).min(max_h as f64 / h as f64);
    let fit_w = ((w as f64 * scale).round() as u32).clamp(1, max_w.max(1));
    let fit_h = ((h as f64 * scale).round() as u32).clamp(1, max_h.max(1));
    (fit_w, fit_h)
}

/// Top-left anchor of the copyright text for an image of the given size.
///
/// May be negative on images shorter than the bottom margin; glyph pixels
/// outside the image are clipped by the backend.
pub fn text_anchor(dims: (u32, u32)) -> (i64, i64) {
    (TEXT_MARGIN_LEFT, dims.1 as i64 - TEXT_MARGIN_BOTTOM)
}
