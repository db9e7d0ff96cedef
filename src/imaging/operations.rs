//! High-level image operations.
//!
//! These functions combine calculations with backend execution. They take
//! configuration, compute geometry, and call the backend. [`transform_image`]
//! is the full per-image sequence:
//!
//! ```text
//! decode → [big image] → resize → [copyright] → save → [square crop] → fit → save thumbnail
//! ```
//!
//! The thumbnail continues from the resized, overlaid image rather than
//! re-decoding the source.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::{fit_within, orient_box, square_crop_box, text_anchor, thumbnail_box};
use super::params::{ImageOutputs, Quality, TransformConfig};
use std::path::Path;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Dimensions of the files written for one source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformReport {
    pub original: Dimensions,
    pub resized: Dimensions,
    pub thumbnail: Dimensions,
}

/// Resize onto the target box, swapping it for portrait and square sources.
pub fn resize_to_target<B: ImageBackend>(
    backend: &B,
    image: B::Image,
    target_size: (u32, u32),
) -> B::Image {
    let current = backend.dimensions(&image).as_tuple();
    let (width, height) = orient_box(current, target_size);
    backend.resize(image, width, height)
}

/// Draw the copyright text near the bottom-left corner.
pub fn add_copyright<B: ImageBackend>(backend: &B, image: &mut B::Image, text: &str) {
    let (x, y) = text_anchor(backend.dimensions(image).as_tuple());
    backend.draw_text(image, x, y, text);
}

/// Produce and save a thumbnail from `image`, consuming it.
///
/// Square thumbnails are center-cropped to the shorter side first. The result
/// is shrunk to fit the thumbnail box; images that already fit are saved as-is.
pub fn create_thumbnail<B: ImageBackend>(
    backend: &B,
    image: B::Image,
    output: &Path,
    thumb_size: (u32, u32),
    square: bool,
    quality: Quality,
) -> Result<Dimensions> {
    let image = if square {
        let region = square_crop_box(backend.dimensions(&image).as_tuple());
        backend.crop(image, region)
    } else {
        image
    };

    let current = backend.dimensions(&image).as_tuple();
    let bounds = thumbnail_box(current, thumb_size, square);
    let fitted = fit_within(current, bounds);
    let image = if fitted == current {
        image
    } else {
        backend.resize(image, fitted.0, fitted.1)
    };

    backend.save(&image, output, quality)?;
    Ok(backend.dimensions(&image))
}

/// Run the full transform sequence for one source image.
///
/// Any error aborts the sequence for this image only; files already written
/// (e.g. the big image) are left in place.
pub fn transform_image<B: ImageBackend>(
    backend: &B,
    source: &Path,
    outputs: &ImageOutputs,
    config: &TransformConfig,
) -> Result<TransformReport> {
    let image = backend.decode(source)?;
    let original = backend.dimensions(&image);

    if let Some(big_image) = &outputs.big_image {
        backend.save(&image, big_image, config.quality)?;
    }

    let mut image = resize_to_target(backend, image, config.target_size);
    if let Some(text) = &config.copyright {
        add_copyright(backend, &mut image, text);
    }
    backend.save(&image, &outputs.full, config.quality)?;
    let resized = backend.dimensions(&image);

    let thumbnail = create_thumbnail(
        backend,
        image,
        &outputs.thumbnail,
        config.thumb_size,
        config.square_thumbnail,
        config.quality,
    )?;

    Ok(TransformReport {
        original,
        resized,
        thumbnail,
    })
}
