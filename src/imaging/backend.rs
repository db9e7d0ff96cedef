//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the primitives the transform pipeline
//! is built from: decode, resize, crop, draw text and save. Images are owned
//! values threaded through these calls, so the pipeline reads as a sequence
//! of moves rather than mutations of a shared object.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend): pure Rust, everything
//! statically linked into the binary.

use super::params::{CropBox, Quality};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode {}: {message}", path.display())]
    Decode { path: PathBuf, message: String },
    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Width and height of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn as_tuple(self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl From<(u32, u32)> for Dimensions {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

/// Trait for image processing backends.
///
/// `Image` is the backend's in-memory representation. Operations that change
/// the raster consume the image and return the new one; `draw_text` paints in
/// place.
pub trait ImageBackend: Sync {
    type Image;

    /// Decode a source file.
    fn decode(&self, path: &Path) -> Result<Self::Image, BackendError>;

    /// Current dimensions of an in-memory image.
    fn dimensions(&self, image: &Self::Image) -> Dimensions;

    /// Resize to exactly `width × height` with a high-quality filter.
    fn resize(&self, image: Self::Image, width: u32, height: u32) -> Self::Image;

    /// Cut out `region`.
    fn crop(&self, image: Self::Image, region: CropBox) -> Self::Image;

    /// Paint `text` with its top-left corner at `(x, y)`, clipping at the edges.
    fn draw_text(&self, image: &mut Self::Image, x: i64, y: i64, text: &str);

    /// Encode to `path`; the format follows the file extension.
    fn save(&self, image: &Self::Image, path: &Path, quality: Quality)
    -> Result<(), BackendError>;
}
