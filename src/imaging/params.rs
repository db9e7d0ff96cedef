//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! (which decides what files to produce) and the [`backend`](super::backend)
//! (which does the actual pixel work).
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 90). Clamped on construction.
//! - [`CropBox`]: Pixel region as `(left, top, right, bottom)`, right/bottom exclusive.
//! - [`TransformConfig`]: Everything the per-image pipeline needs besides paths.
//! - [`ImageOutputs`]: The files one source image turns into.

use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Rectangular crop region; `right` and `bottom` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropBox {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl CropBox {
    pub fn new(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }
}

/// Settings for the per-image transform sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformConfig {
    /// Bounding box for the resized image, oriented per source.
    pub target_size: (u32, u32),
    /// Bounding box for thumbnails, oriented per source unless square.
    pub thumb_size: (u32, u32),
    pub square_thumbnail: bool,
    pub quality: Quality,
    /// Overlay text, already carrying the copyright sign.
    pub copyright: Option<String>,
}

/// Output files for one source image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageOutputs {
    pub full: PathBuf,
    pub thumbnail: PathBuf,
    /// Set only when big-image copies are enabled.
    pub big_image: Option<PathBuf>,
}
