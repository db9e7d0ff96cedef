//! Shared test utilities.
//!
//! Synthetic images are generated on the fly so no binary fixtures have to
//! live in the repository.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! create_test_jpeg(&tmp.path().join("trip/a.jpg"), 800, 600);
//! write_tree(tmp.path(), &[("trip/album_description", "Summer")]);
//! ```

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbImage};
use std::path::Path;

// =========================================================================
// Synthetic images
// =========================================================================

/// Gradient so the encoder has something other than a flat color to work on.
fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
        ])
    })
}

/// Write a `width`×`height` JPEG to `path`, creating parent directories.
pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let file = std::fs::File::create(path).unwrap();
    let encoder = JpegEncoder::new_with_quality(std::io::BufWriter::new(file), 90);
    DynamicImage::ImageRgb8(gradient(width, height))
        .write_with_encoder(encoder)
        .unwrap();
}

/// Write a `width`×`height` PNG to `path`, creating parent directories.
pub fn create_test_png(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    gradient(width, height)
        .save_with_format(path, image::ImageFormat::Png)
        .unwrap();
}

// =========================================================================
// File trees
// =========================================================================

/// Write text files at `(relative path, contents)` under `root`.
pub fn write_tree(root: &Path, files: &[(&str, &str)]) {
    for (rel, contents) in files {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, contents).unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn synthetic_images_have_requested_size() {
        let tmp = TempDir::new().unwrap();
        let jpeg = tmp.path().join("nested/a.jpg");
        let png = tmp.path().join("b.png");
        create_test_jpeg(&jpeg, 40, 30);
        create_test_png(&png, 7, 9);

        assert_eq!(image::image_dimensions(&jpeg).unwrap(), (40, 30));
        assert_eq!(image::image_dimensions(&png).unwrap(), (7, 9));
    }

    #[test]
    fn write_tree_creates_parents() {
        let tmp = TempDir::new().unwrap();
        write_tree(tmp.path(), &[("a/b/c.txt", "hi")]);
        assert_eq!(
            std::fs::read_to_string(tmp.path().join("a/b/c.txt")).unwrap(),
            "hi"
        );
    }
}
