//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::ImageReader` (format sniffed from content) |
//! | Resize | `image::DynamicImage::resize_exact` with `Lanczos3` |
//! | Crop | `image::DynamicImage::crop_imm` |
//! | Draw text | `font8x8` bitmap glyphs, plotted pixel by pixel |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` at the configured quality |
//! | Encode → other | `image::DynamicImage::save_with_format` |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::{CropBox, Quality};
use font8x8::{BASIC_FONTS, LATIN_FONTS, UnicodeFonts};
use image::imageops::FilterType;
use image::{DynamicImage, GenericImage, GenericImageView, ImageFormat, ImageReader, Rgba};
use std::path::{Path, PathBuf};

/// Glyph cell size of the overlay font, in pixels.
const GLYPH_SIZE: i64 = 8;

/// Overlay text color.
const TEXT_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// A decoded image together with the file it came from.
///
/// Owned and move-only through the pipeline: every transform consumes the
/// asset and hands back the result.
#[derive(Debug, Clone)]
pub struct ImageAsset {
    pub source: PathBuf,
    pub image: DynamicImage,
}

impl ImageAsset {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Load and decode an image from disk.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    let decode_error = |message: String| BackendError::Decode {
        path: path.to_path_buf(),
        message,
    };
    ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| decode_error(e.to_string()))
}

/// Bitmap for `c`; characters outside Basic Latin and Latin-1 render blank.
fn glyph(c: char) -> [u8; 8] {
    BASIC_FONTS
        .get(c)
        .or_else(|| LATIN_FONTS.get(c))
        .unwrap_or([0; 8])
}

fn draw_glyphs(img: &mut DynamicImage, x: i64, y: i64, text: &str) {
    let (width, height) = (img.width() as i64, img.height() as i64);

    for (index, c) in text.chars().enumerate() {
        let origin_x = x + index as i64 * GLYPH_SIZE;
        for (row, bits) in glyph(c).iter().enumerate() {
            let py = y + row as i64;
            if py < 0 || py >= height {
                continue;
            }
            for col in 0..GLYPH_SIZE {
                let px = origin_x + col;
                if bits & (1 << col) == 0 || px < 0 || px >= width {
                    continue;
                }
                img.put_pixel(px as u32, py as u32, TEXT_COLOR);
            }
        }
    }
}

/// Save a DynamicImage to the given path, inferring format from extension.
fn save_image(img: &DynamicImage, path: &Path, quality: u32) -> Result<(), BackendError> {
    let format = ImageFormat::from_path(path).map_err(|_| {
        BackendError::UnsupportedFormat(
            path.extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_default(),
        )
    })?;

    match format {
        ImageFormat::Jpeg => save_jpeg(img, path, quality),
        other => img
            .save_with_format(path, other)
            .map_err(|e| BackendError::ProcessingFailed(format!("{other:?} encode failed: {e}"))),
    }
}

/// Encode as baseline JPEG. JPEG has no alpha, so the image is flattened to RGB8.
fn save_jpeg(img: &DynamicImage, path: &Path, quality: u32) -> Result<(), BackendError> {
    let file = std::fs::File::create(path)?;
    let writer = std::io::BufWriter::new(file);
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(writer, quality as u8);
    DynamicImage::ImageRgb8(img.to_rgb8())
        .write_with_encoder(encoder)
        .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {e}")))
}

impl ImageBackend for RustBackend {
    type Image = ImageAsset;

    fn decode(&self, path: &Path) -> Result<ImageAsset, BackendError> {
        Ok(ImageAsset {
            source: path.to_path_buf(),
            image: load_image(path)?,
        })
    }

    fn dimensions(&self, asset: &ImageAsset) -> Dimensions {
        Dimensions {
            width: asset.width(),
            height: asset.height(),
        }
    }

    fn resize(&self, asset: ImageAsset, width: u32, height: u32) -> ImageAsset {
        ImageAsset {
            image: asset.image.resize_exact(width, height, FilterType::Lanczos3),
            ..asset
        }
    }

    fn crop(&self, asset: ImageAsset, region: CropBox) -> ImageAsset {
        ImageAsset {
            image: asset
                .image
                .crop_imm(region.left, region.top, region.width(), region.height()),
            ..asset
        }
    }

    fn draw_text(&self, asset: &mut ImageAsset, x: i64, y: i64, text: &str) {
        draw_glyphs(&mut asset.image, x, y, text);
    }

    fn save(&self, asset: &ImageAsset, path: &Path, quality: Quality) -> Result<(), BackendError> {
        save_image(&asset.image, path, quality.value())
    }
}
