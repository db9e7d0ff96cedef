//! Gallery configuration.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! serialized to a TOML table and the user's file is merged on top, so a
//! config only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! file_extensions = ["jpg", "jpeg", "png"]
//! description_file = "album_description"
//! follow_links = false
//! force = false
//!
//! [images]
//! target_size = [640, 480]  # landscape box; swapped for portrait sources
//! jpeg_quality = 90         # 1-100
//! copyright = ""            # drawn bottom-left, prefixed with the copyright sign
//! exif = false              # copy EXIF/ICC from source to the resized image
//!
//! [thumbnails]
//! size = [200, 150]
//! square = false
//! dir = "thumbnails"
//! prefix = ""
//!
//! [big_images]
//! enabled = false           # keep an unresized copy of every image
//! dir = "original"
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name of the config file looked up in the input directory.
pub const CONFIG_FILENAME: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Gallery settings loaded from `config.toml`.
///
/// All fields have defaults. Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GallerySettings {
    /// Extensions (without dot, case-insensitive) treated as images.
    pub file_extensions: Vec<String>,
    /// Per-directory file copied verbatim into the mirrored directory.
    pub description_file: String,
    /// Follow symlinks while walking the input tree.
    pub follow_links: bool,
    /// Reprocess images whose outputs already exist.
    pub force: bool,
    pub images: ImagesConfig,
    pub thumbnails: ThumbnailsConfig,
    pub big_images: BigImagesConfig,
    pub processing: ProcessingConfig,
}

impl Default for GallerySettings {
    fn default() -> Self {
        Self {
            file_extensions: vec!["jpg".into(), "jpeg".into(), "png".into()],
            description_file: "album_description".into(),
            follow_links: false,
            force: false,
            images: ImagesConfig::default(),
            thumbnails: ThumbnailsConfig::default(),
            big_images: BigImagesConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

/// Settings for the resized full-size images.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// `[width, height]` for landscape sources; portrait sources get it swapped.
    pub target_size: [u32; 2],
    /// Encoding quality for every JPEG written (1 = worst, 100 = best).
    pub jpeg_quality: u32,
    /// Copyright text; empty means no overlay.
    pub copyright: String,
    /// Copy EXIF and ICC metadata from the source onto the resized image.
    pub exif: bool,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            target_size: [640, 480],
            jpeg_quality: 90,
            copyright: String::new(),
            exif: false,
        }
    }
}

/// Thumbnail settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailsConfig {
    /// `[width, height]` box; only the width is used for square thumbnails.
    pub size: [u32; 2],
    /// Center-crop to a square before fitting.
    pub square: bool,
    /// Subdirectory of each mirrored directory holding thumbnails.
    pub dir: String,
    /// Prepended to the source file name.
    pub prefix: String,
}

impl Default for ThumbnailsConfig {
    fn default() -> Self {
        Self {
            size: [200, 150],
            square: false,
            dir: "thumbnails".into(),
            prefix: String::new(),
        }
    }
}

/// Unresized copies of the originals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BigImagesConfig {
    pub enabled: bool,
    pub dir: String,
}

impl Default for BigImagesConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: "original".into(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel image processing workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)`, at least 1
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

/// A directory name used inside every mirrored directory must be one plain
/// path component.
fn is_plain_dir_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(std::path::Component::Normal(_)), None)
    )
}

impl GallerySettings {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.images.jpeg_quality) {
            return Err(ConfigError::Validation(
                "images.jpeg_quality must be 1-100".into(),
            ));
        }
        if self.images.target_size.contains(&0) {
            return Err(ConfigError::Validation(
                "images.target_size values must be non-zero".into(),
            ));
        }
        if self.thumbnails.size.contains(&0) {
            return Err(ConfigError::Validation(
                "thumbnails.size values must be non-zero".into(),
            ));
        }
        if self.file_extensions.iter().all(|e| e.trim_start_matches('.').is_empty()) {
            return Err(ConfigError::Validation(
                "file_extensions must list at least one extension".into(),
            ));
        }
        if !is_plain_dir_name(&self.thumbnails.dir) {
            return Err(ConfigError::Validation(
                "thumbnails.dir must be a single directory name".into(),
            ));
        }
        if self.big_images.enabled {
            if !is_plain_dir_name(&self.big_images.dir) {
                return Err(ConfigError::Validation(
                    "big_images.dir must be a single directory name".into(),
                ));
            }
            if self.big_images.dir == self.thumbnails.dir && self.thumbnails.prefix.is_empty() {
                return Err(ConfigError::Validation(
                    "big_images.dir and thumbnails.dir collide; set thumbnails.prefix or pick another dir".into(),
                ));
            }
        }
        if !is_plain_dir_name(&self.description_file) {
            return Err(ConfigError::Validation(
                "description_file must be a plain file name".into(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(GallerySettings::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<GallerySettings, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: GallerySettings = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load settings from a specific file. The file must exist.
pub fn load_config_file(path: &Path) -> Result<GallerySettings, ConfigError> {
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    resolve_config(Some(value))
}

/// Load settings from `config.toml` in `dir`, or stock defaults if absent.
pub fn load_config(dir: &Path) -> Result<GallerySettings, ConfigError> {
    let config_path = dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return resolve_config(None);
    }
    load_config_file(&config_path)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# photo-mirror configuration
# ==========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# Extensions treated as images (without the dot, case-insensitive).
file_extensions = ["jpg", "jpeg", "png"]

# Per-directory file copied verbatim into the output tree.
description_file = "album_description"

# Follow symlinks while walking the input tree. Symlink loops are detected
# and reported, never followed.
follow_links = false

# Reprocess images even when both the resized image and its thumbnail exist.
force = false

# ---------------------------------------------------------------------------
# Resized images
# ---------------------------------------------------------------------------
[images]
# [width, height] for landscape images. Portrait and square images use the
# box swapped, i.e. [height, width]. The result matches the box exactly.
target_size = [640, 480]

# Encoding quality for every JPEG written (1 = worst, 100 = best).
jpeg_quality = 90

# Text drawn at the bottom-left of every resized image, prefixed with the
# copyright sign. Empty means no overlay.
copyright = ""

# Copy EXIF and ICC metadata from the original onto the resized image.
exif = false

# ---------------------------------------------------------------------------
# Thumbnails
# ---------------------------------------------------------------------------
[thumbnails]
# Bounding box, oriented like target_size. Square thumbnails use the width
# for both sides.
size = [200, 150]

# Center-crop to a square before shrinking.
square = false

# Subdirectory (of each output directory) and file name prefix.
dir = "thumbnails"
prefix = ""

# ---------------------------------------------------------------------------
# Unresized originals
# ---------------------------------------------------------------------------
[big_images]
enabled = false
dir = "original"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel image-processing workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
