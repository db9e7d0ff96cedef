//! Mirroring a source tree into resized images and thumbnails.
//!
//! Walks the input tree, recreates every directory under the output root and
//! runs each qualifying image through [`transform_image`].
//!
//! ## Output Structure
//!
//! ```text
//! output/
//! ├── album_description          # copied verbatim, if present
//! ├── 001-dawn.jpg               # resized to the target box (+ copyright)
//! ├── thumbnails/
//! │   └── 001-dawn.jpg           # thumb_prefix + filename
//! ├── original/                  # only with big_images.enabled
//! │   └── 001-dawn.jpg
//! └── Travel/
//!     └── ...
//! ```
//!
//! ## Skipping
//!
//! An image is skipped when both its resized file and its thumbnail already
//! exist, unless `force` is set. Presence is all that is checked, so a second
//! run over an unchanged tree encodes nothing.
//!
//! ## Parallel Processing
//!
//! Directories are handled one at a time and their output directories exist
//! before any image work starts. The images of a directory are fanned out on
//! the global [rayon](https://docs.rs/rayon) pool.
//!
//! ## Failures
//!
//! Only a missing/unusable output root aborts the build. A broken image, a
//! failed metadata copy or an unwritable directory is reported as a
//! [`ProcessEvent`], counted in the [`BuildSummary`], and the run moves on.

use crate::config::GallerySettings;
use crate::imaging::{
    Dimensions, ImageBackend, ImageOutputs, Quality, RustBackend, TransformConfig,
    transform_image,
};
use crate::metadata::{
    Capability, ExifCopier, MetadataBackend, MetadataPropagator, Propagation,
};
use crate::scan::{DirListing, DirectoryWalker};
use rayon::prelude::*;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot create output root {}: {source}", path.display())]
    OutputRoot {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("input root {} is unreadable: {source}", path.display())]
    InputRoot {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("output root must differ from the input root: {}", .0.display())]
    SameRoot(PathBuf),
    #[error("{} is outside the input root", .0.display())]
    OutsideInput(PathBuf),
}

/// Copyright sign and space put in front of the configured copyright text.
pub const COPYRIGHT_PREFIX: &str = "\u{a9} ";

/// Processing settings resolved from [`GallerySettings`].
///
/// Built once per run; read-only afterwards and shared by all workers.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessConfig {
    /// Lowercased, without leading dot.
    pub extensions: Vec<String>,
    pub transform: TransformConfig,
    pub thumb_dir: String,
    pub thumb_prefix: String,
    /// `Some(dir)` when unresized copies are kept.
    pub big_image_dir: Option<String>,
    pub description_file: String,
    pub exif: bool,
    pub follow_links: bool,
    pub force: bool,
}

impl ProcessConfig {
    /// Build a ProcessConfig from GallerySettings values.
    ///
    /// The copyright text gets its [`COPYRIGHT_PREFIX`] here, once.
    pub fn from_settings(settings: &GallerySettings) -> Self {
        let extensions = settings
            .file_extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .collect();

        let copyright = Some(settings.images.copyright.trim())
            .filter(|text| !text.is_empty())
            .map(|text| format!("{COPYRIGHT_PREFIX}{text}"));

        let [target_w, target_h] = settings.images.target_size;
        let [thumb_w, thumb_h] = settings.thumbnails.size;

        Self {
            extensions,
            transform: TransformConfig {
                target_size: (target_w, target_h),
                thumb_size: (thumb_w, thumb_h),
                square_thumbnail: settings.thumbnails.square,
                quality: Quality::new(settings.images.jpeg_quality),
                copyright,
            },
            thumb_dir: settings.thumbnails.dir.clone(),
            thumb_prefix: settings.thumbnails.prefix.clone(),
            big_image_dir: settings
                .big_images
                .enabled
                .then(|| settings.big_images.dir.clone()),
            description_file: settings.description_file.clone(),
            exif: settings.images.exif,
            follow_links: settings.follow_links,
            force: settings.force,
        }
    }

    /// Where the files for `filename` go inside the mirrored directory.
    pub fn outputs_for(&self, mirrored: &Path, filename: &str) -> ImageOutputs {
        ImageOutputs {
            full: mirrored.join(filename),
            thumbnail: mirrored
                .join(&self.thumb_dir)
                .join(format!("{}{}", self.thumb_prefix, filename)),
            big_image: self
                .big_image_dir
                .as_ref()
                .map(|dir| mirrored.join(dir).join(filename)),
        }
    }
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self::from_settings(&GallerySettings::default())
    }
}

/// Progress events emitted while a build runs.
///
/// Sent over an optional channel so the caller can display progress as
/// images complete. Directory names are relative to the input root, `.` for
/// the root itself.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessEvent {
    DirectoryStarted {
        dir: String,
        image_count: usize,
    },
    DescriptionCopied {
        dir: String,
    },
    ImageProcessed {
        filename: String,
        original: Dimensions,
        resized: Dimensions,
        thumbnail: Dimensions,
    },
    ImageSkipped {
        filename: String,
    },
    ImageFailed {
        filename: String,
        error: String,
    },
    MetadataFailed {
        filename: String,
        error: String,
    },
    /// Metadata copying was requested but cannot be done. Sent at most once.
    MetadataUnavailable,
    DirectoryFailed {
        dir: String,
        error: String,
    },
    Cancelled,
}

/// Counters for a finished build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildSummary {
    pub directories: u32,
    pub processed: u32,
    pub skipped: u32,
    pub failed: u32,
    pub metadata_failures: u32,
    pub directory_failures: u32,
    pub cancelled: bool,
}

impl BuildSummary {
    pub fn total_images(&self) -> u32 {
        self.processed + self.skipped + self.failed
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0 || self.directory_failures > 0
    }
}

impl fmt::Display for BuildSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} directories, {} processed, {} skipped, {} failed",
            self.directories, self.processed, self.skipped, self.failed
        )?;
        if self.metadata_failures > 0 {
            write!(f, ", {} metadata failures", self.metadata_failures)?;
        }
        if self.directory_failures > 0 {
            write!(f, ", {} directory failures", self.directory_failures)?;
        }
        if self.cancelled {
            write!(f, " (cancelled)")?;
        }
        Ok(())
    }
}

/// Cooperative cancellation shared between the caller and the workers.
///
/// Checked before each image starts; an image already in progress finishes.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What happened to one source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImageOutcome {
    Processed { metadata_failed: bool },
    Skipped,
    Failed,
    NotStarted,
}

/// A source tree to mirror.
pub struct Gallery {
    config: ProcessConfig,
    input_root: PathBuf,
    events: Option<Sender<ProcessEvent>>,
    cancel: CancelFlag,
}

impl Gallery {
    pub fn new(config: ProcessConfig, input_root: impl Into<PathBuf>) -> Self {
        Self {
            config,
            input_root: input_root.into(),
            events: None,
            cancel: CancelFlag::new(),
        }
    }

    /// Send progress events to `sender`. The channel closes when the gallery is dropped.
    pub fn with_events(mut self, sender: Sender<ProcessEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Walker over the input tree with this gallery's settings.
    pub fn walker(&self) -> DirectoryWalker {
        DirectoryWalker::new(&self.input_root, &self.config.extensions)
            .follow_links(self.config.follow_links)
    }

    /// Mirror the input tree into `output_root` with the built-in backends.
    ///
    /// `force` reprocesses existing outputs in addition to the `force`
    /// setting.
    pub fn build(&self, output_root: &Path, force: bool) -> Result<BuildSummary, ProcessError> {
        let backend = RustBackend::new();
        let metadata = ExifCopier::new();
        self.build_with_backends(&backend, &metadata, output_root, force)
    }

    /// Mirror the input tree using specific backends (allows testing with mocks).
    pub fn build_with_backends<B: ImageBackend, M: MetadataBackend>(
        &self,
        backend: &B,
        metadata: &M,
        output_root: &Path,
        force: bool,
    ) -> Result<BuildSummary, ProcessError> {
        let force = force || self.config.force;

        fs::create_dir_all(output_root).map_err(|source| ProcessError::OutputRoot {
            path: output_root.to_path_buf(),
            source,
        })?;
        let output_root = output_root
            .canonicalize()
            .map_err(|source| ProcessError::OutputRoot {
                path: output_root.to_path_buf(),
                source,
            })?;
        let input_root =
            self.input_root
                .canonicalize()
                .map_err(|source| ProcessError::InputRoot {
                    path: self.input_root.clone(),
                    source,
                })?;
        if input_root == output_root {
            return Err(ProcessError::SameRoot(output_root));
        }

        let mut walker = DirectoryWalker::new(&input_root, &self.config.extensions)
            .follow_links(self.config.follow_links);
        if output_root.starts_with(&input_root) {
            debug!("excluding nested output root {}", output_root.display());
            walker = walker.exclude(&output_root);
        }

        let propagator = MetadataPropagator::new(metadata, self.config.exif);
        if propagator.capability() == Capability::Unavailable {
            self.emit(ProcessEvent::MetadataUnavailable);
        }

        info!(
            "mirroring {} -> {}",
            input_root.display(),
            output_root.display()
        );

        let mut summary = BuildSummary::default();

        for listing in walker.listings() {
            if self.cancel.is_cancelled() {
                break;
            }

            let listing = match listing {
                Ok(listing) => listing,
                Err(e) => {
                    let dir = e
                        .path()
                        .map(|p| relative_name(&input_root, p))
                        .unwrap_or_else(|| ".".to_string());
                    warn!("cannot list {dir}: {e}");
                    summary.directory_failures += 1;
                    self.emit(ProcessEvent::DirectoryFailed {
                        dir,
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            let dir = relative_name(&input_root, &listing.dir);
            let mirrored = match self.prepare_directory(&input_root, &output_root, &listing) {
                Ok(mirrored) => mirrored,
                Err(e) => {
                    warn!("skipping directory {dir}: {e}");
                    summary.directory_failures += 1;
                    self.emit(ProcessEvent::DirectoryFailed {
                        dir,
                        error: e.to_string(),
                    });
                    continue;
                }
            };
            summary.directories += 1;

            if listing.images.is_empty() {
                continue;
            }

            self.emit(ProcessEvent::DirectoryStarted {
                dir,
                image_count: listing.images.len(),
            });

            let outcomes: Vec<ImageOutcome> = listing
                .images
                .par_iter()
                .map(|source| self.process_image(backend, &propagator, source, &mirrored, force))
                .collect();

            for outcome in outcomes {
                match outcome {
                    ImageOutcome::Processed { metadata_failed } => {
                        summary.processed += 1;
                        if metadata_failed {
                            summary.metadata_failures += 1;
                        }
                    }
                    ImageOutcome::Skipped => summary.skipped += 1,
                    ImageOutcome::Failed => summary.failed += 1,
                    ImageOutcome::NotStarted => {}
                }
            }
        }

        if self.cancel.is_cancelled() {
            info!("build cancelled");
            summary.cancelled = true;
            self.emit(ProcessEvent::Cancelled);
        }

        info!("build finished: {summary}");
        Ok(summary)
    }

    /// Create the mirrored directory and everything it needs before images
    /// are fanned out. Returns the mirrored directory.
    fn prepare_directory(
        &self,
        input_root: &Path,
        output_root: &Path,
        listing: &DirListing,
    ) -> Result<PathBuf, ProcessError> {
        let relative = listing
            .dir
            .strip_prefix(input_root)
            .map_err(|_| ProcessError::OutsideInput(listing.dir.clone()))?;
        let mirrored = output_root.join(relative);
        fs::create_dir_all(&mirrored)?;

        let description = listing.dir.join(&self.config.description_file);
        if description.is_file() {
            fs::copy(&description, mirrored.join(&self.config.description_file))?;
            debug!("copied {}", description.display());
            self.emit(ProcessEvent::DescriptionCopied {
                dir: relative_name(input_root, &listing.dir),
            });
        }

        if !listing.images.is_empty() {
            fs::create_dir_all(mirrored.join(&self.config.thumb_dir))?;
            if let Some(big_dir) = &self.config.big_image_dir {
                fs::create_dir_all(mirrored.join(big_dir))?;
            }
        }

        Ok(mirrored)
    }

    fn process_image<B: ImageBackend, M: MetadataBackend>(
        &self,
        backend: &B,
        propagator: &MetadataPropagator<'_, M>,
        source: &Path,
        mirrored: &Path,
        force: bool,
    ) -> ImageOutcome {
        if self.cancel.is_cancelled() {
            return ImageOutcome::NotStarted;
        }

        let filename = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let outputs = self.config.outputs_for(mirrored, &filename);

        if !force && outputs.full.exists() && outputs.thumbnail.exists() {
            debug!("{} exists, skipping", outputs.full.display());
            self.emit(ProcessEvent::ImageSkipped { filename });
            return ImageOutcome::Skipped;
        }

        let report = match transform_image(backend, source, &outputs, &self.config.transform) {
            Ok(report) => report,
            Err(e) => {
                warn!("failed to process {}: {e}", source.display());
                self.emit(ProcessEvent::ImageFailed {
                    filename,
                    error: e.to_string(),
                });
                return ImageOutcome::Failed;
            }
        };

        self.emit(ProcessEvent::ImageProcessed {
            filename: filename.clone(),
            original: report.original,
            resized: report.resized,
            thumbnail: report.thumbnail,
        });

        let metadata_failed = match propagator.propagate(source, &outputs.full) {
            Propagation::Copied | Propagation::Disabled => false,
            Propagation::BecameUnavailable => {
                self.emit(ProcessEvent::MetadataUnavailable);
                false
            }
            Propagation::Failed(e) => {
                self.emit(ProcessEvent::MetadataFailed {
                    filename,
                    error: e.to_string(),
                });
                true
            }
        };

        ImageOutcome::Processed { metadata_failed }
    }

    fn emit(&self, event: ProcessEvent) {
        if let Some(tx) = &self.events {
            tx.send(event).ok();
        }
    }
}

/// `dir` relative to `root` for display, `.` for the root itself.
fn relative_name(root: &Path, dir: &Path) -> String {
    match dir.strip_prefix(root) {
        Ok(rel) if rel.as_os_str().is_empty() => ".".to_string(),
        Ok(rel) => rel.display().to_string(),
        Err(_) => dir.display().to_string(),
    }
}
