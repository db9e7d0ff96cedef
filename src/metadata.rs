//! Metadata propagation from source images to their resized copies.
//!
//! Re-encoding an image through the `image` crate drops every metadata block
//! the camera or editor wrote. When `exif = true`, the resized full-size file
//! gets the source's EXIF and ICC blocks copied back in after it is saved.
//!
//! ## Capability check
//!
//! The copier is a compile-time feature (`exif`, on by default). Whether it
//! is usable is asked once, when the [`MetadataPropagator`] is built. If it is
//! not, propagation is switched off for the whole run and the caller is told
//! once via [`Capability::Unavailable`]; no file ever attempts a copy.
//!
//! ## Failure policy
//!
//! A copy that fails for one file pair (unsupported container, corrupt
//! segment) is reported and otherwise ignored. The destination is only
//! rewritten after both files parsed, so a failed copy leaves it untouched.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("metadata support is not available in this build")]
    Unavailable,
    #[error("unsupported container for metadata: {}", .0.display())]
    Unsupported(PathBuf),
    #[error("corrupt metadata in {}: {message}", path.display())]
    Corrupt { path: PathBuf, message: String },
}

/// Something that can copy metadata blocks between two image files.
pub trait MetadataBackend: Sync {
    /// Whether the backend can do anything at all. Asked once per run.
    fn is_available(&self) -> bool;

    /// Copy all metadata from `source` onto `dest`, rewriting `dest`.
    fn copy_metadata(&self, source: &Path, dest: &Path) -> Result<(), MetadataError>;
}

/// Copies EXIF and ICC blocks with `img-parts` (JPEG, PNG, WebP containers).
#[derive(Debug, Default)]
pub struct ExifCopier;

impl ExifCopier {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(feature = "exif")]
mod container {
    use super::MetadataError;
    use img_parts::{DynImage, ImageEXIF, ImageICC};
    use std::path::Path;

    fn read(path: &Path) -> Result<DynImage, MetadataError> {
        let data = std::fs::read(path)?;
        DynImage::from_bytes(data.into())
            .map_err(|e| MetadataError::Corrupt {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
            .ok_or_else(|| MetadataError::Unsupported(path.to_path_buf()))
    }

    pub(super) fn copy(source: &Path, dest: &Path) -> Result<(), MetadataError> {
        let src = read(source)?;
        let mut dst = read(dest)?;

        if let Some(exif) = src.exif() {
            dst.set_exif(Some(exif));
        }
        if let Some(icc) = src.icc_profile() {
            dst.set_icc_profile(Some(icc));
        }

        let mut out = Vec::new();
        dst.encoder().write_to(&mut out)?;
        std::fs::write(dest, out)?;
        Ok(())
    }
}

impl MetadataBackend for ExifCopier {
    fn is_available(&self) -> bool {
        cfg!(feature = "exif")
    }

    #[cfg(feature = "exif")]
    fn copy_metadata(&self, source: &Path, dest: &Path) -> Result<(), MetadataError> {
        container::copy(source, dest)
    }

    #[cfg(not(feature = "exif"))]
    fn copy_metadata(&self, _source: &Path, _dest: &Path) -> Result<(), MetadataError> {
        Err(MetadataError::Unavailable)
    }
}

/// Outcome of the one-time capability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Metadata copying was not requested.
    NotRequested,
    Enabled,
    /// Requested, but the backend cannot do it. Disabled for the run.
    Unavailable,
}

/// Outcome of a single [`MetadataPropagator::propagate`] call.
#[derive(Debug)]
pub enum Propagation {
    Copied,
    /// Propagation is off; nothing was attempted.
    Disabled,
    /// The backend turned out to be unavailable on this call. Returned once;
    /// every later call sees [`Propagation::Disabled`].
    BecameUnavailable,
    Failed(MetadataError),
}

/// Run-wide metadata switch in front of a [`MetadataBackend`].
///
/// Shared by reference across worker threads; the enabled flag is atomic so
/// the first worker to discover the backend is unusable turns it off for all.
pub struct MetadataPropagator<'a, M: MetadataBackend> {
    backend: &'a M,
    enabled: AtomicBool,
    capability: Capability,
}

impl<'a, M: MetadataBackend> MetadataPropagator<'a, M> {
    /// Build the propagator, checking backend availability once.
    pub fn new(backend: &'a M, requested: bool) -> Self {
        let capability = match (requested, requested && backend.is_available()) {
            (false, _) => Capability::NotRequested,
            (true, true) => Capability::Enabled,
            (true, false) => {
                warn!("metadata copying requested but unavailable; disabled for this run");
                Capability::Unavailable
            }
        };
        Self {
            backend,
            enabled: AtomicBool::new(capability == Capability::Enabled),
            capability,
        }
    }

    pub fn capability(&self) -> Capability {
        self.capability
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Copy metadata from `source` onto `dest` if propagation is still on.
    pub fn propagate(&self, source: &Path, dest: &Path) -> Propagation {
        if !self.is_enabled() {
            return Propagation::Disabled;
        }

        match self.backend.copy_metadata(source, dest) {
            Ok(()) => {
                debug!("metadata copied {} -> {}", source.display(), dest.display());
                Propagation::Copied
            }
            Err(MetadataError::Unavailable) => {
                if self.enabled.swap(false, Ordering::SeqCst) {
                    warn!("metadata backend unavailable; disabled for this run");
                    Propagation::BecameUnavailable
                } else {
                    Propagation::Disabled
                }
            }
            Err(e) => {
                warn!("metadata not copied for {}: {e}", source.display());
                Propagation::Failed(e)
            }
        }
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Test double recording every copy attempt.
    #[derive(Default)]
    pub struct MockMetadata {
        pub available: bool,
        /// Source file names whose copy fails as if the metadata were corrupt.
        pub failing: Vec<String>,
        pub copies: Mutex<Vec<(String, String)>>,
    }

    impl MockMetadata {
        pub fn available() -> Self {
            Self {
                available: true,
                ..Self::default()
            }
        }

        pub fn unavailable() -> Self {
            Self::default()
        }

        pub fn failing_for(names: &[&str]) -> Self {
            Self {
                available: true,
                failing: names.iter().map(|n| n.to_string()).collect(),
                ..Self::default()
            }
        }

        pub fn copy_count(&self) -> usize {
            self.copies.lock().unwrap().len()
        }
    }

    fn name(path: &Path) -> String {
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    impl MetadataBackend for MockMetadata {
        fn is_available(&self) -> bool {
            self.available
        }

        fn copy_metadata(&self, source: &Path, dest: &Path) -> Result<(), MetadataError> {
            self.copies
                .lock()
                .unwrap()
                .push((name(source), dest.to_string_lossy().into_owned()));
            if self.failing.contains(&name(source)) {
                return Err(MetadataError::Corrupt {
                    path: source.to_path_buf(),
                    message: "bad IFD offset".into(),
                });
            }
            Ok(())
        }
    }

    /// Available at check time, but every copy reports the library missing.
    struct VanishingMetadata;

    impl MetadataBackend for VanishingMetadata {
        fn is_available(&self) -> bool {
            true
        }

        fn copy_metadata(&self, _: &Path, _: &Path) -> Result<(), MetadataError> {
            Err(MetadataError::Unavailable)
        }
    }

    #[test]
    fn not_requested_never_copies() {
        let backend = MockMetadata::available();
        let propagator = MetadataPropagator::new(&backend, false);

        assert_eq!(propagator.capability(), Capability::NotRequested);
        assert!(matches!(
            propagator.propagate(Path::new("a.jpg"), Path::new("out/a.jpg")),
            Propagation::Disabled
        ));
        assert_eq!(backend.copy_count(), 0);
    }

    #[test]
    fn unavailable_backend_disables_for_run() {
        let backend = MockMetadata::unavailable();
        let propagator = MetadataPropagator::new(&backend, true);

        assert_eq!(propagator.capability(), Capability::Unavailable);
        assert!(!propagator.is_enabled());
        for _ in 0..3 {
            assert!(matches!(
                propagator.propagate(Path::new("a.jpg"), Path::new("out/a.jpg")),
                Propagation::Disabled
            ));
        }
        assert_eq!(backend.copy_count(), 0);
    }

    #[test]
    fn available_backend_copies() {
        let backend = MockMetadata::available();
        let propagator = MetadataPropagator::new(&backend, true);

        assert!(matches!(
            propagator.propagate(Path::new("src/a.jpg"), Path::new("out/a.jpg")),
            Propagation::Copied
        ));
        assert_eq!(
            backend.copies.lock().unwrap()[0],
            ("a.jpg".to_string(), "out/a.jpg".to_string())
        );
    }

    #[test]
    fn copy_failure_keeps_propagation_enabled() {
        let backend = MockMetadata::failing_for(&["bad.jpg"]);
        let propagator = MetadataPropagator::new(&backend, true);

        assert!(matches!(
            propagator.propagate(Path::new("bad.jpg"), Path::new("out/bad.jpg")),
            Propagation::Failed(MetadataError::Corrupt { .. })
        ));
        assert!(propagator.is_enabled());
        assert!(matches!(
            propagator.propagate(Path::new("good.jpg"), Path::new("out/good.jpg")),
            Propagation::Copied
        ));
    }

    #[test]
    fn runtime_unavailability_reported_once() {
        let backend = VanishingMetadata;
        let propagator = MetadataPropagator::new(&backend, true);

        assert!(matches!(
            propagator.propagate(Path::new("a.jpg"), Path::new("out/a.jpg")),
            Propagation::BecameUnavailable
        ));
        assert!(!propagator.is_enabled());
        assert!(matches!(
            propagator.propagate(Path::new("b.jpg"), Path::new("out/b.jpg")),
            Propagation::Disabled
        ));
    }

    #[cfg(feature = "exif")]
    mod exif {
        use super::super::*;
        use crate::test_helpers::create_test_jpeg;
        use img_parts::{DynImage, ImageEXIF};

        /// Minimal little-endian TIFF header with an empty IFD0.
        const EMPTY_TIFF: &[u8] = b"II*\x00\x08\x00\x00\x00\x00\x00\x00\x00\x00\x00";

        fn read_exif(path: &Path) -> Option<Vec<u8>> {
            let data = std::fs::read(path).unwrap();
            DynImage::from_bytes(data.into())
                .unwrap()
                .unwrap()
                .exif()
                .map(|b| b.to_vec())
        }

        fn write_exif(path: &Path, exif: &[u8]) {
            let data = std::fs::read(path).unwrap();
            let mut image = DynImage::from_bytes(data.into()).unwrap().unwrap();
            image.set_exif(Some(exif.to_vec().into()));
            let mut out = Vec::new();
            image.encoder().write_to(&mut out).unwrap();
            std::fs::write(path, out).unwrap();
        }

        #[test]
        fn copier_is_available_with_feature() {
            assert!(ExifCopier::new().is_available());
        }

        #[test]
        fn copies_exif_between_jpegs() {
            let tmp = tempfile::TempDir::new().unwrap();
            let source = tmp.path().join("source.jpg");
            let dest = tmp.path().join("dest.jpg");
            create_test_jpeg(&source, 32, 24);
            create_test_jpeg(&dest, 16, 12);
            write_exif(&source, EMPTY_TIFF);
            assert_eq!(read_exif(&dest), None);

            ExifCopier::new().copy_metadata(&source, &dest).unwrap();

            assert_eq!(read_exif(&dest).as_deref(), Some(EMPTY_TIFF));
            assert_eq!(image::image_dimensions(&dest).unwrap(), (16, 12));
        }

        #[test]
        fn unsupported_source_leaves_dest_untouched() {
            let tmp = tempfile::TempDir::new().unwrap();
            let source = tmp.path().join("source.txt");
            let dest = tmp.path().join("dest.jpg");
            std::fs::write(&source, b"plain text").unwrap();
            create_test_jpeg(&dest, 16, 12);
            let before = std::fs::read(&dest).unwrap();

            let result = ExifCopier::new().copy_metadata(&source, &dest);

            assert!(matches!(result, Err(MetadataError::Unsupported(_))));
            assert_eq!(std::fs::read(&dest).unwrap(), before);
        }
    }
}
