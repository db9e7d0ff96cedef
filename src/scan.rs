//! Directory walking.
//!
//! Produces, lazily, one [`DirListing`] per directory under the input root:
//! the directory itself, its subdirectory names, and the image files it
//! directly contains.
//!
//! ## Ordering
//!
//! Depth-first, with siblings sorted lexicographically by file name, so
//! progress output and skip behavior are the same from run to run regardless
//! of the filesystem's native order.
//!
//! ## Symlinks
//!
//! Not followed by default. With `follow_links`, walkdir detects loops and
//! reports them as an error item instead of descending forever; the walk
//! continues with the next sibling.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
}

impl ScanError {
    /// Path the error relates to, if known.
    pub fn path(&self) -> Option<&Path> {
        match self {
            ScanError::Walk(e) => e.path(),
            ScanError::NotADirectory(p) => Some(p),
        }
    }
}

/// One directory of the source tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirListing {
    pub dir: PathBuf,
    /// Names of immediate subdirectories, sorted.
    pub subdirs: Vec<String>,
    /// Qualifying image files directly inside `dir`, sorted by file name.
    pub images: Vec<PathBuf>,
}

/// Whether `path` has one of `extensions` (without dot, ASCII case-insensitive).
pub fn has_image_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}

/// Recursive listing of a source tree.
#[derive(Debug, Clone)]
pub struct DirectoryWalker {
    root: PathBuf,
    extensions: Vec<String>,
    follow_links: bool,
    exclude: Option<PathBuf>,
}

impl DirectoryWalker {
    pub fn new(root: impl Into<PathBuf>, extensions: &[String]) -> Self {
        Self {
            root: root.into(),
            extensions: extensions.to_vec(),
            follow_links: false,
            exclude: None,
        }
    }

    pub fn follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    /// Skip this directory and everything below it.
    ///
    /// Used to keep an output tree nested in the input tree out of the walk.
    pub fn exclude(mut self, path: impl Into<PathBuf>) -> Self {
        self.exclude = Some(path.into());
        self
    }

    /// Walk the tree. Errors are yielded in place of the affected listing.
    pub fn listings(&self) -> impl Iterator<Item = Result<DirListing, ScanError>> + '_ {
        let root_is_dir = self.root.is_dir();
        let root_error = (!root_is_dir).then(|| Err(ScanError::NotADirectory(self.root.clone())));

        let walker = root_is_dir
            .then(|| {
                WalkDir::new(&self.root)
                    .follow_links(self.follow_links)
                    .sort_by_file_name()
                    .into_iter()
                    .filter_entry(move |entry| !self.is_excluded(entry))
            })
            .into_iter()
            .flatten();

        root_error
            .into_iter()
            .chain(walker.filter_map(move |entry| match entry {
                Ok(entry) if entry.file_type().is_dir() => Some(self.list_dir(entry.path())),
                Ok(_) => None,
                Err(e) => Some(Err(ScanError::from(e))),
            }))
    }

    fn is_excluded(&self, entry: &DirEntry) -> bool {
        self.exclude
            .as_deref()
            .is_some_and(|excluded| entry.depth() > 0 && entry.path() == excluded)
    }

    fn list_dir(&self, dir: &Path) -> Result<DirListing, ScanError> {
        let mut subdirs = Vec::new();
        let mut images = Vec::new();

        let children = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(self.follow_links)
            .sort_by_file_name();

        for child in children {
            let child = match child {
                Ok(child) => child,
                // The directory itself is unreadable
                Err(e) if e.depth() == 0 => return Err(e.into()),
                // A looping symlink or an unreadable entry costs only that
                // entry; the outer walk reports loops
                Err(e) => {
                    warn!("skipping entry in {}: {e}", dir.display());
                    continue;
                }
            };
            if child.file_type().is_dir() {
                if !self.is_excluded(&child) {
                    subdirs.push(child.file_name().to_string_lossy().into_owned());
                }
            } else if child.path().is_file() && has_image_extension(child.path(), &self.extensions)
            {
                images.push(child.into_path());
            }
        }

        Ok(DirListing {
            dir: dir.to_path_buf(),
            subdirs,
            images,
        })
    }
}
