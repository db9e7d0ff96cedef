//! CLI output formatting.
//!
//! Every `format_*` function is pure and returns the lines to print, so the
//! exact console output is unit tested. The `print_*` wrappers write them to
//! stdout.
//!
//! # Output Format
//!
//! ## Build
//!
//! ```text
//! :: trip - 3 images
//!     a.jpg 4000x3000 -> 640x480, thumb 200x150
//!     b.jpg exists - skipping
//!     c.jpg FAILED: Failed to decode c.jpg: ...
//!
//! 2 directories, 1 processed, 1 skipped, 1 failed
//! ```
//!
//! ## Check
//!
//! ```text
//! . (1 images)
//!     a.jpg
//! trip (2 images)
//!     b.jpg
//!     c.png
//! 3 images in 2 directories
//! ```

use crate::process::{BuildSummary, ProcessEvent};
use crate::scan::{DirListing, ScanError};
use std::path::Path;

/// Indentation for nested lines.
pub fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn relative_dir(root: &Path, dir: &Path) -> String {
    match dir.strip_prefix(root) {
        Ok(rel) if rel.as_os_str().is_empty() => ".".to_string(),
        Ok(rel) => rel.display().to_string(),
        Err(_) => dir.display().to_string(),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ============================================================================
// Build output
// ============================================================================

/// Format a single build progress event as display lines.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::DirectoryStarted { dir, image_count } => {
            vec![format!(":: {} - {} images", dir, image_count)]
        }
        ProcessEvent::DescriptionCopied { dir } => {
            vec![format!("{}description copied for {}", indent(1), dir)]
        }
        ProcessEvent::ImageProcessed {
            filename,
            original,
            resized,
            thumbnail,
        } => vec![format!(
            "{}{} {}x{} -> {}x{}, thumb {}x{}",
            indent(1),
            filename,
            original.width,
            original.height,
            resized.width,
            resized.height,
            thumbnail.width,
            thumbnail.height
        )],
        ProcessEvent::ImageSkipped { filename } => {
            vec![format!("{}{} exists - skipping", indent(1), filename)]
        }
        ProcessEvent::ImageFailed { filename, error } => {
            vec![format!("{}{} FAILED: {}", indent(1), filename, error)]
        }
        ProcessEvent::MetadataFailed { filename, error } => {
            vec![format!("{}{} metadata not copied: {}", indent(2), filename, error)]
        }
        ProcessEvent::MetadataUnavailable => {
            vec!["metadata copying is unavailable in this build; continuing without it".to_string()]
        }
        ProcessEvent::DirectoryFailed { dir, error } => {
            vec![format!(":: {} FAILED: {}", dir, error)]
        }
        ProcessEvent::Cancelled => vec!["cancelled; remaining images not started".to_string()],
    }
}

/// Format the end-of-build summary.
pub fn format_summary(summary: &BuildSummary) -> Vec<String> {
    vec![String::new(), summary.to_string()]
}

/// Print build summary to stdout.
pub fn print_summary(summary: &BuildSummary) {
    for line in format_summary(summary) {
        println!("{}", line);
    }
}

// ============================================================================
// Check output
// ============================================================================

/// Format what a build would process: every directory holding images with
/// its image files, then any walk errors, then a total.
pub fn format_check_output(
    listings: &[DirListing],
    errors: &[ScanError],
    root: &Path,
) -> Vec<String> {
    let mut lines = Vec::new();
    let mut total = 0;
    let mut dirs = 0;

    for listing in listings.iter().filter(|l| !l.images.is_empty()) {
        dirs += 1;
        total += listing.images.len();
        lines.push(format!(
            "{} ({} images)",
            relative_dir(root, &listing.dir),
            listing.images.len()
        ));
        for image in &listing.images {
            lines.push(format!("{}{}", indent(1), file_name(image)));
        }
    }

    for error in errors {
        lines.push(format!("error: {}", error));
    }

    lines.push(format!("{} images in {} directories", total, dirs));
    lines
}

/// Print check output to stdout.
pub fn print_check_output(listings: &[DirListing], errors: &[ScanError], root: &Path) {
    for line in format_check_output(listings, errors, root) {
        println!("{}", line);
    }
}
