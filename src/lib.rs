//! # Photo Mirror
//!
//! Mirrors a directory tree of photographs into a parallel output tree of
//! web-sized images. Every image gets a resized copy, a thumbnail and, when
//! enabled, an unresized copy of the original; per-directory description
//! files are copied along.
//!
//! # Pipeline
//!
//! ```text
//! input/            walk           per directory            per image
//!   trip/  ───────────────▶ DirListing ──────────▶ mkdir ──────────▶ decode
//!     a.jpg                                                            │
//!                                                        [big image] ◀─┤
//!                                                                      ▼
//!                                            resize → [copyright] → save
//!                                                                      │
//!                                       [square crop] → fit → save thumbnail
//!                                                                      │
//!                                                          [copy EXIF/ICC]
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Lazy, sorted, depth-first walk of the input tree |
//! | [`process`] | Mirrors directories, decides skip/process, fans images out on rayon |
//! | [`imaging`] | Pure-Rust image operations: resize, crop, overlay, encode |
//! | [`metadata`] | EXIF/ICC propagation with a one-time capability check |
//! | [`config`] | `config.toml` loading, merging onto stock defaults, validation |
//! | [`output`] | CLI output formatting for build progress and `check` |
//!
//! # Design Decisions
//!
//! ## Skip By Presence
//!
//! An image whose resized file and thumbnail both exist is not touched again.
//! There is no cache manifest and no hashing: deleting an output file is how
//! a single image gets rebuilt, `--force` rebuilds everything.
//!
//! ## Deterministic Order
//!
//! Directories are walked depth-first with siblings sorted by name. Progress
//! output is the same on every filesystem and every run, even though the
//! images inside one directory are encoded in parallel.
//!
//! ## Degrade, Don't Abort
//!
//! One unreadable image, one corrupt EXIF block or one unwritable directory
//! never stops the build. They are reported and counted; only an output root
//! that cannot be created is fatal.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding, resampling and encoding use the `image` crate; the copyright
//! overlay uses built-in 8x8 bitmap glyphs. The binary needs no system
//! libraries and no font files.

pub mod config;
pub mod imaging;
pub mod metadata;
pub mod output;
pub mod process;
pub mod scan;

#[cfg(test)]
pub(crate) mod test_helpers;
