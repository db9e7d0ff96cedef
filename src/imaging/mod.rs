//! Image processing in pure Rust, statically linked.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` |
//! | **Resize** | `resize_exact` with Lanczos3 |
//! | **Square crop** | `crop_imm` on the centered square |
//! | **Copyright overlay** | `font8x8` glyphs |
//! | **Thumbnail** | crop (optional) + shrink-to-fit |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for geometry (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
pub mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use operations::{
    TransformReport, add_copyright, create_thumbnail, resize_to_target, transform_image,
};
pub use params::{CropBox, ImageOutputs, Quality, TransformConfig};
pub use rust_backend::{ImageAsset, RustBackend};
