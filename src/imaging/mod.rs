//! Image processing: the client-side downscale that runs before upload.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader::into_dimensions` |
//! | **Fit** | [`calculations::fit_within`] (pure) |
//! | **Render** | Lanczos3 resize, re-encode in the source format |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
pub mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend, ImageInfo};
pub use operations::{DEFAULT_MAX_DIMENSION, DownscaleConfig, Transcoded, downscale};
pub use params::{Quality, RenderParams};
pub use rust_backend::RustBackend;
