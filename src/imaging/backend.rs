//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations the transcode step
//! needs: identify (format + dimensions from the header) and render
//! (decode, resize, re-encode in the source format).
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate's pure-Rust codecs.

use super::params::RenderParams;
use image::ImageFormat;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Failed to encode image: {0}")]
    Encode(String),
}

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub format: ImageFormat,
    pub dimensions: Dimensions,
}

/// Trait for image processing backends.
///
/// Implementations own every intermediate buffer they allocate and must not
/// retain anything between calls.
pub trait ImageBackend: Sync {
    /// Detect the format and read the intrinsic dimensions.
    fn identify(&self, source: &[u8]) -> Result<ImageInfo, BackendError>;

    /// Decode `params.source`, scale to exactly `width`×`height` and encode
    /// in `params.format`.
    fn render(&self, params: &RenderParams<'_>) -> Result<Vec<u8>, BackendError>;
}
