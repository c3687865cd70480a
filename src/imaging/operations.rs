//! High-level image operations.
//!
//! These functions combine calculations with backend execution: they identify
//! the source, compute the target size, and ask the backend to render.

use super::backend::{BackendError, Dimensions, ImageBackend, ImageInfo};
use super::calculations::fit_within;
use super::params::{Quality, RenderParams};
use image::ImageFormat;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Longest edge, in pixels, of images stored through an upload.
pub const DEFAULT_MAX_DIMENSION: u32 = 1600;

/// Configuration for the downscale step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownscaleConfig {
    pub max_dimension: u32,
    pub quality: Quality,
}

impl Default for DownscaleConfig {
    fn default() -> Self {
        Self {
            max_dimension: DEFAULT_MAX_DIMENSION,
            quality: Quality::default(),
        }
    }
}

/// Output of a downscale: encoded bytes plus what they contain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcoded {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
    pub original: Dimensions,
    pub width: u32,
    pub height: u32,
}

impl Transcoded {
    /// Media type of the encoded bytes, e.g. `image/jpeg`.
    pub fn content_type(&self) -> &'static str {
        self.format.to_mime_type()
    }

    /// Canonical file extension of the encoded format, e.g. `jpg`.
    pub fn extension(&self) -> &'static str {
        self.format.extensions_str().first().copied().unwrap_or("bin")
    }

    pub fn was_resized(&self) -> bool {
        self.original.width != self.width || self.original.height != self.height
    }
}

/// Plan a render without executing it.
///
/// Useful for testing parameter generation.
pub fn plan_downscale<'a>(
    source: &'a [u8],
    info: &ImageInfo,
    config: &DownscaleConfig,
) -> RenderParams<'a> {
    let (width, height) = fit_within(
        (info.dimensions.width, info.dimensions.height),
        config.max_dimension,
    );
    RenderParams {
        source,
        format: info.format,
        width,
        height,
        quality: config.quality,
    }
}

/// Re-encode `source` so neither edge exceeds `config.max_dimension`.
///
/// The output keeps the source format and aspect ratio. Images already within
/// the bound are re-encoded at their original size, never upscaled.
pub fn downscale(
    backend: &impl ImageBackend,
    source: &[u8],
    config: &DownscaleConfig,
) -> Result<Transcoded> {
    let info = backend.identify(source)?;
    let params = plan_downscale(source, &info, config);
    let bytes = backend.render(&params)?;

    Ok(Transcoded {
        bytes,
        format: params.format,
        original: info.dimensions,
        width: params.width,
        height: params.height,
    })
}
