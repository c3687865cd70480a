//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::ImageReader::with_guessed_format` + `into_dimensions` (header only) |
//! | Decode (JPEG, PNG, WebP, GIF, TIFF, BMP) | `image::load_from_memory_with_format` |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` with the configured quality |
//! | Encode → other | `DynamicImage::write_to` (lossless, quality ignored) |
//!
//! Decoded and resized bitmaps are owned locals; they are dropped on every
//! return path, including the error ones.

use super::backend::{BackendError, Dimensions, ImageBackend, ImageInfo};
use super::params::RenderParams;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn decode(source: &[u8], format: ImageFormat) -> Result<DynamicImage, BackendError> {
    image::load_from_memory_with_format(source, format)
        .map_err(|e| BackendError::Decode(format!("{format:?}: {e}")))
}

/// Encode `img` as `format` into a fresh buffer.
fn encode(img: DynamicImage, format: ImageFormat, quality: u32) -> Result<Vec<u8>, BackendError> {
    if !format.writing_enabled() {
        return Err(BackendError::Encode(format!(
            "no encoder available for {format:?}"
        )));
    }

    let mut buf = Vec::new();
    match format {
        ImageFormat::Jpeg => {
            // JPEG has no alpha channel; flatten like a canvas export would.
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            let encoder = JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100) as u8);
            rgb.write_with_encoder(encoder)
                .map_err(|e| BackendError::Encode(format!("JPEG: {e}")))?;
        }
        ImageFormat::WebP | ImageFormat::Gif => {
            let rgba = DynamicImage::ImageRgba8(img.to_rgba8());
            rgba.write_to(&mut Cursor::new(&mut buf), format)
                .map_err(|e| BackendError::Encode(format!("{format:?}: {e}")))?;
        }
        other => {
            img.write_to(&mut Cursor::new(&mut buf), other)
                .map_err(|e| BackendError::Encode(format!("{other:?}: {e}")))?;
        }
    }

    if buf.is_empty() {
        return Err(BackendError::Encode(format!(
            "{format:?} encoder produced no output"
        )));
    }
    Ok(buf)
}

impl ImageBackend for RustBackend {
    fn identify(&self, source: &[u8]) -> Result<ImageInfo, BackendError> {
        let reader = ImageReader::new(Cursor::new(source))
            .with_guessed_format()
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        let format = reader
            .format()
            .ok_or_else(|| BackendError::Decode("unrecognized image format".to_string()))?;
        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| BackendError::Decode(format!("Failed to read dimensions: {e}")))?;
        if width == 0 || height == 0 {
            return Err(BackendError::Decode(format!(
                "image has no pixels ({width}x{height})"
            )));
        }
        Ok(ImageInfo {
            format,
            dimensions: Dimensions { width, height },
        })
    }

    fn render(&self, params: &RenderParams<'_>) -> Result<Vec<u8>, BackendError> {
        let img = decode(params.source, params.format)?;
        let img = if img.width() == params.width && img.height() == params.height {
            img
        } else {
            img.resize_exact(params.width, params.height, FilterType::Lanczos3)
        };
        encode(img, params.format, params.quality.value())
    }
}
