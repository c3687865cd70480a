//! Parameter types for image operations.
//!
//! These structs describe *what* to render, not *how*. They sit between the
//! high-level [`operations`](super::operations) module (which decides the
//! target size) and the [`backend`](super::backend) (which does the pixel
//! work), so a mock backend can stand in during tests.
//!
//! - [`Quality`]: lossy encoding quality (1–100, default 92). Clamped on construction.
//! - [`RenderParams`]: source bytes, source format, target dimensions, quality.

use image::ImageFormat;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(92)
    }
}

/// Parameters for a render (decode → resize → encode) operation.
///
/// The output is encoded in `format`, the format the source was decoded from.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderParams<'a> {
    pub source: &'a [u8],
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn quality_default_is_92() {
        assert_eq!(Quality::default().value(), 92);
    }
}
