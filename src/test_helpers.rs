//! Shared test utilities for the folio test suite.
//!
//! Provides in-memory image fixtures and a seeded [`MemoryGateway`] so that
//! operation tests can start from a known state without going through the
//! operations under test.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let gw = signed_in_gateway();
//! let collection = seed_collection(&gw, "Landscapes", true).await;
//! let file = upload_file("dawn.png", png_bytes(64, 48));
//! ```

use std::io::Cursor;

use image::{ImageFormat, Rgb, RgbImage};

use crate::gateway::{MemoryGateway, RecordStore};
use crate::images::UploadFile;
use crate::naming::slugify;
use crate::types::{Collection, NewCollection};

/// User id that [`signed_in_gateway`] signs in as.
pub const TEST_USER: &str = "user-1";

// =========================================================================
// Image fixtures
// =========================================================================

/// A gradient so encoders have something other than a flat field to chew on.
fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    })
}

fn encode(img: RgbImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

/// Encoded PNG bytes of the given size.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(gradient(width, height), ImageFormat::Png)
}

/// Encoded JPEG bytes of the given size.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(gradient(width, height), ImageFormat::Jpeg)
}

/// An [`UploadFile`] whose media type is guessed from `name`.
pub fn upload_file(name: &str, bytes: Vec<u8>) -> UploadFile {
    let content_type = ImageFormat::from_path(name)
        .map(|f| f.to_mime_type())
        .unwrap_or("application/octet-stream");
    UploadFile::new(name, content_type, bytes)
}

// =========================================================================
// Gateway fixtures
// =========================================================================

/// A [`MemoryGateway`] with [`TEST_USER`] signed in.
pub fn signed_in_gateway() -> MemoryGateway {
    MemoryGateway::signed_in(TEST_USER)
}

/// Insert a collection owned by [`TEST_USER`] straight into the store.
///
/// The insert is recorded like any other call; use
/// [`MemoryGateway::clear_calls`] when a test asserts on call order.
pub async fn seed_collection(gw: &MemoryGateway, title: &str, is_public: bool) -> Collection {
    gw.insert_collection(&NewCollection {
        title: title.to_string(),
        slug: slugify(title),
        description: format!("About {title}"),
        is_public,
        user_id: TEST_USER.to_string(),
    })
    .await
    .unwrap()
}
