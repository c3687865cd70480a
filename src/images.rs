//! Image operations: upload, public URL, delete.
//!
//! ## Upload
//!
//! ```text
//! validate media type ─► downscale ─► upload object ─► insert row
//!                                                        │ fails
//!                                                        ▼
//!                                          remove object (outcome recorded)
//! ```
//!
//! An image row is never written without its object already in storage. If
//! the row insert fails, the freshly uploaded object is removed and the
//! outcome of that removal travels with the error.
//!
//! ## Delete
//!
//! Object first, row second; the first failure stops the sequence. An
//! object that is already missing counts as a failure, so the row stays and
//! the inconsistency remains visible to the caller.

use crate::config::UploadConfig;
use crate::error::{CleanupOutcome, FolioError, Result, StoreContext};
use crate::gateway::{Gateway, GatewayError, ObjectStore, UploadOptions};
use crate::imaging::{ImageBackend, downscale};
use crate::naming::{default_title, storage_key};
use crate::types::{Image, NewImage};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, error, info, warn};

/// An image file as handed over by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    /// Original file name, e.g. `IMG_0042.jpg`.
    pub name: String,
    /// Declared media type, e.g. `image/jpeg`.
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Read a file from disk, declaring its media type from the extension.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let content_type = image::ImageFormat::from_path(path)
            .map(|f| f.to_mime_type())
            .unwrap_or("application/octet-stream");
        Ok(Self::new(name, content_type, bytes))
    }

    pub fn is_image(&self) -> bool {
        self.content_type
            .trim()
            .to_ascii_lowercase()
            .starts_with("image/")
    }
}

/// Result of a successful [`upload_image`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadedImage {
    pub image: Image,
    /// Storage key of the uploaded object.
    pub file_path: String,
    pub width: u32,
    pub height: u32,
    pub resized: bool,
}

/// Downscale `file`, store it under `collection_id`, and record its metadata.
pub async fn upload_image<G: Gateway + ?Sized>(
    gateway: &G,
    backend: &impl ImageBackend,
    file: &UploadFile,
    collection_id: &str,
    config: &UploadConfig,
) -> Result<UploadedImage> {
    if !file.is_image() {
        return Err(FolioError::InvalidInput(format!(
            "Invalid file type \"{}\". Please upload an image.",
            file.content_type
        )));
    }
    if file.bytes.is_empty() {
        return Err(FolioError::InvalidInput(format!("{} is empty", file.name)));
    }
    if collection_id.trim().is_empty() {
        return Err(FolioError::InvalidInput("collection id is required".into()));
    }

    let transcoded = downscale(backend, &file.bytes, &config.downscale())
        .inspect_err(|e| error!(file = %file.name, "transcode failed: {e}"))?;
    debug!(
        file = %file.name,
        from = ?(transcoded.original.width, transcoded.original.height),
        to = ?(transcoded.width, transcoded.height),
        bytes = transcoded.bytes.len(),
        "transcoded"
    );

    let resized = transcoded.was_resized();
    let key = storage_key(collection_id, &file.name, transcoded.extension());
    let options = UploadOptions {
        content_type: transcoded.content_type().to_string(),
        cache_control: config.cache_control,
        upsert: false,
    };
    let file_size = transcoded.bytes.len() as u64;
    let file_path = gateway
        .upload(&key, transcoded.bytes, &options)
        .await
        .context("uploading image")
        .inspect_err(|e| error!(key = %key, "{e}"))?;

    let row = NewImage {
        collection_id: collection_id.to_string(),
        file_path: file_path.clone(),
        file_name: file.name.clone(),
        file_size,
        title: default_title(&file.name),
        sort_order: 0,
    };
    let image = match gateway.insert_image(&row).await {
        Ok(image) => image,
        Err(source) => {
            let cleanup = remove_orphan(gateway, &file_path).await;
            error!(file_path = %file_path, %cleanup, "image metadata rejected: {source}");
            return Err(FolioError::MetadataRejected { source, cleanup });
        }
    };

    info!(id = %image.id, file_path = %file_path, "image uploaded");
    Ok(UploadedImage {
        image,
        file_path,
        width: transcoded.width,
        height: transcoded.height,
        resized,
    })
}

/// Remove an object whose metadata row could not be written.
async fn remove_orphan<G: ObjectStore + ?Sized>(gateway: &G, file_path: &str) -> CleanupOutcome {
    match gateway.remove(&[file_path.to_string()]).await {
        Ok(removed) if removed.iter().any(|k| k == file_path) => CleanupOutcome::Removed,
        Ok(_) => {
            warn!(file_path, "orphaned object was not found during cleanup");
            CleanupOutcome::Failed("object not found".to_string())
        }
        Err(e) => {
            warn!(file_path, "could not remove orphaned object: {e}");
            CleanupOutcome::Failed(e.to_string())
        }
    }
}

/// Public URL of a stored image.
pub fn image_url<G: ObjectStore + ?Sized>(gateway: &G, file_path: &str) -> Result<String> {
    if file_path.trim().is_empty() {
        return Err(FolioError::InvalidInput(
            "File path is required to get the image URL.".into(),
        ));
    }
    Ok(gateway.public_url(file_path))
}

/// Delete an image's stored object, then its row.
pub async fn delete_image<G: Gateway + ?Sized>(gateway: &G, image_id: &str) -> Result<()> {
    if image_id.trim().is_empty() {
        return Err(FolioError::InvalidInput("image id is required".into()));
    }

    let image = gateway
        .image(image_id)
        .await
        .context("fetching image data")?
        .ok_or_else(|| FolioError::NotFound(format!("image {image_id}")))?;

    let removed = gateway
        .remove(std::slice::from_ref(&image.file_path))
        .await
        .context("deleting image from storage")
        .inspect_err(|e| error!(image_id, "{e}"))?;
    if !removed.contains(&image.file_path) {
        let err = FolioError::Store {
            context: "deleting image from storage",
            source: GatewayError::MissingObjects(vec![image.file_path.clone()]),
        };
        error!(image_id, "{err}");
        return Err(err);
    }

    gateway
        .delete_image(image_id)
        .await
        .context("deleting image from database")
        .inspect_err(|e| {
            error!(
                image_id,
                file_path = %image.file_path,
                "{e}; object already removed"
            )
        })?;
    info!(image_id, "image deleted");
    Ok(())
}
