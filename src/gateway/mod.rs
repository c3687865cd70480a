//! The backend contract: auth, relational rows, and object storage.
//!
//! The hosted backend is consumed through three narrow traits, one per
//! service, and [`Gateway`] ties them together for operations that need all
//! three. The handle is passed explicitly to every operation.
//!
//! | Trait | Service | Implementations |
//! |---|---|---|
//! | [`AuthApi`] | current user, session | [`RestGateway`], [`MemoryGateway`] |
//! | [`RecordStore`] | `collections` / `images` rows | [`RestGateway`], [`MemoryGateway`] |
//! | [`ObjectStore`] | upload, batch remove, public URL | [`RestGateway`], [`MemoryGateway`] |
//!
//! [`MemoryGateway`] keeps everything in process and records each call, for
//! tests and dry runs. [`RestGateway`] talks HTTP to a Supabase-compatible
//! deployment.

pub mod memory;
pub mod rest;

pub use memory::{MemoryGateway, Op, RecordedCall};
pub use rest::RestGateway;

use crate::types::{
    Collection, CollectionPatch, CollectionSummary, CollectionWithImages, Image, NewCollection,
    NewImage, Session, User,
};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("backend returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("objects not found in storage: {}", .0.join(", "))]
    MissingObjects(Vec<String>),
}

impl GatewayError {
    /// Uniqueness/duplicate violation (duplicate slug, existing object key).
    pub fn is_conflict(&self) -> bool {
        matches!(self, GatewayError::Conflict(_))
    }
}

/// Result type for gateway calls.
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// Options for a single object upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    pub content_type: String,
    /// `Cache-Control: max-age` in seconds.
    pub cache_control: u32,
    /// Replace an existing object with the same key instead of failing.
    pub upsert: bool,
}

#[async_trait]
pub trait AuthApi: Send + Sync {
    /// The authenticated actor, or `None` when signed out.
    async fn current_user(&self) -> GatewayResult<Option<User>>;

    async fn session(&self) -> GatewayResult<Option<Session>>;
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn insert_collection(&self, row: &NewCollection) -> GatewayResult<Collection>;

    /// Collections owned by `user_id`, newest first, with image counts.
    async fn collections_by_owner(&self, user_id: &str) -> GatewayResult<Vec<CollectionSummary>>;

    /// One collection by slug with its images (in store order). With
    /// `public_only`, private collections do not match.
    async fn collection_by_slug(
        &self,
        slug: &str,
        public_only: bool,
    ) -> GatewayResult<Option<CollectionWithImages>>;

    /// Apply `patch` and return the updated row, or `None` if no row matched.
    async fn update_collection(
        &self,
        id: &str,
        patch: &CollectionPatch,
    ) -> GatewayResult<Option<Collection>>;

    /// Delete a collection row; the store cascades its image rows.
    /// Deleting a missing row is not an error.
    async fn delete_collection(&self, id: &str) -> GatewayResult<()>;

    /// Storage keys of every image in a collection.
    async fn image_paths(&self, collection_id: &str) -> GatewayResult<Vec<String>>;

    async fn insert_image(&self, row: &NewImage) -> GatewayResult<Image>;

    async fn image(&self, id: &str) -> GatewayResult<Option<Image>>;

    async fn delete_image(&self, id: &str) -> GatewayResult<()>;
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under `key`; returns the key the store recorded.
    async fn upload(&self, key: &str, bytes: Vec<u8>, options: &UploadOptions)
    -> GatewayResult<String>;

    /// Remove objects in one batch. Returns the keys actually removed; keys
    /// that did not exist are absent from the result.
    async fn remove(&self, keys: &[String]) -> GatewayResult<Vec<String>>;

    /// Public address of an object. Pure derivation, no request.
    fn public_url(&self, key: &str) -> String;
}

/// A backend offering all three services.
pub trait Gateway: AuthApi + RecordStore + ObjectStore {}

impl<T: AuthApi + RecordStore + ObjectStore + ?Sized> Gateway for T {}
