//! Collection operations: create, list, fetch by slug, update, delete.
//!
//! Each operation is a short, strictly sequential run of gateway calls; no
//! step is retried and nothing is held between calls.
//!
//! ## Deletion
//!
//! [`delete_collection`] removes the collection's stored objects in one
//! batch, then deletes the row and lets the store cascade the image rows.
//! It is safe to run again after a partial failure:
//!
//! - objects that are already gone count as removed (reported, not fatal);
//! - any other storage failure stops before the row is touched, so the next
//!   attempt lists the same images again;
//! - deleting a row that no longer exists succeeds.

use crate::auth::require_user;
use crate::error::{FolioError, Result, StoreContext};
use crate::gateway::{Gateway, RecordStore};
use crate::naming::slugify;
use crate::types::{
    Collection, CollectionPatch, CollectionSummary, CollectionUpdate, CollectionWithImages,
    NewCollection,
};
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, error, info, warn};

/// What to create. Collections are public with an empty description
/// unless told otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionDraft {
    pub title: String,
    pub description: String,
    pub is_public: bool,
}

impl CollectionDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            is_public: true,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn public(mut self, is_public: bool) -> Self {
        self.is_public = is_public;
        self
    }
}

/// Result of [`delete_collection`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CollectionDeletion {
    /// Storage keys removed by this call.
    pub removed: Vec<String>,
    /// Storage keys that were listed but no longer existed.
    pub already_missing: Vec<String>,
}

fn require_arg(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(FolioError::InvalidInput(format!("{name} is required")));
    }
    Ok(())
}

/// Create a collection owned by the signed-in user.
///
/// The slug is derived from the title; a slug collision surfaces as a store
/// error for which [`FolioError::is_conflict`] is true.
pub async fn create_collection<G: Gateway + ?Sized>(
    gateway: &G,
    draft: &CollectionDraft,
) -> Result<Collection> {
    let user = require_user(gateway).await?;

    let row = NewCollection {
        title: draft.title.clone(),
        slug: slugify(&draft.title),
        description: draft.description.clone(),
        is_public: draft.is_public,
        user_id: user.id,
    };
    debug!(slug = %row.slug, "inserting collection");

    let collection = gateway
        .insert_collection(&row)
        .await
        .context("creating collection")?;
    info!(id = %collection.id, slug = %collection.slug, "collection created");
    Ok(collection)
}

/// All collections owned by `user_id`, newest first, with image counts.
pub async fn list_collections<G: RecordStore + ?Sized>(
    gateway: &G,
    user_id: &str,
) -> Result<Vec<CollectionSummary>> {
    require_arg("user id", user_id)?;

    gateway
        .collections_by_owner(user_id)
        .await
        .context("fetching collections")
        .inspect_err(|e| error!(user_id, "listing collections failed: {e}"))
}

/// One collection by slug, with its images sorted by `sort_order`.
///
/// Unless `include_private` is set, a private collection is reported as
/// not found.
pub async fn get_collection_by_slug<G: RecordStore + ?Sized>(
    gateway: &G,
    slug: &str,
    include_private: bool,
) -> Result<CollectionWithImages> {
    require_arg("slug", slug)?;

    let found = gateway
        .collection_by_slug(slug, !include_private)
        .await
        .context("fetching collection")
        .inspect_err(|e| error!(slug, "fetching collection failed: {e}"))?;

    let Some(mut collection) = found else {
        return Err(FolioError::NotFound(format!("collection with slug \"{slug}\"")));
    };
    collection.images.sort_by_key(|image| image.sort_order);
    Ok(collection)
}

/// Apply a partial update and stamp `updated_at`.
pub async fn update_collection<G: RecordStore + ?Sized>(
    gateway: &G,
    id: &str,
    update: CollectionUpdate,
) -> Result<Collection> {
    require_arg("collection id", id)?;
    if update.is_empty() {
        debug!(id, "no fields given, only touching updated_at");
    }

    let patch = CollectionPatch {
        changes: update,
        updated_at: Utc::now(),
    };
    match gateway
        .update_collection(id, &patch)
        .await
        .context("updating collection")?
    {
        Some(collection) => {
            info!(id, "collection updated");
            Ok(collection)
        }
        None => Err(FolioError::NotFound(format!("collection {id}"))),
    }
}

/// Delete a collection, its stored objects and (by cascade) its image rows.
///
/// See the [module docs](self) for the retry behaviour.
pub async fn delete_collection<G: Gateway + ?Sized>(
    gateway: &G,
    id: &str,
) -> Result<CollectionDeletion> {
    require_arg("collection id", id)?;

    let paths = gateway
        .image_paths(id)
        .await
        .context("listing collection images")?;

    let mut outcome = CollectionDeletion::default();
    if !paths.is_empty() {
        debug!(id, count = paths.len(), "removing stored objects");
        let removed = gateway
            .remove(&paths)
            .await
            .context("deleting images from storage")
            .inspect_err(|e| error!(id, "object removal failed, collection kept: {e}"))?;
        outcome.already_missing = paths
            .iter()
            .filter(|p| !removed.contains(p))
            .cloned()
            .collect();
        outcome.removed = removed;
        if !outcome.already_missing.is_empty() {
            warn!(
                id,
                missing = ?outcome.already_missing,
                "some objects were already gone from storage"
            );
        }
    }

    gateway
        .delete_collection(id)
        .await
        .context("deleting collection")?;
    info!(id, removed = outcome.removed.len(), "collection deleted");
    Ok(outcome)
}
