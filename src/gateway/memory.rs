//! In-process gateway: tables, objects and a signed-in user held in memory.
//!
//! Behaves like the hosted backend for everything the operations rely on:
//! unique slugs, cascading image rows on collection delete, no-overwrite
//! uploads, and batch removes that silently skip missing keys. Every call
//! is recorded, and any [`Op`] can be made to fail on demand.

use super::{AuthApi, GatewayError, GatewayResult, ObjectStore, RecordStore, UploadOptions};
use crate::gateway::rest::public_object_url;
use crate::types::{
    Collection, CollectionPatch, CollectionSummary, CollectionWithImages, Image, ImageEntry,
    NewCollection, NewImage, Session, User,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

const BASE_URL: &str = "http://localhost:54321";
const BUCKET: &str = "portfolio-images";

/// Gateway operation, used to inject failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    CurrentUser,
    Session,
    InsertCollection,
    CollectionsByOwner,
    CollectionBySlug,
    UpdateCollection,
    DeleteCollection,
    ImagePaths,
    InsertImage,
    Image,
    DeleteImage,
    Upload,
    Remove,
}

/// A gateway call as observed by [`MemoryGateway`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    CurrentUser,
    Session,
    InsertCollection { slug: String },
    CollectionsByOwner(String),
    CollectionBySlug { slug: String, public_only: bool },
    UpdateCollection(String),
    DeleteCollection(String),
    ImagePaths(String),
    InsertImage { file_path: String },
    Image(String),
    DeleteImage(String),
    Upload {
        key: String,
        size: usize,
        content_type: String,
        upsert: bool,
    },
    Remove(Vec<String>),
}

impl RecordedCall {
    pub fn op(&self) -> Op {
        match self {
            RecordedCall::CurrentUser => Op::CurrentUser,
            RecordedCall::Session => Op::Session,
            RecordedCall::InsertCollection { .. } => Op::InsertCollection,
            RecordedCall::CollectionsByOwner(_) => Op::CollectionsByOwner,
            RecordedCall::CollectionBySlug { .. } => Op::CollectionBySlug,
            RecordedCall::UpdateCollection(_) => Op::UpdateCollection,
            RecordedCall::DeleteCollection(_) => Op::DeleteCollection,
            RecordedCall::ImagePaths(_) => Op::ImagePaths,
            RecordedCall::InsertImage { .. } => Op::InsertImage,
            RecordedCall::Image(_) => Op::Image,
            RecordedCall::DeleteImage(_) => Op::DeleteImage,
            RecordedCall::Upload { .. } => Op::Upload,
            RecordedCall::Remove(_) => Op::Remove,
        }
    }
}

/// An object held by [`MemoryGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub cache_control: u32,
}

#[derive(Default)]
struct State {
    user: Option<User>,
    collections: Vec<Collection>,
    images: Vec<Image>,
    objects: BTreeMap<String, StoredObject>,
    failures: HashSet<Op>,
    calls: Vec<RecordedCall>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl State {
    /// Record the call, then fail it if its op was marked to fail.
    fn begin(&mut self, call: RecordedCall) -> GatewayResult<()> {
        let op = call.op();
        self.calls.push(call);
        if self.failures.contains(&op) {
            return Err(GatewayError::Api {
                status: 503,
                message: format!("injected failure: {op:?}"),
            });
        }
        Ok(())
    }

    /// Strictly increasing timestamps so "newest first" is well defined.
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let mut now = Utc::now();
        if let Some(last) = self.last_timestamp
            && now <= last
        {
            now = last + Duration::microseconds(1);
        }
        self.last_timestamp = Some(now);
        now
    }
}

/// In-memory [`Gateway`](super::Gateway) for tests and offline runs.
#[derive(Default)]
pub struct MemoryGateway {
    state: Mutex<State>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// A gateway with `user_id` already signed in.
    pub fn signed_in(user_id: &str) -> Self {
        let gateway = Self::new();
        gateway.sign_in(User {
            id: user_id.to_string(),
            email: None,
        });
        gateway
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn sign_in(&self, user: User) {
        self.state().user = Some(user);
    }

    pub fn sign_out(&self) {
        self.state().user = None;
    }

    /// Make every subsequent call of `op` fail with a 503.
    pub fn fail(&self, op: Op) {
        self.state().failures.insert(op);
    }

    pub fn recover(&self, op: Op) {
        self.state().failures.remove(&op);
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    pub fn collections(&self) -> Vec<Collection> {
        self.state().collections.clone()
    }

    pub fn images(&self) -> Vec<Image> {
        self.state().images.clone()
    }

    pub fn object_keys(&self) -> Vec<String> {
        self.state().objects.keys().cloned().collect()
    }

    pub fn object(&self, key: &str) -> Option<StoredObject> {
        self.state().objects.get(key).cloned()
    }

    /// Put an object directly, bypassing call recording and failures.
    pub fn put_object(&self, key: &str, bytes: Vec<u8>, content_type: &str) {
        self.state().objects.insert(
            key.to_string(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
                cache_control: 0,
            },
        );
    }

    /// Drop an object directly, bypassing call recording and failures.
    pub fn drop_object(&self, key: &str) -> bool {
        self.state().objects.remove(key).is_some()
    }

    /// Insert an image row (and its object) directly, bypassing call
    /// recording and failures.
    pub fn seed_image(&self, collection_id: &str, file_name: &str, sort_order: i32) -> Image {
        let mut state = self.state();
        let id = Uuid::new_v4().to_string();
        let file_path = format!("collections/{collection_id}/{id}-{file_name}");
        let image = Image {
            id,
            collection_id: collection_id.to_string(),
            file_path: file_path.clone(),
            file_name: file_name.to_string(),
            file_size: 3,
            title: Some(crate::naming::default_title(file_name)),
            description: None,
            sort_order,
        };
        state.images.push(image.clone());
        state.objects.insert(
            file_path,
            StoredObject {
                bytes: vec![1, 2, 3],
                content_type: "image/jpeg".to_string(),
                cache_control: 0,
            },
        );
        image
    }
}

#[async_trait]
impl AuthApi for MemoryGateway {
    async fn current_user(&self) -> GatewayResult<Option<User>> {
        let mut state = self.state();
        state.begin(RecordedCall::CurrentUser)?;
        Ok(state.user.clone())
    }

    async fn session(&self) -> GatewayResult<Option<Session>> {
        let mut state = self.state();
        state.begin(RecordedCall::Session)?;
        Ok(state.user.clone().map(|user| Session {
            access_token: format!("memory-token-{}", user.id),
            user: Some(user),
        }))
    }
}

#[async_trait]
impl RecordStore for MemoryGateway {
    async fn insert_collection(&self, row: &NewCollection) -> GatewayResult<Collection> {
        let mut state = self.state();
        state.begin(RecordedCall::InsertCollection {
            slug: row.slug.clone(),
        })?;
        if state.collections.iter().any(|c| c.slug == row.slug) {
            return Err(GatewayError::Conflict(
                "duplicate key value violates unique constraint \"collections_slug_key\""
                    .to_string(),
            ));
        }
        let now = state.next_timestamp();
        let collection = Collection {
            id: Uuid::new_v4().to_string(),
            title: row.title.clone(),
            slug: row.slug.clone(),
            description: Some(row.description.clone()),
            is_public: row.is_public,
            user_id: row.user_id.clone(),
            created_at: now,
            updated_at: now,
        };
        state.collections.push(collection.clone());
        Ok(collection)
    }

    async fn collections_by_owner(&self, user_id: &str) -> GatewayResult<Vec<CollectionSummary>> {
        let mut state = self.state();
        state.begin(RecordedCall::CollectionsByOwner(user_id.to_string()))?;
        let mut summaries: Vec<CollectionSummary> = state
            .collections
            .iter()
            .filter(|c| c.user_id == user_id)
            .map(|c| CollectionSummary {
                collection: c.clone(),
                image_count: state
                    .images
                    .iter()
                    .filter(|i| i.collection_id == c.id)
                    .count() as u64,
            })
            .collect();
        summaries.sort_by(|a, b| b.collection.created_at.cmp(&a.collection.created_at));
        Ok(summaries)
    }

    async fn collection_by_slug(
        &self,
        slug: &str,
        public_only: bool,
    ) -> GatewayResult<Option<CollectionWithImages>> {
        let mut state = self.state();
        state.begin(RecordedCall::CollectionBySlug {
            slug: slug.to_string(),
            public_only,
        })?;
        let found = state
            .collections
            .iter()
            .find(|c| c.slug == slug && (c.is_public || !public_only))
            .map(|c| CollectionWithImages {
                collection: c.clone(),
                images: state
                    .images
                    .iter()
                    .filter(|i| i.collection_id == c.id)
                    .map(ImageEntry::from)
                    .collect(),
            });
        Ok(found)
    }

    async fn update_collection(
        &self,
        id: &str,
        patch: &CollectionPatch,
    ) -> GatewayResult<Option<Collection>> {
        let mut state = self.state();
        state.begin(RecordedCall::UpdateCollection(id.to_string()))?;
        let Some(collection) = state.collections.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        if let Some(title) = &patch.changes.title {
            collection.title = title.clone();
        }
        if let Some(description) = &patch.changes.description {
            collection.description = Some(description.clone());
        }
        if let Some(is_public) = patch.changes.is_public {
            collection.is_public = is_public;
        }
        collection.updated_at = patch.updated_at;
        Ok(Some(collection.clone()))
    }

    async fn delete_collection(&self, id: &str) -> GatewayResult<()> {
        let mut state = self.state();
        state.begin(RecordedCall::DeleteCollection(id.to_string()))?;
        state.collections.retain(|c| c.id != id);
        // ON DELETE CASCADE
        state.images.retain(|i| i.collection_id != id);
        Ok(())
    }

    async fn image_paths(&self, collection_id: &str) -> GatewayResult<Vec<String>> {
        let mut state = self.state();
        state.begin(RecordedCall::ImagePaths(collection_id.to_string()))?;
        Ok(state
            .images
            .iter()
            .filter(|i| i.collection_id == collection_id)
            .map(|i| i.file_path.clone())
            .collect())
    }

    async fn insert_image(&self, row: &NewImage) -> GatewayResult<Image> {
        let mut state = self.state();
        state.begin(RecordedCall::InsertImage {
            file_path: row.file_path.clone(),
        })?;
        if !state.collections.iter().any(|c| c.id == row.collection_id) {
            return Err(GatewayError::Api {
                status: 409,
                message: "insert or update on table \"images\" violates foreign key constraint \
                          \"images_collection_id_fkey\""
                    .to_string(),
            });
        }
        let image = Image {
            id: Uuid::new_v4().to_string(),
            collection_id: row.collection_id.clone(),
            file_path: row.file_path.clone(),
            file_name: row.file_name.clone(),
            file_size: row.file_size,
            title: Some(row.title.clone()),
            description: None,
            sort_order: row.sort_order,
        };
        state.images.push(image.clone());
        Ok(image)
    }

    async fn image(&self, id: &str) -> GatewayResult<Option<Image>> {
        let mut state = self.state();
        state.begin(RecordedCall::Image(id.to_string()))?;
        Ok(state.images.iter().find(|i| i.id == id).cloned())
    }

    async fn delete_image(&self, id: &str) -> GatewayResult<()> {
        let mut state = self.state();
        state.begin(RecordedCall::DeleteImage(id.to_string()))?;
        state.images.retain(|i| i.id != id);
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for MemoryGateway {
    async fn upload(
        &self,
        key: &str,
        bytes: Vec<u8>,
        options: &UploadOptions,
    ) -> GatewayResult<String> {
        let mut state = self.state();
        state.begin(RecordedCall::Upload {
            key: key.to_string(),
            size: bytes.len(),
            content_type: options.content_type.clone(),
            upsert: options.upsert,
        })?;
        if !options.upsert && state.objects.contains_key(key) {
            return Err(GatewayError::Conflict(format!(
                "The resource already exists: {key}"
            )));
        }
        state.objects.insert(
            key.to_string(),
            StoredObject {
                bytes,
                content_type: options.content_type.clone(),
                cache_control: options.cache_control,
            },
        );
        Ok(key.to_string())
    }

    async fn remove(&self, keys: &[String]) -> GatewayResult<Vec<String>> {
        let mut state = self.state();
        state.begin(RecordedCall::Remove(keys.to_vec()))?;
        Ok(keys
            .iter()
            .filter(|key| state.objects.remove(key.as_str()).is_some())
            .cloned()
            .collect())
    }

    fn public_url(&self, key: &str) -> String {
        public_object_url(BASE_URL, BUCKET, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_collection(slug: &str, user: &str) -> NewCollection {
        NewCollection {
            title: "T".into(),
            slug: slug.into(),
            description: String::new(),
            is_public: true,
            user_id: user.into(),
        }
    }

    fn options() -> UploadOptions {
        UploadOptions {
            content_type: "image/png".into(),
            cache_control: 3600,
            upsert: false,
        }
    }

    #[tokio::test]
    async fn duplicate_slug_is_conflict() {
        let gw = MemoryGateway::new();
        gw.insert_collection(&new_collection("a-1", "u")).await.unwrap();
        let err = gw
            .insert_collection(&new_collection("a-1", "u"))
            .await
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn listing_is_newest_first() {
        let gw = MemoryGateway::new();
        for slug in ["first", "second", "third"] {
            gw.insert_collection(&new_collection(slug, "u")).await.unwrap();
        }
        gw.insert_collection(&new_collection("other", "v")).await.unwrap();

        let slugs: Vec<String> = gw
            .collections_by_owner("u")
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.collection.slug)
            .collect();
        assert_eq!(slugs, vec!["third", "second", "first"]);
    }

    #[tokio::test]
    async fn delete_collection_cascades_rows_not_objects() {
        let gw = MemoryGateway::new();
        let c = gw.insert_collection(&new_collection("c", "u")).await.unwrap();
        let img = gw.seed_image(&c.id, "a.jpg", 0);

        gw.delete_collection(&c.id).await.unwrap();
        assert!(gw.images().is_empty());
        assert!(gw.object(&img.file_path).is_some());
    }

    #[tokio::test]
    async fn upload_without_upsert_rejects_existing_key() {
        let gw = MemoryGateway::new();
        gw.upload("k", vec![1], &options()).await.unwrap();
        let err = gw.upload("k", vec![2], &options()).await.unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(gw.object("k").unwrap().bytes, vec![1]);
    }

    #[tokio::test]
    async fn remove_reports_only_existing_keys() {
        let gw = MemoryGateway::new();
        gw.put_object("a", vec![1], "image/png");
        let removed = gw
            .remove(&["a".to_string(), "missing".to_string()])
            .await
            .unwrap();
        assert_eq!(removed, vec!["a".to_string()]);
        assert!(gw.object_keys().is_empty());
    }

    #[tokio::test]
    async fn injected_failure_is_recorded_then_fails() {
        let gw = MemoryGateway::new();
        gw.fail(Op::CurrentUser);
        assert!(gw.current_user().await.is_err());
        assert_eq!(gw.calls(), vec![RecordedCall::CurrentUser]);

        gw.recover(Op::CurrentUser);
        assert_eq!(gw.current_user().await.unwrap(), None);
    }

    #[tokio::test]
    async fn session_follows_sign_in() {
        let gw = MemoryGateway::signed_in("u1");
        let session = gw.session().await.unwrap().unwrap();
        assert_eq!(session.user.unwrap().id, "u1");

        gw.sign_out();
        assert!(gw.session().await.unwrap().is_none());
    }

    #[test]
    fn public_url_is_derived() {
        let gw = MemoryGateway::new();
        assert_eq!(
            gw.public_url("collections/c/1-a.jpg"),
            "http://localhost:54321/storage/v1/object/public/portfolio-images/collections/c/1-a.jpg"
        );
    }
}
