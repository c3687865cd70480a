//! HTTP gateway for a Supabase-compatible deployment.
//!
//! | Service | Endpoint |
//! |---|---|
//! | Auth | `GET /auth/v1/user` |
//! | Rows | `/rest/v1/collections`, `/rest/v1/images` (PostgREST filters) |
//! | Objects | `POST /storage/v1/object/{bucket}/{key}`, `DELETE /storage/v1/object/{bucket}` |
//! | Public URL | `{url}/storage/v1/object/public/{bucket}/{key}` |
//!
//! Requests carry the anon key as `apikey` and the user's access token (or
//! the anon key when signed out) as the bearer token. No retries; a failed
//! request surfaces as a [`GatewayError`].

use super::{AuthApi, GatewayError, GatewayResult, ObjectStore, RecordStore, UploadOptions};
use crate::config::BackendConfig;
use crate::types::{
    Collection, CollectionPatch, CollectionSummary, CollectionWithImages, Image, NewCollection,
    NewImage, Session, User,
};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

const IMAGE_PROJECTION: &str = "*,images(id,file_path,file_name,title,description,sort_order)";

/// Public address of an object in a public bucket.
pub fn public_object_url(base_url: &str, bucket: &str, key: &str) -> String {
    format!(
        "{}/storage/v1/object/public/{bucket}/{}",
        base_url.trim_end_matches('/'),
        key.trim_start_matches('/')
    )
}

/// Error body shapes returned by PostgREST, GoTrue and Storage.
#[derive(Deserialize, Default)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
    msg: Option<String>,
    code: Option<serde_json::Value>,
    #[serde(rename = "statusCode")]
    status_code: Option<serde_json::Value>,
}

impl ErrorBody {
    fn is_conflict(&self) -> bool {
        let is = |v: &Option<serde_json::Value>, want: &str| match v {
            Some(serde_json::Value::String(s)) => s == want,
            Some(serde_json::Value::Number(n)) => n.to_string() == want,
            _ => false,
        };
        // 23505 = unique_violation
        is(&self.code, "23505") || is(&self.status_code, "409")
    }
}

#[derive(Deserialize)]
struct CountedRow {
    #[serde(flatten)]
    collection: Collection,
    #[serde(default)]
    images: Vec<CountRow>,
}

#[derive(Deserialize)]
struct CountRow {
    count: u64,
}

#[derive(Deserialize)]
struct PathRow {
    file_path: String,
}

#[derive(Deserialize)]
struct RemovedObject {
    name: String,
}

/// Turn a non-2xx response into a [`GatewayError`].
async fn check(response: Response) -> GatewayResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();
    let message = body
        .message
        .clone()
        .or_else(|| body.msg.clone())
        .or_else(|| body.error.clone())
        .unwrap_or_else(|| {
            if text.is_empty() {
                status.to_string()
            } else {
                text.clone()
            }
        });

    debug!(%status, message = %message, "backend request failed");
    if status == StatusCode::CONFLICT || body.is_conflict() {
        Err(GatewayError::Conflict(message))
    } else {
        Err(GatewayError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

/// Gateway backed by the hosted REST APIs.
pub struct RestGateway {
    client: Client,
    base_url: String,
    anon_key: String,
    access_token: Option<String>,
    bucket: String,
}

impl RestGateway {
    pub fn new(config: &BackendConfig) -> GatewayResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("folio/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
            access_token: config.access_token.clone().filter(|t| !t.is_empty()),
            bucket: config.bucket.clone(),
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let bearer = self.access_token.as_deref().unwrap_or(&self.anon_key);
        self.client
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
    }

    fn table(&self, method: Method, table: &str) -> RequestBuilder {
        let url = format!("{}/rest/v1/{table}", self.base_url);
        self.request(method, &url)
    }

    fn object_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url,
            self.bucket,
            key.trim_start_matches('/')
        )
    }

    async fn send(&self, builder: RequestBuilder) -> GatewayResult<String> {
        let response = check(builder.send().await?).await?;
        Ok(response.text().await?)
    }

    async fn rows<T: DeserializeOwned>(&self, builder: RequestBuilder) -> GatewayResult<Vec<T>> {
        let text = self.send(builder).await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn single<T: DeserializeOwned>(&self, builder: RequestBuilder) -> GatewayResult<T> {
        self.rows(builder)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::Api {
                status: 200,
                message: "write returned no row".to_string(),
            })
    }
}

#[async_trait]
impl AuthApi for RestGateway {
    async fn current_user(&self) -> GatewayResult<Option<User>> {
        if self.access_token.is_none() {
            return Ok(None);
        }
        let url = format!("{}/auth/v1/user", self.base_url);
        let response = self.request(Method::GET, &url).send().await?;
        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            return Ok(None);
        }
        let text = check(response).await?.text().await?;
        Ok(Some(serde_json::from_str(&text)?))
    }

    async fn session(&self) -> GatewayResult<Option<Session>> {
        Ok(self.access_token.clone().map(|access_token| Session {
            access_token,
            user: None,
        }))
    }
}

#[async_trait]
impl RecordStore for RestGateway {
    async fn insert_collection(&self, row: &NewCollection) -> GatewayResult<Collection> {
        self.single(
            self.table(Method::POST, "collections")
                .header("Prefer", "return=representation")
                .json(row),
        )
        .await
    }

    async fn collections_by_owner(&self, user_id: &str) -> GatewayResult<Vec<CollectionSummary>> {
        let rows: Vec<CountedRow> = self
            .rows(self.table(Method::GET, "collections").query(&[
                ("select", "*,images(count)".to_string()),
                ("user_id", format!("eq.{user_id}")),
                ("order", "created_at.desc".to_string()),
            ]))
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| CollectionSummary {
                image_count: row.images.first().map_or(0, |c| c.count),
                collection: row.collection,
            })
            .collect())
    }

    async fn collection_by_slug(
        &self,
        slug: &str,
        public_only: bool,
    ) -> GatewayResult<Option<CollectionWithImages>> {
        let mut query = vec![
            ("select", IMAGE_PROJECTION.to_string()),
            ("slug", format!("eq.{slug}")),
        ];
        if public_only {
            query.push(("is_public", "eq.true".to_string()));
        }
        let rows: Vec<CollectionWithImages> = self
            .rows(self.table(Method::GET, "collections").query(&query))
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn update_collection(
        &self,
        id: &str,
        patch: &CollectionPatch,
    ) -> GatewayResult<Option<Collection>> {
        let rows: Vec<Collection> = self
            .rows(
                self.table(Method::PATCH, "collections")
                    .query(&[("id", format!("eq.{id}"))])
                    .header("Prefer", "return=representation")
                    .json(patch),
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn delete_collection(&self, id: &str) -> GatewayResult<()> {
        self.send(
            self.table(Method::DELETE, "collections")
                .query(&[("id", format!("eq.{id}"))]),
        )
        .await?;
        Ok(())
    }

    async fn image_paths(&self, collection_id: &str) -> GatewayResult<Vec<String>> {
        let rows: Vec<PathRow> = self
            .rows(self.table(Method::GET, "images").query(&[
                ("select", "file_path".to_string()),
                ("collection_id", format!("eq.{collection_id}")),
            ]))
            .await?;
        Ok(rows.into_iter().map(|r| r.file_path).collect())
    }

    async fn insert_image(&self, row: &NewImage) -> GatewayResult<Image> {
        self.single(
            self.table(Method::POST, "images")
                .header("Prefer", "return=representation")
                .json(row),
        )
        .await
    }

    async fn image(&self, id: &str) -> GatewayResult<Option<Image>> {
        let rows: Vec<Image> = self
            .rows(self.table(Method::GET, "images").query(&[
                ("select", "*".to_string()),
                ("id", format!("eq.{id}")),
            ]))
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn delete_image(&self, id: &str) -> GatewayResult<()> {
        self.send(
            self.table(Method::DELETE, "images")
                .query(&[("id", format!("eq.{id}"))]),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for RestGateway {
    async fn upload(
        &self,
        key: &str,
        bytes: Vec<u8>,
        options: &UploadOptions,
    ) -> GatewayResult<String> {
        debug!(key, size = bytes.len(), upsert = options.upsert, "uploading object");
        let builder = self
            .request(Method::POST, &self.object_url(key))
            .header("Content-Type", &options.content_type)
            .header("Cache-Control", format!("max-age={}", options.cache_control))
            .header("x-upsert", options.upsert.to_string())
            .body(bytes);
        self.send(builder).await?;
        Ok(key.to_string())
    }

    async fn remove(&self, keys: &[String]) -> GatewayResult<Vec<String>> {
        let url = format!("{}/storage/v1/object/{}", self.base_url, self.bucket);
        let removed: Vec<RemovedObject> = self
            .rows(
                self.request(Method::DELETE, &url)
                    .json(&serde_json::json!({ "prefixes": keys })),
            )
            .await?;
        Ok(removed.into_iter().map(|o| o.name).collect())
    }

    fn public_url(&self, key: &str) -> String {
        public_object_url(&self.base_url, &self.bucket, key)
    }
}
