//! Row types shared between the operations and the gateway.
//!
//! Field names follow the backing tables (`collections`, `images`) so the
//! same structs serialize straight into request bodies and out of responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An authenticated actor as reported by the auth service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// An active auth session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub user: Option<User>,
}

/// A named, ordered group of images owned by one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub id: String,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    pub is_public: bool,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a collection. `id` and timestamps are assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewCollection {
    pub title: String,
    pub slug: String,
    pub description: String,
    pub is_public: bool,
    pub user_id: String,
}

/// Partial update for a collection. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
}

impl CollectionUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.is_public.is_none()
    }
}

/// [`CollectionUpdate`] plus the `updated_at` stamp, as sent to the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionPatch {
    #[serde(flatten)]
    pub changes: CollectionUpdate,
    pub updated_at: DateTime<Utc>,
}

/// A collection annotated with how many images it holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSummary {
    #[serde(flatten)]
    pub collection: Collection,
    pub image_count: u64,
}

/// A collection with its images, sorted by `sort_order` ascending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionWithImages {
    #[serde(flatten)]
    pub collection: Collection,
    #[serde(default)]
    pub images: Vec<ImageEntry>,
}

/// A stored image's metadata row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub id: String,
    pub collection_id: String,
    pub file_path: String,
    pub file_name: String,
    pub file_size: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
}

/// Insert payload for an image row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewImage {
    pub collection_id: String,
    pub file_path: String,
    pub file_name: String,
    pub file_size: u64,
    pub title: String,
    pub sort_order: i32,
}

/// The image projection embedded in a [`CollectionWithImages`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageEntry {
    pub id: String,
    pub file_path: String,
    pub file_name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
}

impl From<&Image> for ImageEntry {
    fn from(image: &Image) -> Self {
        Self {
            id: image.id.clone(),
            file_path: image.file_path.clone(),
            file_name: image.file_name.clone(),
            title: image.title.clone(),
            description: image.description.clone(),
            sort_order: image.sort_order,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_parses_store_row() {
        let json = r#"{
            "id": "7c6e",
            "title": "Trip",
            "slug": "trip-abc123",
            "description": null,
            "is_public": true,
            "user_id": "u1",
            "created_at": "2024-05-01T10:00:00.123456+00:00",
            "updated_at": "2024-05-01T10:00:00+00:00"
        }"#;
        let c: Collection = serde_json::from_str(json).unwrap();
        assert_eq!(c.slug, "trip-abc123");
        assert_eq!(c.description, None);
        assert!(c.is_public);
    }

    #[test]
    fn update_skips_unset_fields() {
        let update = CollectionUpdate {
            title: Some("New".into()),
            ..Default::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({ "title": "New" }));
    }

    #[test]
    fn patch_carries_timestamp() {
        let patch = CollectionPatch {
            changes: CollectionUpdate {
                is_public: Some(false),
                ..Default::default()
            },
            updated_at: "2024-01-02T03:04:05Z".parse().unwrap(),
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json["is_public"], false);
        assert_eq!(json["updated_at"], "2024-01-02T03:04:05Z");
        assert!(json.get("title").is_none());
    }

    #[test]
    fn empty_update_detected() {
        assert!(CollectionUpdate::default().is_empty());
        assert!(
            !CollectionUpdate {
                description: Some(String::new()),
                ..Default::default()
            }
            .is_empty()
        );
    }

    #[test]
    fn summary_flattens_collection() {
        let json = r#"{
            "id": "1", "title": "T", "slug": "t-000000", "is_public": false,
            "user_id": "u", "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z", "image_count": 4
        }"#;
        let s: CollectionSummary = serde_json::from_str(json).unwrap();
        assert_eq!(s.image_count, 4);
        assert_eq!(s.collection.title, "T");
    }
}
