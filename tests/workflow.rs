//! End-to-end run through the public API against the in-memory gateway.
//!
//! Creates a collection, uploads real encoded images through the pure-Rust
//! backend, reads everything back, and tears it all down again, checking
//! the store and object state at each step.
//!
//! Run with: cargo test --test workflow

use folio::collections::{
    CollectionDraft, create_collection, delete_collection, get_collection_by_slug,
    list_collections, update_collection,
};
use folio::config::UploadConfig;
use folio::error::ErrorKind;
use folio::gateway::MemoryGateway;
use folio::images::{UploadFile, delete_image, image_url, upload_image};
use folio::imaging::RustBackend;
use folio::types::CollectionUpdate;
use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

const OWNER: &str = "owner-7";

fn encoded(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 128]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

#[tokio::test]
async fn collection_lifecycle() {
    let gw = MemoryGateway::signed_in(OWNER);
    let backend = RustBackend::new();
    let config = UploadConfig {
        max_dimension: 200,
        ..UploadConfig::default()
    };

    // Create
    let draft = CollectionDraft::new("Summer in Lisbon!").description("Tiles and trams");
    let collection = create_collection(&gw, &draft).await.unwrap();
    assert!(collection.slug.starts_with("summer-in-lisbon-"));
    assert_eq!(collection.user_id, OWNER);
    assert!(collection.is_public);

    // Upload: one oversized PNG, one small JPEG without an extension
    let wide = UploadFile::new("Tram 28.png", "image/png", encoded(400, 300, ImageFormat::Png));
    let small = UploadFile::new("tiles", "image/jpeg", encoded(120, 90, ImageFormat::Jpeg));

    let first = upload_image(&gw, &backend, &wide, &collection.id, &config)
        .await
        .unwrap();
    assert_eq!((first.width, first.height), (200, 150));
    assert!(first.resized);
    assert!(first.file_path.ends_with(".png"));
    assert_eq!(first.image.title.as_deref(), Some("Tram 28"));

    let second = upload_image(&gw, &backend, &small, &collection.id, &config)
        .await
        .unwrap();
    assert_eq!((second.width, second.height), (120, 90));
    assert!(!second.resized);
    assert!(second.file_path.ends_with(".jpg"));
    assert_eq!(gw.object_keys().len(), 2);

    // Stored bytes decode to the reported size
    let stored = gw.object(&first.file_path).unwrap();
    let decoded = image::load_from_memory(&stored.bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (200, 150));

    // List
    let listed = list_collections(&gw, OWNER).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].image_count, 2);

    // Show
    let detail = get_collection_by_slug(&gw, &collection.slug, false)
        .await
        .unwrap();
    assert_eq!(detail.images.len(), 2);
    let url = image_url(&gw, &detail.images[0].file_path).unwrap();
    assert!(url.contains("/storage/v1/object/public/portfolio-images/collections/"));

    // Make private: hidden from public lookup, visible to the owner
    update_collection(
        &gw,
        &collection.id,
        CollectionUpdate {
            is_public: Some(false),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    let hidden = get_collection_by_slug(&gw, &collection.slug, false)
        .await
        .unwrap_err();
    assert_eq!(hidden.kind(), ErrorKind::NotFound);
    assert!(get_collection_by_slug(&gw, &collection.slug, true).await.is_ok());

    // Delete one image, then the collection
    delete_image(&gw, &second.image.id).await.unwrap();
    assert_eq!(gw.object_keys(), vec![first.file_path.clone()]);

    let deletion = delete_collection(&gw, &collection.id).await.unwrap();
    assert_eq!(deletion.removed, vec![first.file_path]);
    assert!(gw.collections().is_empty());
    assert!(gw.images().is_empty());
    assert!(gw.object_keys().is_empty());
}

#[tokio::test]
async fn signed_out_caller_cannot_create() {
    let gw = MemoryGateway::new();
    let err = create_collection(&gw, &CollectionDraft::new("Nope"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthenticated);
    assert!(gw.collections().is_empty());
}

#[tokio::test]
async fn same_title_twice_gets_distinct_slugs() {
    let gw = MemoryGateway::signed_in(OWNER);
    let a = create_collection(&gw, &CollectionDraft::new("Portraits"))
        .await
        .unwrap();
    let b = create_collection(&gw, &CollectionDraft::new("Portraits"))
        .await
        .unwrap();
    assert_ne!(a.slug, b.slug);
    assert!(a.slug.starts_with("portraits-") && b.slug.starts_with("portraits-"));
}
