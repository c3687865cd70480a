//! CLI output formatting for every command.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not storage-centric**. The primary
//! display for every entity (collection, image) is its semantic identity:
//! positional index and title. Slugs, storage keys and URLs follow as
//! indented context lines, so the output reads as an inventory while still
//! letting users trace entries back to the backend.
//!
//! # Entity Display Contract
//!
//! 1. **Header line**: positional index + title (+ photo count for collections)
//! 2. **Context lines**: indented `Slug:`, `Source:`, `URL:`, etc.
//!
//! ```text
//! Collections
//! 001 Landscapes (5 photos)
//!     Slug: landscapes-x3k9qa
//!     Visibility: public
//!     Description: Mountains and coastlines
//! 002 Drafts (0 photos)
//!     Slug: drafts-0pz1mv
//!     Visibility: private
//! ```
//!
//! ```text
//! Landscapes (2 photos)
//!     Slug: landscapes-x3k9qa
//!     001 Dawn
//!         Source: collections/9f2c.../1717171717-4k2j9h1m0qa.jpg
//!         URL: https://.../portfolio-images/collections/9f2c.../1717...jpg
//!     002 (IMG_0042.jpg)
//!         Source: ...
//! ```
//!
//! # Machine Output
//!
//! With `--json` every command prints a single envelope instead:
//! `{"success": true, "data": ...}` or
//! `{"success": false, "error": "...", "kind": "not_found"}`.
//!
//! # Architecture
//!
//! Each command has a `format_*` function returning `Vec<String>` for
//! testability; `main` prints the lines.

use crate::collections::CollectionDeletion;
use crate::error::FolioError;
use crate::images::UploadedImage;
use crate::types::{Collection, CollectionSummary, CollectionWithImages};
use serde::Serialize;
use serde_json::{Value, json};

const DESCRIPTION_WIDTH: usize = 60;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Positional index + title, with an optional photo count.
///
/// ```text
/// 001 Landscapes (5 photos)
/// 001 Landscapes
/// ```
fn entity_header(index: usize, title: &str, count: Option<u64>) -> String {
    match count {
        Some(n) => format!("{} {} ({} photos)", format_index(index), title, n),
        None => format!("{} {}", format_index(index), title),
    }
}

/// Titled images show their title, untitled ones the file name in parens.
fn image_line(index: usize, title: Option<&str>, filename: &str) -> String {
    match title {
        Some(t) if !t.is_empty() => format!("{} {}", format_index(index), t),
        _ => format!("{} ({})", format_index(index), filename),
    }
}

/// Truncate to `max` characters, appending `...` if truncated.
fn truncate_desc(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        None => text.to_string(),
        Some((cut, _)) => format!("{}...", &text[..cut]),
    }
}

fn visibility(is_public: bool) -> &'static str {
    if is_public { "public" } else { "private" }
}

fn push_description(lines: &mut Vec<String>, depth: usize, description: Option<&str>) {
    if let Some(desc) = description.map(str::trim).filter(|d| !d.is_empty()) {
        lines.push(format!(
            "{}Description: {}",
            indent(depth),
            truncate_desc(desc, DESCRIPTION_WIDTH)
        ));
    }
}

// ============================================================================
// Collections
// ============================================================================

/// A single collection, as printed after `create` and `update`.
pub fn format_collection(collection: &Collection) -> Vec<String> {
    let mut lines = vec![
        collection.title.clone(),
        format!("{}Id: {}", indent(1), collection.id),
        format!("{}Slug: {}", indent(1), collection.slug),
        format!("{}Visibility: {}", indent(1), visibility(collection.is_public)),
    ];
    push_description(&mut lines, 1, collection.description.as_deref());
    lines
}

/// The owner's collection list.
pub fn format_collection_list(collections: &[CollectionSummary]) -> Vec<String> {
    let mut lines = vec!["Collections".to_string()];
    if collections.is_empty() {
        lines.push(format!("{}(none)", indent(1)));
        return lines;
    }
    for (i, summary) in collections.iter().enumerate() {
        let c = &summary.collection;
        lines.push(entity_header(i + 1, &c.title, Some(summary.image_count)));
        lines.push(format!("{}Slug: {}", indent(1), c.slug));
        lines.push(format!("{}Visibility: {}", indent(1), visibility(c.is_public)));
        push_description(&mut lines, 1, c.description.as_deref());
    }
    lines
}

/// One collection with its images; `url_for` maps a storage key to its
/// public URL.
pub fn format_collection_detail(
    detail: &CollectionWithImages,
    url_for: impl Fn(&str) -> String,
) -> Vec<String> {
    let c = &detail.collection;
    let mut lines = vec![
        format!("{} ({} photos)", c.title, detail.images.len()),
        format!("{}Slug: {}", indent(1), c.slug),
        format!("{}Visibility: {}", indent(1), visibility(c.is_public)),
    ];
    push_description(&mut lines, 1, c.description.as_deref());
    for (i, image) in detail.images.iter().enumerate() {
        lines.push(format!(
            "{}{}",
            indent(1),
            image_line(i + 1, image.title.as_deref(), &image.file_name)
        ));
        lines.push(format!("{}Source: {}", indent(2), image.file_path));
        lines.push(format!("{}URL: {}", indent(2), url_for(&image.file_path)));
        push_description(&mut lines, 2, image.description.as_deref());
    }
    lines
}

pub fn format_deletion(id: &str, deletion: &CollectionDeletion) -> Vec<String> {
    let mut lines = vec![format!(
        "Deleted collection {} ({} objects removed)",
        id,
        deletion.removed.len()
    )];
    for key in &deletion.already_missing {
        lines.push(format!("{}Already missing: {}", indent(1), key));
    }
    lines
}

// ============================================================================
// Images
// ============================================================================

pub fn format_upload(uploaded: &UploadedImage, url: &str) -> Vec<String> {
    let image = &uploaded.image;
    let size = if uploaded.resized {
        format!("{}x{} (resized)", uploaded.width, uploaded.height)
    } else {
        format!("{}x{}", uploaded.width, uploaded.height)
    };
    vec![
        image_line(1, image.title.as_deref(), &image.file_name),
        format!("{}Id: {}", indent(1), image.id),
        format!("{}Source: {}", indent(1), uploaded.file_path),
        format!("{}Size: {}, {} bytes", indent(1), size, image.file_size),
        format!("{}URL: {}", indent(1), url),
    ]
}

// ============================================================================
// JSON envelope
// ============================================================================

/// `{"success": true, "data": ...}`
pub fn json_success<T: Serialize>(data: &T) -> Value {
    json!({ "success": true, "data": data })
}

/// `{"success": false, "error": "...", "kind": "..."}`
pub fn json_failure(err: &FolioError) -> Value {
    json!({ "success": false, "error": err.to_string(), "kind": err.kind() })
}

/// Print lines to stdout.
pub fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CleanupOutcome;
    use crate::gateway::GatewayError;
    use crate::types::{Image, ImageEntry};
    use chrono::{TimeZone, Utc};

    fn collection(title: &str, is_public: bool, description: Option<&str>) -> Collection {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        Collection {
            id: "c-1".into(),
            title: title.into(),
            slug: "landscapes-x3k9qa".into(),
            description: description.map(String::from),
            is_public,
            user_id: "user-1".into(),
            created_at: at,
            updated_at: at,
        }
    }

    fn entry(title: Option<&str>, file_name: &str, file_path: &str) -> ImageEntry {
        ImageEntry {
            id: format!("i-{file_name}"),
            file_path: file_path.into(),
            file_name: file_name.into(),
            title: title.map(String::from),
            description: None,
            sort_order: 0,
        }
    }

    // =========================================================================
    // Helper tests
    // =========================================================================

    #[test]
    fn format_index_pads_to_three() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(100), "100");
    }

    #[test]
    fn truncate_desc_short() {
        assert_eq!(truncate_desc("Short text", 40), "Short text");
    }

    #[test]
    fn truncate_desc_exact() {
        let text = "a".repeat(40);
        assert_eq!(truncate_desc(&text, 40), text);
    }

    #[test]
    fn truncate_desc_long() {
        let text = "a".repeat(50);
        assert_eq!(truncate_desc(&text, 40), format!("{}...", "a".repeat(40)));
    }

    #[test]
    fn truncate_desc_multibyte() {
        assert_eq!(truncate_desc("ééééé", 3), "ééé...");
    }

    #[test]
    fn entity_header_with_count() {
        assert_eq!(
            entity_header(1, "Landscapes", Some(5)),
            "001 Landscapes (5 photos)"
        );
    }

    #[test]
    fn entity_header_without_count() {
        assert_eq!(entity_header(2, "Travel", None), "002 Travel");
    }

    #[test]
    fn image_line_with_title() {
        assert_eq!(image_line(1, Some("Dawn"), "dawn.jpg"), "001 Dawn");
    }

    #[test]
    fn image_line_untitled_shows_filename() {
        assert_eq!(image_line(3, None, "IMG_0042.jpg"), "003 (IMG_0042.jpg)");
        assert_eq!(image_line(3, Some(""), "IMG_0042.jpg"), "003 (IMG_0042.jpg)");
    }

    // =========================================================================
    // Command output
    // =========================================================================

    #[test]
    fn collection_list_output() {
        let list = vec![
            CollectionSummary {
                collection: collection("Landscapes", true, Some("Mountains")),
                image_count: 5,
            },
            CollectionSummary {
                collection: collection("Drafts", false, Some("")),
                image_count: 0,
            },
        ];
        assert_eq!(
            format_collection_list(&list),
            vec![
                "Collections",
                "001 Landscapes (5 photos)",
                "    Slug: landscapes-x3k9qa",
                "    Visibility: public",
                "    Description: Mountains",
                "002 Drafts (0 photos)",
                "    Slug: landscapes-x3k9qa",
                "    Visibility: private",
            ]
        );
    }

    #[test]
    fn empty_collection_list() {
        assert_eq!(format_collection_list(&[]), vec!["Collections", "    (none)"]);
    }

    #[test]
    fn collection_detail_output() {
        let detail = CollectionWithImages {
            collection: collection("Landscapes", true, None),
            images: vec![
                entry(Some("Dawn"), "dawn.jpg", "collections/c-1/1-a.jpg"),
                entry(None, "IMG_0042.jpg", "collections/c-1/2-b.jpg"),
            ],
        };
        let lines = format_collection_detail(&detail, |key| format!("https://cdn/{key}"));
        assert_eq!(
            lines,
            vec![
                "Landscapes (2 photos)",
                "    Slug: landscapes-x3k9qa",
                "    Visibility: public",
                "    001 Dawn",
                "        Source: collections/c-1/1-a.jpg",
                "        URL: https://cdn/collections/c-1/1-a.jpg",
                "    002 (IMG_0042.jpg)",
                "        Source: collections/c-1/2-b.jpg",
                "        URL: https://cdn/collections/c-1/2-b.jpg",
            ]
        );
    }

    #[test]
    fn deletion_lists_missing_objects() {
        let deletion = CollectionDeletion {
            removed: vec!["a".into()],
            already_missing: vec!["b".into()],
        };
        assert_eq!(
            format_deletion("c-1", &deletion),
            vec![
                "Deleted collection c-1 (1 objects removed)",
                "    Already missing: b",
            ]
        );
    }

    #[test]
    fn upload_output_marks_resize() {
        let uploaded = UploadedImage {
            image: Image {
                id: "i-1".into(),
                collection_id: "c-1".into(),
                file_path: "collections/c-1/1-a.jpg".into(),
                file_name: "a.jpg".into(),
                file_size: 2048,
                title: Some("a".into()),
                description: None,
                sort_order: 0,
            },
            file_path: "collections/c-1/1-a.jpg".into(),
            width: 1600,
            height: 1066,
            resized: true,
        };
        let lines = format_upload(&uploaded, "https://cdn/x");
        assert_eq!(lines[0], "001 a");
        assert_eq!(lines[3], "    Size: 1600x1066 (resized), 2048 bytes");
        assert_eq!(lines[4], "    URL: https://cdn/x");
    }

    #[test]
    fn json_success_envelope() {
        let value = json_success(&vec!["a", "b"]);
        assert_eq!(value, json!({"success": true, "data": ["a", "b"]}));
    }

    #[test]
    fn json_failure_envelope() {
        let value = json_failure(&FolioError::NotFound("collection x".into()));
        assert_eq!(value["success"], json!(false));
        assert_eq!(value["kind"], json!("not_found"));
        assert!(value["error"].as_str().unwrap().contains("collection x"));

        let rejected = FolioError::MetadataRejected {
            source: GatewayError::Conflict("dup".into()),
            cleanup: CleanupOutcome::Removed,
        };
        assert_eq!(json_failure(&rejected)["kind"], json!("store_error"));
    }
}
