//! Identifier derivation: slugs, random tokens, storage keys, default titles.
//!
//! Everything here is pure except for the random component, which is drawn
//! from a caller-supplied [`Rng`] in the `*_with` variants so tests can seed it.
//!
//! ## Slugs
//!
//! A slug is the lowercased title with every run of characters outside
//! `[a-z0-9]` collapsed to a single `-`, trimmed of leading/trailing dashes,
//! followed by `-` and a 6-character base-36 suffix:
//!
//! - `"My Trip 2024!"` → `my-trip-2024-k3x9q1`
//! - `"  Café / Noir  "` → `caf-noir-0a8zzt`
//! - `""` → `p1w7cd` (suffix only, never a leading dash)
//!
//! The suffix lowers the odds of a collision; the database's unique
//! constraint on `slug` is what actually enforces uniqueness.
//!
//! ## Storage keys
//!
//! `collections/{collection_id}/{unix_millis}-{token}.{ext}`, where `token`
//! is 11 base-36 characters and `ext` is the original file's extension with
//! its case kept. Only ASCII letters and digits pass through; anything else
//! falls back to the extension of the stored format.

use chrono::{DateTime, Utc};
use rand::Rng;

/// Alphabet for random tokens (base 36, lowercase).
const TOKEN_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Length of the random slug suffix.
pub const SLUG_SUFFIX_LEN: usize = 6;

/// Length of the random component of a storage key.
pub const KEY_TOKEN_LEN: usize = 11;

/// Generate a random base-36 token of `len` characters.
pub fn random_token_with(rng: &mut impl Rng, len: usize) -> String {
    (0..len)
        .map(|_| TOKEN_ALPHABET[rng.gen_range(0..TOKEN_ALPHABET.len())] as char)
        .collect()
}

/// Collapse a title to its URL-safe base, without the random suffix.
///
/// May return an empty string (empty or symbol-only titles).
pub fn slug_base(title: &str) -> String {
    let mut base = String::with_capacity(title.len());
    let mut pending_dash = false;
    for c in title.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !base.is_empty() {
                base.push('-');
            }
            pending_dash = false;
            base.push(c);
        } else {
            pending_dash = true;
        }
    }
    base
}

/// Derive a slug from a title using the given random source.
pub fn slugify_with(title: &str, rng: &mut impl Rng) -> String {
    let base = slug_base(title);
    let suffix = random_token_with(rng, SLUG_SUFFIX_LEN);
    if base.is_empty() {
        suffix
    } else {
        format!("{base}-{suffix}")
    }
}

/// Derive a slug from a title using the thread-local RNG.
pub fn slugify(title: &str) -> String {
    slugify_with(title, &mut rand::thread_rng())
}

/// Longest extension carried over into a storage key.
const MAX_EXTENSION_LEN: usize = 16;

/// Text after the last dot of a file name, as written. `None` when there is
/// no dot, nothing follows the last dot, or the name is a bare dotfile.
pub fn file_extension(file_name: &str) -> Option<&str> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if ext.is_empty() || (stem.is_empty() && !file_name[1..].contains('.')) {
        // ".hidden" has no extension
        return None;
    }
    Some(ext)
}

/// Whether `ext` may appear verbatim at the end of a storage key.
fn is_key_extension(ext: &str) -> bool {
    !ext.is_empty()
        && ext.len() <= MAX_EXTENSION_LEN
        && ext.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// Default image title: the original file name up to its first dot.
///
/// - `"sunset.jpg"` → `"sunset"`
/// - `"IMG_0042.final.JPEG"` → `"IMG_0042"`
/// - `"README"` → `"README"`
/// - `".hidden"` → `".hidden"` (nothing before the dot, name kept whole)
pub fn default_title(file_name: &str) -> String {
    match file_name.split('.').next() {
        Some(head) if !head.is_empty() => head.to_string(),
        _ => file_name.to_string(),
    }
}

/// Build the storage key for an uploaded image.
///
/// The key ends in the original file's extension, case kept. When the name
/// has none, or it is not plain ASCII alphanumerics, `fallback_ext`
/// (usually the canonical extension of the transcoded format) is used, and
/// `bin` if that is unusable too.
pub fn storage_key_with(
    collection_id: &str,
    file_name: &str,
    fallback_ext: &str,
    now: DateTime<Utc>,
    rng: &mut impl Rng,
) -> String {
    let ext = file_extension(file_name)
        .filter(|ext| is_key_extension(ext))
        .map(str::to_string)
        .or_else(|| Some(fallback_ext.to_ascii_lowercase()).filter(|ext| is_key_extension(ext)))
        .unwrap_or_else(|| "bin".to_string());
    let token = random_token_with(rng, KEY_TOKEN_LEN);
    format!(
        "collections/{collection_id}/{}-{token}.{ext}",
        now.timestamp_millis()
    )
}

/// Build the storage key for an uploaded image using the current time and
/// the thread-local RNG.
pub fn storage_key(collection_id: &str, file_name: &str, fallback_ext: &str) -> String {
    storage_key_with(
        collection_id,
        file_name,
        fallback_ext,
        Utc::now(),
        &mut rand::thread_rng(),
    )
}
