//! Client configuration.
//!
//! Loaded from a `folio.toml` file, layered over stock defaults, then
//! overridden by environment variables:
//!
//! ```text
//! stock defaults  ←  folio.toml  ←  FOLIO_* environment
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [backend]
//! url = ""                     # e.g. "https://abcd.supabase.co"   (FOLIO_URL)
//! anon_key = ""                # public anon key                    (FOLIO_ANON_KEY)
//! # access_token = "..."       # signed-in user's JWT               (FOLIO_ACCESS_TOKEN)
//! bucket = "portfolio-images"  # storage bucket for image objects   (FOLIO_BUCKET)
//!
//! [upload]
//! max_dimension = 1600         # longest edge after downscale, px
//! quality = 92                 # lossy encoder quality (1-100)
//! cache_control = 3600         # Cache-Control max-age for stored objects, s
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{DEFAULT_MAX_DIMENSION, DownscaleConfig, Quality};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Client configuration loaded from `folio.toml`.
///
/// All fields have defaults; a config file only needs the values it changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FolioConfig {
    /// Where the hosted backend lives and how to authenticate.
    pub backend: BackendConfig,
    /// Image downscale and storage settings.
    pub upload: UploadConfig,
}

/// Hosted backend connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackendConfig {
    /// Project base URL, without a trailing path.
    pub url: String,
    /// Public (anon) API key sent with every request.
    pub anon_key: String,
    /// Access token of the signed-in user. Without it, writes that need an
    /// owner fail as unauthenticated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Storage bucket holding image objects.
    pub bucket: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: String::new(),
            access_token: None,
            bucket: "portfolio-images".to_string(),
        }
    }
}

/// Upload pipeline settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadConfig {
    /// Longest edge, in pixels, after downscaling.
    pub max_dimension: u32,
    /// Lossy encoder quality (1 = worst, 100 = best).
    pub quality: u32,
    /// `Cache-Control: max-age` for stored objects, in seconds.
    pub cache_control: u32,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_dimension: DEFAULT_MAX_DIMENSION,
            quality: 92,
            cache_control: 3600,
        }
    }
}

impl UploadConfig {
    pub fn downscale(&self) -> DownscaleConfig {
        DownscaleConfig {
            max_dimension: self.max_dimension,
            quality: Quality::new(self.quality),
        }
    }
}

impl FolioConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.upload.quality == 0 || self.upload.quality > 100 {
            return Err(ConfigError::Validation(
                "upload.quality must be 1-100".into(),
            ));
        }
        if self.upload.max_dimension == 0 {
            return Err(ConfigError::Validation(
                "upload.max_dimension must be non-zero".into(),
            ));
        }
        if self.backend.bucket.trim().is_empty() {
            return Err(ConfigError::Validation(
                "backend.bucket must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Check the settings needed to reach a real backend are present.
    pub fn require_backend(&self) -> Result<(), ConfigError> {
        if self.backend.url.trim().is_empty() {
            return Err(ConfigError::Validation(
                "backend.url is not set (config file or FOLIO_URL)".into(),
            ));
        }
        if self.backend.anon_key.trim().is_empty() {
            return Err(ConfigError::Validation(
                "backend.anon_key is not set (config file or FOLIO_ANON_KEY)".into(),
            ));
        }
        Ok(())
    }

    /// Apply `FOLIO_*` overrides using `lookup` to read variables.
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("FOLIO_URL") {
            self.backend.url = url;
        }
        if let Some(key) = lookup("FOLIO_ANON_KEY") {
            self.backend.anon_key = key;
        }
        if let Some(token) = lookup("FOLIO_ACCESS_TOKEN") {
            self.backend.access_token = Some(token).filter(|t| !t.is_empty());
        }
        if let Some(bucket) = lookup("FOLIO_BUCKET") {
            self.backend.bucket = bucket;
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(FolioConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<FolioConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: FolioConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path` (stock defaults when absent), then apply the
/// process environment.
pub fn load_config(path: &Path) -> Result<FolioConfig, ConfigError> {
    let mut config = resolve_config(load_raw_config(path)?)?;
    config.apply_env_with(|name| std::env::var(name).ok());
    config.validate()?;
    Ok(config)
}

/// Returns a fully-commented stock `folio.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Folio Configuration
# ===================
# Every key is optional; the values below are the defaults.
# Environment variables (FOLIO_URL, FOLIO_ANON_KEY, FOLIO_ACCESS_TOKEN,
# FOLIO_BUCKET) override this file.

[backend]
# Project base URL, e.g. "https://abcd.supabase.co".
url = ""
# Public (anon) API key.
anon_key = ""
# Access token of the signed-in user. Required for creating collections.
# access_token = ""
# Storage bucket holding image objects.
bucket = "portfolio-images"

[upload]
# Longest edge, in pixels, after downscaling. Smaller images are never upscaled.
max_dimension = 1600
# Lossy encoder quality (1-100). Applies to JPEG; other formats are lossless.
quality = 92
# Cache-Control max-age for stored objects, in seconds.
cache_control = 3600
"##
}
