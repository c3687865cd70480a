//! Error type returned by every collection and image operation.
//!
//! Each variant belongs to one [`ErrorKind`]; callers branch on the kind and
//! show the `Display` text to users.

use crate::gateway::GatewayError;
use crate::imaging::BackendError;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Coarse failure category of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// No active actor for an owner-scoped write.
    Unauthenticated,
    /// A required argument was missing or malformed. Raised before any I/O.
    InvalidInput,
    /// The filter matched zero rows.
    NotFound,
    /// The backend reported a query or storage failure.
    StoreError,
    /// The image could not be decoded or re-encoded.
    TranscodeError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Unauthenticated => "unauthenticated",
            ErrorKind::InvalidInput => "invalid input",
            ErrorKind::NotFound => "not found",
            ErrorKind::StoreError => "store error",
            ErrorKind::TranscodeError => "transcode error",
        };
        f.write_str(s)
    }
}

/// Outcome of removing an uploaded object after its metadata row was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum CleanupOutcome {
    Removed,
    /// The object is still in storage.
    Failed(String),
}

impl fmt::Display for CleanupOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CleanupOutcome::Removed => f.write_str("uploaded object removed"),
            CleanupOutcome::Failed(reason) => {
                write!(f, "uploaded object left in storage ({reason})")
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum FolioError {
    #[error("User not authenticated")]
    Unauthenticated,
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Error {context}: {source}")]
    Store {
        context: &'static str,
        #[source]
        source: GatewayError,
    },
    #[error("Error saving image metadata: {source}; {cleanup}")]
    MetadataRejected {
        #[source]
        source: GatewayError,
        cleanup: CleanupOutcome,
    },
    #[error("Image processing failed: {0}")]
    Transcode(#[from] BackendError),
}

impl FolioError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FolioError::Unauthenticated => ErrorKind::Unauthenticated,
            FolioError::InvalidInput(_) => ErrorKind::InvalidInput,
            FolioError::NotFound(_) => ErrorKind::NotFound,
            FolioError::Store { .. } | FolioError::MetadataRejected { .. } => {
                ErrorKind::StoreError
            }
            FolioError::Transcode(_) => ErrorKind::TranscodeError,
        }
    }

    /// True when the store rejected a write as a duplicate (e.g. slug taken).
    pub fn is_conflict(&self) -> bool {
        match self {
            FolioError::Store { source, .. } | FolioError::MetadataRejected { source, .. } => {
                source.is_conflict()
            }
            _ => false,
        }
    }
}

/// Result type for collection and image operations.
pub type Result<T> = std::result::Result<T, FolioError>;

/// Attach a short "what were we doing" label to a gateway failure.
pub(crate) trait StoreContext<T> {
    fn context(self, context: &'static str) -> Result<T>;
}

impl<T> StoreContext<T> for std::result::Result<T, GatewayError> {
    fn context(self, context: &'static str) -> Result<T> {
        self.map_err(|source| FolioError::Store { context, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_from_variants() {
        assert_eq!(FolioError::Unauthenticated.kind(), ErrorKind::Unauthenticated);
        assert_eq!(
            FolioError::InvalidInput("x".into()).kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(FolioError::NotFound("x".into()).kind(), ErrorKind::NotFound);
        assert_eq!(
            FolioError::Transcode(BackendError::Decode("bad".into())).kind(),
            ErrorKind::TranscodeError
        );
        let rejected = FolioError::MetadataRejected {
            source: GatewayError::Api {
                status: 400,
                message: "bad row".into(),
            },
            cleanup: CleanupOutcome::Removed,
        };
        assert_eq!(rejected.kind(), ErrorKind::StoreError);
    }

    #[test]
    fn context_labels_store_errors() {
        let res: std::result::Result<(), GatewayError> =
            Err(GatewayError::Conflict("duplicate key value".into()));
        let err = res.context("creating collection").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StoreError);
        assert!(err.is_conflict());
        assert_eq!(
            err.to_string(),
            "Error creating collection: conflict: duplicate key value"
        );
    }

    #[test]
    fn cleanup_outcome_in_message() {
        let err = FolioError::MetadataRejected {
            source: GatewayError::Api {
                status: 500,
                message: "boom".into(),
            },
            cleanup: CleanupOutcome::Failed("timeout".into()),
        };
        assert_eq!(
            err.to_string(),
            "Error saving image metadata: backend returned 500: boom; \
             uploaded object left in storage (timeout)"
        );
    }

    #[test]
    fn kind_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(ErrorKind::StoreError).unwrap(),
            "store_error"
        );
    }
}
