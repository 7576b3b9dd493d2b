//! Error types for bundle operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during bundle operations.
#[derive(Error, Debug)]
pub enum BundleError {
    /// A structured value could not be normalized for scrubbing.
    #[error("redaction failed for {path}: {source}")]
    Redaction {
        path: String,
        #[source]
        source: fdb_redact::RedactionError,
    },

    /// The redactor could not be built from the configured policy.
    #[error("invalid redaction policy: {0}")]
    Policy(#[from] fdb_redact::RedactionError),

    /// A value could not be encoded to its target format.
    #[error("serialization failed for {path}: {source}")]
    Serialization {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// An input name would produce an unsafe or empty archive path.
    #[error("invalid archive path '{0}'")]
    InvalidPath(String),

    /// Two inputs resolved to the same archive path.
    #[error("duplicate archive path '{0}'")]
    DuplicatePath(String),

    /// Output directory or archive file could not be created or written.
    #[error("archive I/O failed for {}: {source}", path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Checksum verification failed
    #[error("checksum mismatch for '{path}': expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    /// Missing required file in bundle
    #[error("missing required file: {0}")]
    MissingFile(String),

    /// Unknown or unsupported bundle version
    #[error("unsupported bundle version: {version} (supported: {supported})")]
    UnsupportedVersion { version: String, supported: String },

    /// Corrupted manifest
    #[error("corrupted manifest: {0}")]
    CorruptedManifest(String),

    /// Archive entry that cannot belong to a bundle
    #[error("unsafe archive entry '{0}'")]
    UnsafeEntry(String),

    /// File not found in bundle
    #[error("file not found in bundle: {0}")]
    FileNotFound(String),
}

impl BundleError {
    pub(crate) fn archive(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BundleError::Archive {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for bundle operations.
pub type Result<T> = std::result::Result<T, BundleError>;
