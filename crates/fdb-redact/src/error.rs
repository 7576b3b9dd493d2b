//! Error types for the redactor.

use thiserror::Error;

/// Result type for redaction operations.
pub type Result<T> = std::result::Result<T, RedactionError>;

/// Errors that can occur during redaction.
#[derive(Error, Debug)]
pub enum RedactionError {
    /// Failed to load or parse the redaction policy.
    #[error("policy error: {0}")]
    PolicyError(String),

    /// Failed to compile a regex pattern.
    #[error("pattern error: {0}")]
    PatternError(String),

    /// A value could not be normalized into mapping/sequence/scalar form.
    ///
    /// The underlying serde message names the offending type, never the
    /// content being redacted.
    #[error("value cannot be normalized for scrubbing: {0}")]
    Normalize(#[source] serde_json::Error),

    /// I/O error while reading a policy file.
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing error in a policy file.
    #[error("json error: {0}")]
    JsonError(#[from] serde_json::Error),
}
