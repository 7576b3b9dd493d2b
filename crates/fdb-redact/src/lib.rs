//! Redaction engine for fluid diagnostic bundles.
//!
//! Every byte that leaves the bundler passes through one redactor, so the
//! rules live in one place.
//!
//! # Key Features
//!
//! - **Pattern redaction**: `password`, `token`, `key` and `secret` markers
//!   followed by `:` or `=` have their value replaced by `[REDACTED]`, in both
//!   text and raw bytes. The marker stays readable.
//! - **Structural redaction**: mapping keys whose lower-cased name contains a
//!   sensitive fragment have their whole value replaced, at any depth.
//! - **Known-secret detection**: optional masking of well-known token formats
//!   (AWS keys, GitHub tokens, JWTs, PEM headers) wherever they appear.
//! - **Fail-closed**: a value that cannot be normalized is an error, never
//!   passed through unredacted.
//!
//! # Example
//!
//! ```
//! use fdb_redact::{PatternRedactor, Redactor};
//! use serde_json::json;
//!
//! let redactor = PatternRedactor::default();
//!
//! let line = redactor.redact_str("connecting with password=hunter2");
//! assert_eq!(line, "connecting with password: [REDACTED]");
//!
//! let scrubbed = redactor.scrub(&json!({"password": "abc123", "name": "x"}));
//! assert_eq!(scrubbed, json!({"password": "[REDACTED]", "name": "x"}));
//! ```

pub mod detect;
pub mod engine;
pub mod error;
pub mod policy;

pub use detect::{SecretDetector, SecretType};
pub use engine::{PatternRedactor, Redactor};
pub use error::{RedactionError, Result};
pub use policy::{RedactionPolicy, DEFAULT_MASK, POLICY_SCHEMA_VERSION};
