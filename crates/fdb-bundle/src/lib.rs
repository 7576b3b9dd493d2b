//! Deterministic diagnostic bundles for Fluid.
//!
//! A bundle packages the state of a Fluid installation (resource graph,
//! diagnosis, environment metadata, logs and raw resource exports) into one
//! `.tar.gz` archive with a manifest of per-file SHA-256 checksums.
//!
//! # Bundle Format
//!
//! Every entry lives under one root directory, `fluid-diagnose-<YYYYMMDD-HHMMSS>`:
//! - `manifest.json`: schema version, file listing with checksums, content hash
//! - `summary.txt`: human-readable one-screen summary
//! - `graph.json`, `diagnosis.json`: structured diagnostic state
//! - `metadata/environment.json`: environment metadata
//! - `logs/`: log files
//! - `resources/`: raw resource exports
//!
//! # Determinism
//!
//! With a pinned timestamp, identical inputs produce byte-identical archives:
//! entries are sorted, headers are normalized and gzip carries no host data.
//!
//! # Example
//!
//! ```no_run
//! use chrono::{TimeZone, Utc};
//! use fdb_bundle::{build, BuildOptions, BundleInput, BundleReader};
//!
//! let mut input = BundleInput::default();
//! input.logs.insert("controller.log".into(), b"password=hunter2\n".to_vec());
//!
//! let options = BuildOptions::new()
//!     .with_redaction()
//!     .with_timestamp(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap())
//!     .with_output_dir("/tmp/bundles");
//! let result = build(&input, options).unwrap();
//!
//! let reader = BundleReader::open(&result.archive_path).unwrap();
//! assert!(reader.verify_all().is_empty());
//! ```

pub mod archive;
pub mod error;
pub mod layout;
pub mod manifest;
pub mod pipeline;
pub mod reader;
pub mod types;

pub use archive::ArchiveWriter;
pub use error::{BundleError, Result};
pub use manifest::{BundleManifest, FileEntry, ManifestBuilder, ManifestOrder, BUNDLE_SCHEMA_VERSION};
pub use pipeline::{build, build_to_vec, BuildOptions};
pub use reader::BundleReader;
pub use types::{BundleInput, BundleMetadata, BundleResult, DiagnosticResult, Issue, ResourceGraph};
pub use fdb_redact::RedactionPolicy;
