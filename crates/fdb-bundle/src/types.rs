//! Bundle input and output types.

use crate::BundleManifest;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Connected state of Kubernetes and Fluid resources.
///
/// Treated as an opaque JSON document by the bundler.
pub type ResourceGraph = serde_json::Map<String, serde_json::Value>;

/// Outcome of a diagnostic run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticResult {
    pub issues: Vec<Issue>,
    pub score: i64,
}

/// A single finding in the diagnosis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub level: String,
    pub message: String,
}

impl Issue {
    pub fn new(level: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            message: message.into(),
        }
    }
}

/// Contextual information about the diagnosis environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleMetadata {
    pub creation_timestamp: DateTime<Utc>,
    #[serde(default)]
    pub fluid_version: String,
    #[serde(default)]
    pub k8s_version: String,
    /// e.g. "production", "ci"
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub environment: String,
}

impl Default for BundleMetadata {
    fn default() -> Self {
        Self {
            creation_timestamp: DateTime::<Utc>::UNIX_EPOCH,
            fluid_version: String::new(),
            k8s_version: String::new(),
            environment: String::new(),
        }
    }
}

/// Input payload for creating a diagnostic bundle.
///
/// Logs and resources are ordered maps so they are always archived in key
/// order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BundleInput {
    /// Raw resource state.
    pub graph: ResourceGraph,
    /// Computed diagnosis.
    pub diagnosis: DiagnosticResult,
    /// Contextual metadata.
    pub metadata: BundleMetadata,
    /// Log file contents (filename -> content).
    pub logs: BTreeMap<String, Vec<u8>>,
    /// Raw resource exports (relative path -> content).
    pub resources: BTreeMap<String, String>,
}

/// Output of a successful bundling operation.
#[derive(Debug, Clone, Serialize)]
pub struct BundleResult {
    /// Absolute path to the generated archive file.
    pub archive_path: PathBuf,
    /// Files archived, including `manifest.json`.
    pub file_count: usize,
    /// Manifest written into the archive.
    pub manifest: BundleManifest,
    /// Uncompressed size of all archived file contents.
    pub size_bytes: u64,
}
