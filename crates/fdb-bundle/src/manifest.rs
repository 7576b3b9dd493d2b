//! Bundle manifest types and the builder that accumulates them.
//!
//! The manifest is the index of a bundle's contents, providing:
//! - Schema version and generation timestamp
//! - File listing with sizes and SHA-256 checksums
//! - One aggregate content hash over all per-file checksums
//!
//! The manifest never lists itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Current bundle schema version.
pub const BUNDLE_SCHEMA_VERSION: &str = "v1";

/// Bundle manifest containing metadata and file checksums.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleManifest {
    /// Schema version of the bundle layout.
    pub version: String,

    /// When the bundle was generated.
    pub generated_at: DateTime<Utc>,

    /// Number of files listed (the manifest itself is not counted).
    pub total_files: usize,

    /// Files in the bundle with checksums, in the order they were added.
    pub files: Vec<FileEntry>,

    /// SHA-256 over the concatenated per-file checksums, in list order.
    pub content_hash: String,
}

impl BundleManifest {
    /// Get total size of all listed files in bytes.
    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }

    /// Find a file by path.
    pub fn find_file(&self, path: &str) -> Option<&FileEntry> {
        self.files.iter().find(|f| f.path == path)
    }

    /// Recompute the aggregate hash from the file list.
    pub fn compute_content_hash(&self) -> String {
        content_hash(&self.files)
    }

    /// Validate the manifest structure.
    pub fn validate(&self) -> crate::Result<()> {
        if self.version != BUNDLE_SCHEMA_VERSION {
            return Err(crate::BundleError::UnsupportedVersion {
                version: self.version.clone(),
                supported: BUNDLE_SCHEMA_VERSION.to_string(),
            });
        }

        if self.total_files != self.files.len() {
            return Err(crate::BundleError::CorruptedManifest(format!(
                "totalFiles is {} but {} files are listed",
                self.total_files,
                self.files.len()
            )));
        }

        for file in &self.files {
            if file.path.is_empty() {
                return Err(crate::BundleError::CorruptedManifest(
                    "file entry has empty path".to_string(),
                ));
            }
            if file.path == crate::layout::MANIFEST_FILE {
                return Err(crate::BundleError::CorruptedManifest(
                    "manifest lists itself".to_string(),
                ));
            }
            if !is_sha256_hex(&file.sha256) {
                return Err(crate::BundleError::CorruptedManifest(format!(
                    "file '{}' has invalid checksum",
                    file.path
                )));
            }
        }

        if self.compute_content_hash() != self.content_hash {
            return Err(crate::BundleError::CorruptedManifest(
                "contentHash does not match file checksums".to_string(),
            ));
        }

        Ok(())
    }

    /// Serialize to JSON with consistent formatting.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse from JSON.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// File entry in the manifest with checksum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Path within the bundle root (relative, `/`-separated).
    pub path: String,

    /// Size in bytes.
    pub size: u64,

    /// SHA-256 checksum (64 lower-case hex characters).
    pub sha256: String,
}

impl FileEntry {
    /// Create an entry for content, computing its checksum.
    pub fn for_content(path: impl Into<String>, data: &[u8]) -> Self {
        Self {
            path: path.into(),
            size: data.len() as u64,
            sha256: Self::compute_checksum(data),
        }
    }

    /// Compute SHA-256 checksum of data.
    pub fn compute_checksum(data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        hex::encode(hasher.finalize())
    }

    /// Verify the checksum against data.
    pub fn verify(&self, data: &[u8]) -> bool {
        data.len() as u64 == self.size && Self::compute_checksum(data) == self.sha256
    }
}

fn is_sha256_hex(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

fn content_hash(files: &[FileEntry]) -> String {
    let mut hasher = Sha256::new();
    for file in files {
        hasher.update(file.sha256.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Order of the manifest file list, which also fixes the aggregate hash input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManifestOrder {
    /// Order in which files were added.
    #[default]
    Insertion,
    /// Sorted by path, so the aggregate hash ignores add order.
    Sorted,
}

/// Accumulates file entries while a bundle is assembled.
#[derive(Debug, Clone)]
pub struct ManifestBuilder {
    version: String,
    generated_at: DateTime<Utc>,
    order: ManifestOrder,
    files: Vec<FileEntry>,
}

impl ManifestBuilder {
    /// Create a builder for the given schema version and timestamp.
    pub fn new(version: impl Into<String>, generated_at: DateTime<Utc>) -> Self {
        Self {
            version: version.into(),
            generated_at,
            order: ManifestOrder::default(),
            files: Vec::new(),
        }
    }

    /// Set the file list order.
    pub fn with_order(mut self, order: ManifestOrder) -> Self {
        self.order = order;
        self
    }

    /// Record a file. The checksum is taken over exactly `data`.
    pub fn add_file(&mut self, path: impl Into<String>, data: &[u8]) -> &FileEntry {
        self.files.push(FileEntry::for_content(path, data));
        &self.files[self.files.len() - 1]
    }

    /// Number of files recorded so far.
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Finalize into a manifest. Calling it again yields the same manifest.
    pub fn build(&self) -> BundleManifest {
        let mut files = self.files.clone();
        if self.order == ManifestOrder::Sorted {
            files.sort_by(|a, b| a.path.cmp(&b.path));
        }
        let content_hash = content_hash(&files);

        BundleManifest {
            version: self.version.clone(),
            generated_at: self.generated_at,
            total_files: files.len(),
            files,
            content_hash,
        }
    }
}
