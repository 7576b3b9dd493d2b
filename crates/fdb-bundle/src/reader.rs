//! Bundle reader for opening and verifying diagnostic archives.
//!
//! The archive is decompressed once into memory; every entry must be a
//! regular file under a single root directory.

use crate::layout::MANIFEST_FILE;
use crate::{BundleError, BundleManifest, FileEntry, Result};
use flate2::read::GzDecoder;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Component, Path};
use tar::{Archive, EntryType};
use tracing::{debug, info, warn};

/// Upper bound on total decompressed content accepted from one archive.
pub const MAX_ARCHIVE_BYTES: u64 = 1 << 30;

/// Reader for diagnostic bundles with verification.
#[derive(Debug)]
pub struct BundleReader {
    root_dir: String,
    manifest: BundleManifest,
    files: BTreeMap<String, Vec<u8>>,
}

impl BundleReader {
    /// Open a bundle from a file path.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Open a bundle from bytes.
    pub fn from_bytes(bytes: impl AsRef<[u8]>) -> Result<Self> {
        Self::from_reader(bytes.as_ref())
    }

    /// Create a reader from any gzip-compressed tar stream.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut archive = Archive::new(GzDecoder::new(reader));
        let mut root_dir: Option<String> = None;
        let mut files = BTreeMap::new();
        let mut budget = MAX_ARCHIVE_BYTES;

        for entry in archive.entries()? {
            let mut entry = entry?;
            let raw_path = entry.path()?.to_string_lossy().into_owned();

            if entry.header().entry_type() != EntryType::Regular {
                return Err(BundleError::UnsafeEntry(raw_path));
            }

            let (root, rel) = split_entry_path(&raw_path)?;
            match &root_dir {
                Some(existing) if *existing != root => {
                    return Err(BundleError::UnsafeEntry(raw_path));
                }
                Some(_) => {}
                None => root_dir = Some(root),
            }

            let size = entry.size();
            if size > budget {
                return Err(BundleError::UnsafeEntry(raw_path));
            }
            budget -= size;

            // Header sizes are untrusted; grow with the data actually read.
            let mut data = Vec::new();
            entry.by_ref().take(size).read_to_end(&mut data)?;

            if files.insert(rel, data).is_some() {
                return Err(BundleError::UnsafeEntry(raw_path));
            }
        }

        let root_dir = root_dir.ok_or_else(|| BundleError::MissingFile(MANIFEST_FILE.to_string()))?;
        let manifest_bytes = files
            .remove(MANIFEST_FILE)
            .ok_or_else(|| BundleError::MissingFile(MANIFEST_FILE.to_string()))?;
        let manifest: BundleManifest = serde_json::from_slice(&manifest_bytes)
            .map_err(|e| BundleError::CorruptedManifest(format!("unreadable manifest: {}", e)))?;
        manifest.validate()?;

        info!(
            root = %root_dir,
            files = manifest.total_files,
            content_hash = %manifest.content_hash,
            "Bundle opened"
        );

        Ok(Self {
            root_dir,
            manifest,
            files,
        })
    }

    /// Root directory name inside the archive.
    pub fn root_dir(&self) -> &str {
        &self.root_dir
    }

    /// Get the manifest.
    pub fn manifest(&self) -> &BundleManifest {
        &self.manifest
    }

    /// Paths present in the archive, excluding the manifest, in sorted order.
    pub fn entry_paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Check if a file is listed in the manifest.
    pub fn has_file(&self, path: &str) -> bool {
        self.manifest.find_file(path).is_some()
    }

    /// Read a file from the bundle without verification.
    ///
    /// Use `read_verified` for integrity-checked reads.
    pub fn read_raw(&self, path: &str) -> Result<&[u8]> {
        let data = self
            .files
            .get(path)
            .ok_or_else(|| BundleError::FileNotFound(path.to_string()))?;
        debug!(path, bytes = data.len(), "Read file from bundle (unverified)");
        Ok(data)
    }

    /// Read a file with size and checksum verification against the manifest.
    pub fn read_verified(&self, path: &str) -> Result<&[u8]> {
        let entry = self
            .manifest
            .find_file(path)
            .ok_or_else(|| BundleError::FileNotFound(path.to_string()))?;
        let data = self
            .files
            .get(path)
            .ok_or_else(|| BundleError::MissingFile(path.to_string()))?;

        if !entry.verify(data) {
            return Err(BundleError::ChecksumMismatch {
                path: path.to_string(),
                expected: entry.sha256.clone(),
                actual: FileEntry::compute_checksum(data),
            });
        }

        debug!(path, "File verified");
        Ok(data)
    }

    /// Read and parse a JSON file after verification.
    pub fn read_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        Ok(serde_json::from_slice(self.read_verified(path)?)?)
    }

    /// Verify every listed file and flag archived files the manifest omits.
    ///
    /// Returns the list of paths that failed.
    pub fn verify_all(&self) -> Vec<String> {
        let mut failures: Vec<String> = self
            .manifest
            .files
            .iter()
            .filter_map(|f| match self.read_verified(&f.path) {
                Ok(_) => None,
                Err(e) => {
                    warn!(path = %f.path, error = %e, "Verification failed");
                    Some(f.path.clone())
                }
            })
            .collect();

        for path in self.files.keys() {
            if !self.has_file(path) {
                warn!(path = %path, "File not listed in manifest");
                failures.push(path.clone());
            }
        }

        if failures.is_empty() {
            info!("All files verified");
        } else {
            warn!(failures = ?failures, "Some files failed verification");
        }

        failures
    }
}

/// Split `<root>/<relative>` and reject anything that is not a plain relative
/// path of normal components.
fn split_entry_path(raw: &str) -> Result<(String, String)> {
    let unsafe_entry = || BundleError::UnsafeEntry(raw.to_string());

    let mut parts = Vec::new();
    for component in Path::new(raw).components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str().ok_or_else(unsafe_entry)?),
            _ => return Err(unsafe_entry()),
        }
    }
    if parts.len() < 2 || parts.iter().any(|p| p.contains('\\')) {
        return Err(unsafe_entry());
    }
    Ok((parts[0].to_string(), parts[1..].join("/")))
}
