//! Fixed archive layout.
//!
//! Every bundle has the same shape under one root directory:
//!
//! ```text
//! fluid-diagnose-20240101-120000/
//!   manifest.json
//!   summary.txt
//!   graph.json
//!   diagnosis.json
//!   metadata/environment.json
//!   logs/<filename>
//!   resources/<relative path>
//! ```

use crate::{BundleError, Result};
use chrono::{DateTime, Utc};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const SUMMARY_FILE: &str = "summary.txt";
pub const GRAPH_FILE: &str = "graph.json";
pub const DIAGNOSIS_FILE: &str = "diagnosis.json";
pub const RESOURCES_DIR: &str = "resources";
pub const LOGS_DIR: &str = "logs";
pub const METADATA_DIR: &str = "metadata";
pub const ENVIRONMENT_FILE: &str = "environment.json";

/// Root directory prefix used when the caller does not supply one.
pub const DEFAULT_PREFIX: &str = "fluid-diagnose";

/// Extension of the produced archive file.
pub const ARCHIVE_EXTENSION: &str = "tar.gz";

/// Timestamp format embedded in the root directory name.
const ROOT_TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Compute the archive root directory name.
///
/// `<prefix>-<YYYYMMDD-HHMMSS>`, or `<prefix>-<dataset>-<YYYYMMDD-HHMMSS>`
/// when a dataset name is threaded through.
pub fn root_dir_name(prefix: &str, dataset: Option<&str>, ts: DateTime<Utc>) -> String {
    let stamp = ts.format(ROOT_TIMESTAMP_FORMAT);
    match dataset.map(str::trim).filter(|d| !d.is_empty()) {
        Some(name) => format!("{}-{}-{}", prefix, name, stamp),
        None => format!("{}-{}", prefix, stamp),
    }
}

/// File name of the archive for a root directory.
pub fn archive_file_name(root_dir: &str) -> String {
    format!("{}.{}", root_dir, ARCHIVE_EXTENSION)
}

/// Full entry name inside the archive.
pub fn entry_name(root_dir: &str, path: &str) -> String {
    format!("{}/{}", root_dir, path)
}

/// Archive path of the environment metadata file.
pub fn environment_path() -> String {
    format!("{}/{}", METADATA_DIR, ENVIRONMENT_FILE)
}

/// Join a caller-supplied relative name under a fixed directory.
///
/// The result always uses `/`. Empty and `.` components are dropped, as is a
/// leading `/`. A `..` component or a name with nothing left is rejected so no
/// entry can land outside its directory. Backslashes are rejected since
/// Windows extractors read `a\b.log` as `a/b.log`.
pub fn join(dir: &str, relative: &str) -> Result<String> {
    if relative.contains('\\') {
        return Err(BundleError::InvalidPath(relative.to_string()));
    }
    let mut parts = Vec::new();
    for component in relative.split('/') {
        match component {
            "" | "." => continue,
            ".." => return Err(BundleError::InvalidPath(relative.to_string())),
            c => parts.push(c),
        }
    }
    if parts.is_empty() {
        return Err(BundleError::InvalidPath(relative.to_string()));
    }
    Ok(format!("{}/{}", dir, parts.join("/")))
}

/// Check that a dataset name can be embedded in a directory name.
pub fn validate_dataset_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        && name != "."
        && name != "..";
    if valid {
        Ok(())
    } else {
        Err(BundleError::InvalidPath(name.to_string()))
    }
}
