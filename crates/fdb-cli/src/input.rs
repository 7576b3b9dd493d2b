//! Loading bundle input from disk.
//!
//! The input document is JSON with optional `graph`, `diagnosis`, `metadata`,
//! `logs` and `resources` fields. Log and resource files named on the command
//! line are merged in after the document.

use chrono::{DateTime, Utc};
use fdb_bundle::{BundleInput, BundleMetadata, DiagnosticResult, ResourceGraph};
use fdb_redact::RedactionError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::exit_codes::ExitCode;

/// Errors raised while assembling input for a build.
#[derive(Error, Debug)]
pub enum InputError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid input document {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid resource '{0}': expected <relative path>=<file>")]
    ResourceSpec(String),

    #[error("log file has no usable name: {}", .0.display())]
    LogName(PathBuf),

    #[error("{kind} '{name}' given more than once")]
    Duplicate { kind: &'static str, name: String },

    #[error("resource {} is not valid UTF-8", .0.display())]
    NotUtf8(PathBuf),

    #[error("invalid redaction policy: {0}")]
    Policy(#[from] RedactionError),
}

impl InputError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            InputError::Read { .. } => ExitCode::IoError,
            _ => ExitCode::ArgsError,
        }
    }
}

pub type Result<T> = std::result::Result<T, InputError>;

/// On-disk shape of a bundle input document.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputDocument {
    pub graph: ResourceGraph,
    pub diagnosis: DiagnosticResult,
    pub metadata: Option<BundleMetadata>,
    /// Inline log text (filename -> content).
    pub logs: BTreeMap<String, String>,
    /// Inline resource exports (relative path -> content).
    pub resources: BTreeMap<String, String>,
}

impl InputDocument {
    /// Read and parse a document.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read(path).map_err(|source| InputError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&raw).map_err(|source| InputError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Convert into bundle input. A missing metadata block is stamped with
    /// `created_at`.
    pub fn into_input(self, created_at: DateTime<Utc>) -> BundleInput {
        BundleInput {
            graph: self.graph,
            diagnosis: self.diagnosis,
            metadata: self.metadata.unwrap_or_else(|| BundleMetadata {
                creation_timestamp: created_at,
                ..BundleMetadata::default()
            }),
            logs: self
                .logs
                .into_iter()
                .map(|(name, text)| (name, text.into_bytes()))
                .collect(),
            resources: self.resources,
        }
    }
}

/// Parse a `<relative path>=<file>` resource argument.
pub fn parse_resource_spec(spec: &str) -> Result<(String, PathBuf)> {
    match spec.split_once('=') {
        Some((rel, file)) if !rel.trim().is_empty() && !file.trim().is_empty() => {
            Ok((rel.trim().to_string(), PathBuf::from(file.trim())))
        }
        _ => Err(InputError::ResourceSpec(spec.to_string())),
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|source| InputError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Add log files, keyed by their file name.
pub fn add_log_files(input: &mut BundleInput, files: &[PathBuf]) -> Result<()> {
    for path in files {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| InputError::LogName(path.clone()))?
            .to_string();
        if input.logs.contains_key(&name) {
            return Err(InputError::Duplicate { kind: "log", name });
        }
        let content = read_file(path)?;
        debug!(log = %name, bytes = content.len(), "Loaded log file");
        input.logs.insert(name, content);
    }
    Ok(())
}

/// Add resource files given as `<relative path>=<file>`.
pub fn add_resource_files(input: &mut BundleInput, specs: &[String]) -> Result<()> {
    for spec in specs {
        let (rel, path) = parse_resource_spec(spec)?;
        if input.resources.contains_key(&rel) {
            return Err(InputError::Duplicate {
                kind: "resource",
                name: rel,
            });
        }
        let content =
            String::from_utf8(read_file(&path)?).map_err(|_| InputError::NotUtf8(path.clone()))?;
        debug!(resource = %rel, bytes = content.len(), "Loaded resource file");
        input.resources.insert(rel, content);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_load_full_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("input.json");
        std::fs::write(
            &path,
            r#"{
                "graph": {"kind": "Dataset"},
                "diagnosis": {"issues": [{"level": "warning", "message": "slow"}], "score": 70},
                "metadata": {"creationTimestamp": "2024-01-01T00:00:00Z", "environment": "ci"},
                "logs": {"controller.log": "started\n"},
                "resources": {"dataset.yaml": "kind: Dataset\n"}
            }"#,
        )
        .unwrap();

        let input = InputDocument::load(&path).unwrap().into_input(ts());
        assert_eq!(input.graph["kind"], "Dataset");
        assert_eq!(input.diagnosis.score, 70);
        assert_eq!(input.metadata.environment, "ci");
        assert_eq!(input.metadata.fluid_version, "");
        assert_eq!(input.logs["controller.log"], b"started\n");
        assert_eq!(input.resources["dataset.yaml"], "kind: Dataset\n");
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("input.json");
        std::fs::write(&path, "{}").unwrap();

        let input = InputDocument::load(&path).unwrap().into_input(ts());
        assert!(input.graph.is_empty());
        assert_eq!(input.metadata.creation_timestamp, ts());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("input.json");
        std::fs::write(&path, r#"{"grahp": {}}"#).unwrap();

        let err = InputDocument::load(&path).unwrap_err();
        assert!(matches!(err, InputError::Parse { .. }));
        assert_eq!(err.exit_code(), ExitCode::ArgsError);
    }

    #[test]
    fn test_missing_document_is_io_error() {
        let err = InputDocument::load(Path::new("/nonexistent/input.json")).unwrap_err();
        assert_eq!(err.exit_code(), ExitCode::IoError);
    }

    #[test]
    fn test_parse_resource_spec() {
        let (rel, file) = parse_resource_spec("default/dataset.yaml=/tmp/ds.yaml").unwrap();
        assert_eq!(rel, "default/dataset.yaml");
        assert_eq!(file, PathBuf::from("/tmp/ds.yaml"));

        assert!(parse_resource_spec("no-equals").is_err());
        assert!(parse_resource_spec("=file").is_err());
        assert!(parse_resource_spec("rel=").is_err());
    }

    #[test]
    fn test_add_log_files() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("runtime.log");
        std::fs::write(&log, b"\x00binary\xff").unwrap();

        let mut input = BundleInput::default();
        add_log_files(&mut input, std::slice::from_ref(&log)).unwrap();
        assert_eq!(input.logs["runtime.log"], b"\x00binary\xff");

        let err = add_log_files(&mut input, &[log]).unwrap_err();
        assert!(matches!(err, InputError::Duplicate { kind: "log", .. }));
    }

    #[test]
    fn test_add_resource_files() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("ds.yaml");
        std::fs::write(&file, "kind: Dataset\n").unwrap();

        let mut input = BundleInput::default();
        let spec = format!("default/dataset.yaml={}", file.display());
        add_resource_files(&mut input, &[spec]).unwrap();
        assert_eq!(input.resources["default/dataset.yaml"], "kind: Dataset\n");
    }

    #[test]
    fn test_non_utf8_resource_rejected() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("bin.yaml");
        std::fs::write(&file, b"\xff\xfe").unwrap();

        let mut input = BundleInput::default();
        let spec = format!("bin.yaml={}", file.display());
        let err = add_resource_files(&mut input, &[spec]).unwrap_err();
        assert!(matches!(err, InputError::NotUtf8(_)));
    }
}
