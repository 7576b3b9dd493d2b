//! Bundle build pipeline.
//!
//! Orchestrates one build: redact, serialize, register with the manifest,
//! buffer in the archive, then write the archive. Every logical file takes
//! the same path through [`Assembler`], so the bytes that are hashed are the
//! bytes that are archived.

use crate::archive::ArchiveWriter;
use crate::layout::{
    self, environment_path, root_dir_name, DEFAULT_PREFIX, DIAGNOSIS_FILE, GRAPH_FILE, LOGS_DIR,
    MANIFEST_FILE, RESOURCES_DIR, SUMMARY_FILE,
};
use crate::manifest::{ManifestBuilder, ManifestOrder, BUNDLE_SCHEMA_VERSION};
use crate::{BundleError, BundleInput, BundleManifest, BundleResult, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use fdb_redact::{PatternRedactor, RedactionPolicy, Redactor};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Options for one build.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Redact sensitive content before archiving. Off unless requested.
    pub redact: bool,
    /// Timestamp for headers, manifest and root directory name. `None` uses
    /// the current time, which makes the archive non-reproducible.
    pub timestamp: Option<DateTime<Utc>>,
    /// Directory that receives the archive.
    pub output_dir: PathBuf,
    /// Dataset name threaded into the root directory name.
    pub dataset_name: Option<String>,
    /// Root directory prefix.
    pub prefix: String,
    /// Manifest file list order.
    pub manifest_order: ManifestOrder,
    /// Policy used when `redact` is set.
    pub redaction_policy: RedactionPolicy,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            redact: false,
            timestamp: None,
            output_dir: PathBuf::from("."),
            dataset_name: None,
            prefix: DEFAULT_PREFIX.to_string(),
            manifest_order: ManifestOrder::default(),
            redaction_policy: RedactionPolicy::default(),
        }
    }
}

impl BuildOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable sensitive data redaction.
    pub fn with_redaction(mut self) -> Self {
        self.redact = true;
        self
    }

    /// Pin the timestamp for deterministic output.
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Set the directory where the archive will be written.
    pub fn with_output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = path.into();
        self
    }

    pub fn with_dataset_name(mut self, name: impl Into<String>) -> Self {
        self.dataset_name = Some(name.into());
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_manifest_order(mut self, order: ManifestOrder) -> Self {
        self.manifest_order = order;
        self
    }

    /// Use a custom redaction policy (only applied with redaction enabled).
    pub fn with_redaction_policy(mut self, policy: RedactionPolicy) -> Self {
        self.redaction_policy = policy;
        self
    }
}

/// Per-build state shared by every logical file.
struct Assembler {
    redactor: Option<PatternRedactor>,
    manifest: ManifestBuilder,
    archive: ArchiveWriter,
    seen: BTreeSet<String>,
}

impl Assembler {
    fn record(&mut self, path: &str, content: Vec<u8>) -> Result<()> {
        if !self.seen.insert(path.to_string()) {
            return Err(BundleError::DuplicatePath(path.to_string()));
        }
        let entry = self.manifest.add_file(path, &content);
        debug!(path, bytes = entry.size, sha256 = %entry.sha256, "Added file to bundle");
        self.archive.add_file(path, content);
        Ok(())
    }

    fn add_structured<T: Serialize + ?Sized>(&mut self, path: &str, value: &T) -> Result<()> {
        let encoded = match &self.redactor {
            Some(redactor) => {
                let clean =
                    redactor
                        .scrub_serialize(value)
                        .map_err(|source| BundleError::Redaction {
                            path: path.to_string(),
                            source,
                        })?;
                serde_json::to_vec_pretty(&clean)
            }
            None => serde_json::to_vec_pretty(value),
        };
        let content = encoded.map_err(|source| BundleError::Serialization {
            path: path.to_string(),
            source,
        })?;
        self.record(path, content)
    }

    fn add_text(&mut self, path: &str, text: &str) -> Result<()> {
        let content = match &self.redactor {
            Some(redactor) => redactor.redact_str(text).into_bytes(),
            None => text.as_bytes().to_vec(),
        };
        self.record(path, content)
    }

    fn add_bytes(&mut self, path: &str, data: &[u8]) -> Result<()> {
        let content = match &self.redactor {
            Some(redactor) => redactor.redact(data),
            None => data.to_vec(),
        };
        self.record(path, content)
    }
}

/// Human-readable summary placed at `summary.txt`.
fn render_summary(input: &BundleInput, timestamp: DateTime<Utc>, dataset: Option<&str>) -> String {
    let mut summary = format!(
        "Fluid Diagnostic Bundle\nGenerated: {}\nIssues: {}\nScore: {}\n",
        timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
        input.diagnosis.issues.len(),
        input.diagnosis.score,
    );
    if !input.metadata.environment.is_empty() {
        summary.push_str(&format!("Environment: {}\n", input.metadata.environment));
    }
    if let Some(name) = dataset {
        summary.push_str(&format!("Dataset: {}\n", name));
    }
    summary
}

/// Assemble every file in memory and return the loaded writer and manifest.
///
/// Nothing touches the filesystem here; any redaction, serialization or path
/// error aborts before an archive exists.
fn assemble(
    input: &BundleInput,
    options: &BuildOptions,
    timestamp: DateTime<Utc>,
) -> Result<(ArchiveWriter, BundleManifest)> {
    layout::validate_dataset_name(&options.prefix)?;
    let dataset = options
        .dataset_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty());
    if let Some(name) = dataset {
        layout::validate_dataset_name(name)?;
    }

    let root_dir = root_dir_name(&options.prefix, dataset, timestamp);
    let redactor = if options.redact {
        Some(PatternRedactor::new(options.redaction_policy.clone())?)
    } else {
        None
    };

    info!(
        root = %root_dir,
        redact = options.redact,
        logs = input.logs.len(),
        resources = input.resources.len(),
        "Assembling bundle"
    );

    let mut asm = Assembler {
        redactor,
        manifest: ManifestBuilder::new(BUNDLE_SCHEMA_VERSION, timestamp)
            .with_order(options.manifest_order),
        archive: ArchiveWriter::new(root_dir, timestamp),
        seen: BTreeSet::new(),
    };

    asm.add_structured(GRAPH_FILE, &input.graph)?;
    asm.add_structured(DIAGNOSIS_FILE, &input.diagnosis)?;
    asm.add_structured(&environment_path(), &input.metadata)?;
    asm.add_text(SUMMARY_FILE, &render_summary(input, timestamp, dataset))?;

    for (name, content) in &input.logs {
        asm.add_bytes(&layout::join(LOGS_DIR, name)?, content)?;
    }
    for (path, content) in &input.resources {
        asm.add_text(&layout::join(RESOURCES_DIR, path)?, content)?;
    }

    // The manifest describes every file but itself.
    let manifest = asm.manifest.build();
    let manifest_bytes =
        serde_json::to_vec_pretty(&manifest).map_err(|source| BundleError::Serialization {
            path: MANIFEST_FILE.to_string(),
            source,
        })?;
    asm.archive.add_file(MANIFEST_FILE, manifest_bytes);

    Ok((asm.archive, manifest))
}

fn resolve_timestamp(options: &BuildOptions) -> DateTime<Utc> {
    match options.timestamp {
        Some(ts) => ts,
        None => {
            warn!("No timestamp supplied; using current time, archive will not be reproducible");
            Utc::now()
        }
    }
}

/// Build a diagnostic bundle and write it to `options.output_dir`.
pub fn build(input: &BundleInput, options: BuildOptions) -> Result<BundleResult> {
    let timestamp = resolve_timestamp(&options);
    let (archive, manifest) = assemble(input, &options, timestamp)?;
    let (archive_path, size_bytes) = archive.write_to_disk(&options.output_dir)?;

    info!(
        path = %archive_path.display(),
        files = manifest.total_files + 1,
        bytes = size_bytes,
        content_hash = %manifest.content_hash,
        "Bundle written"
    );

    Ok(BundleResult {
        archive_path,
        file_count: manifest.total_files + 1,
        manifest,
        size_bytes,
    })
}

/// Build a diagnostic bundle in memory (no filesystem access).
pub fn build_to_vec(input: &BundleInput, options: BuildOptions) -> Result<(Vec<u8>, BundleManifest)> {
    let timestamp = resolve_timestamp(&options);
    let (archive, manifest) = assemble(input, &options, timestamp)?;
    let bytes = archive.write_to_vec()?;
    Ok((bytes, manifest))
}
