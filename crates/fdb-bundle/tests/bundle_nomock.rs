//! No-mock bundle integration tests.
//!
//! Exercises real bundle builds on disk:
//! - Layout and file counts of a typical Fluid bundle
//! - Byte-identical output for identical input and timestamp
//! - Manifest checksums verify on read-back
//! - Redaction of structured data, logs and resources
//! - No partial archive left behind on failure

use chrono::{DateTime, TimeZone, Utc};
use fdb_bundle::{
    build, build_to_vec, BuildOptions, BundleError, BundleInput, BundleMetadata, BundleReader,
    DiagnosticResult, FileEntry, Issue, ManifestOrder, BUNDLE_SCHEMA_VERSION,
};
use serde_json::json;
use tempfile::TempDir;

// ============================================================================
// Helpers
// ============================================================================

fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
}

/// Input shaped like a small Fluid dataset diagnosis.
fn fluid_input() -> BundleInput {
    let mut input = BundleInput {
        graph: json!({"kind": "Dataset", "metadata": {"name": "demo"}})
            .as_object()
            .cloned()
            .unwrap(),
        diagnosis: DiagnosticResult::default(),
        metadata: BundleMetadata {
            environment: "test".to_string(),
            creation_timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            ..BundleMetadata::default()
        },
        ..BundleInput::default()
    };
    input
        .logs
        .insert("test.log".to_string(), b"test content".to_vec());
    input
        .resources
        .insert("dataset.yaml".to_string(), "kind: Dataset\n".to_string());
    input
}

fn options(dir: &TempDir) -> BuildOptions {
    BuildOptions::new()
        .with_redaction()
        .with_timestamp(fixed_time())
        .with_output_dir(dir.path())
}

// ============================================================================
// Layout Tests
// ============================================================================

#[test]
fn test_build_produces_expected_layout() {
    let dir = TempDir::new().expect("temp dir");
    let result = build(&fluid_input(), options(&dir)).expect("build bundle");

    assert!(result.archive_path.is_absolute());
    assert_eq!(
        result.archive_path.file_name().unwrap(),
        "fluid-diagnose-20240101-120000.tar.gz"
    );
    assert!(result.archive_path.exists());

    assert_eq!(result.manifest.total_files, 6);
    assert_eq!(result.file_count, 7);
    assert_eq!(result.file_count, result.manifest.total_files + 1);
    assert_eq!(result.manifest.generated_at, fixed_time());
    assert_eq!(result.manifest.version, BUNDLE_SCHEMA_VERSION);

    let reader = BundleReader::open(&result.archive_path).expect("open bundle");
    assert_eq!(reader.root_dir(), "fluid-diagnose-20240101-120000");
    let mut paths: Vec<&str> = reader.entry_paths().collect();
    paths.sort();
    assert_eq!(
        paths,
        vec![
            "diagnosis.json",
            "graph.json",
            "logs/test.log",
            "metadata/environment.json",
            "resources/dataset.yaml",
            "summary.txt",
        ]
    );
}

#[test]
fn test_build_without_logs_or_resources() {
    let dir = TempDir::new().expect("temp dir");
    let input = BundleInput {
        graph: json!({"kind": "Dataset"}).as_object().cloned().unwrap(),
        ..BundleInput::default()
    };

    let result = build(&input, options(&dir)).expect("build bundle");
    assert_eq!(result.manifest.total_files, 4);
    assert_eq!(result.file_count, 5);
}

#[test]
fn test_size_bytes_counts_every_archived_file() {
    let dir = TempDir::new().expect("temp dir");
    let result = build(&fluid_input(), options(&dir)).expect("build bundle");

    let reader = BundleReader::open(&result.archive_path).expect("open bundle");
    let manifest_len = result.manifest.to_json().unwrap().len() as u64;
    assert_eq!(result.size_bytes, result.manifest.total_bytes() + manifest_len);
    assert!(reader.verify_all().is_empty());
}

#[test]
fn test_summary_is_readable() {
    let dir = TempDir::new().expect("temp dir");
    let mut input = fluid_input();
    input.diagnosis.issues.push(Issue::new("error", "runtime pod crashlooping"));
    input.diagnosis.score = 40;

    let result = build(&input, options(&dir)).expect("build bundle");
    let reader = BundleReader::open(&result.archive_path).expect("open bundle");
    let summary = String::from_utf8(reader.read_verified("summary.txt").unwrap().to_vec()).unwrap();

    assert!(summary.starts_with("Fluid Diagnostic Bundle\n"));
    assert!(summary.contains("Generated: 2024-01-01T12:00:00Z\n"));
    assert!(summary.contains("Issues: 1\n"));
    assert!(summary.contains("Score: 40\n"));
    assert!(summary.contains("Environment: test\n"));
}

// ============================================================================
// Determinism Tests
// ============================================================================

#[test]
fn test_identical_builds_are_byte_identical() {
    let first_dir = TempDir::new().expect("temp dir");
    let second_dir = TempDir::new().expect("temp dir");

    let first = build(&fluid_input(), options(&first_dir)).expect("first build");
    let second = build(&fluid_input(), options(&second_dir)).expect("second build");

    assert_ne!(first.archive_path, second.archive_path);
    let a = std::fs::read(&first.archive_path).unwrap();
    let b = std::fs::read(&second.archive_path).unwrap();
    assert_eq!(a, b, "archives differ for identical input");
    assert_eq!(first.manifest, second.manifest);
}

#[test]
fn test_disk_and_memory_output_match() {
    let dir = TempDir::new().expect("temp dir");
    let result = build(&fluid_input(), options(&dir)).expect("build bundle");
    let (bytes, manifest) = build_to_vec(
        &fluid_input(),
        BuildOptions::new()
            .with_redaction()
            .with_timestamp(fixed_time()),
    )
    .expect("build in memory");

    assert_eq!(std::fs::read(&result.archive_path).unwrap(), bytes);
    assert_eq!(manifest, result.manifest);
}

#[test]
fn test_rebuild_overwrites_existing_archive() {
    let dir = TempDir::new().expect("temp dir");
    let first = build(&fluid_input(), options(&dir)).expect("first build");

    let mut changed = fluid_input();
    changed.logs.insert("more.log".to_string(), b"extra".to_vec());
    let second = build(&changed, options(&dir)).expect("second build");

    assert_eq!(first.archive_path, second.archive_path);
    let reader = BundleReader::open(&second.archive_path).expect("open bundle");
    assert!(reader.has_file("logs/more.log"));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn test_sorted_manifest_order() {
    let (_, manifest) = build_to_vec(
        &fluid_input(),
        BuildOptions::new()
            .with_timestamp(fixed_time())
            .with_manifest_order(ManifestOrder::Sorted),
    )
    .expect("build in memory");

    let paths: Vec<&str> = manifest.files.iter().map(|f| f.path.as_str()).collect();
    let mut sorted = paths.clone();
    sorted.sort();
    assert_eq!(paths, sorted);
    assert!(manifest.validate().is_ok());
}

// ============================================================================
// Manifest Consistency Tests
// ============================================================================

#[test]
fn test_every_listed_file_matches_archive_content() {
    let dir = TempDir::new().expect("temp dir");
    let result = build(&fluid_input(), options(&dir)).expect("build bundle");
    let reader = BundleReader::open(&result.archive_path).expect("open bundle");

    for entry in &result.manifest.files {
        let data = reader
            .read_raw(&entry.path)
            .unwrap_or_else(|e| panic!("missing {}: {}", entry.path, e));
        assert_eq!(data.len() as u64, entry.size, "size mismatch for {}", entry.path);
        assert_eq!(
            FileEntry::compute_checksum(data),
            entry.sha256,
            "checksum mismatch for {}",
            entry.path
        );
    }

    assert!(!reader.has_file("manifest.json"));
    assert_eq!(reader.manifest(), &result.manifest);
}

// ============================================================================
// Redaction Tests
// ============================================================================

#[test]
fn test_redaction_scrubs_structured_and_text() {
    let dir = TempDir::new().expect("temp dir");
    let mut input = fluid_input();
    input.graph = json!({"password": "abc123", "name": "x"})
        .as_object()
        .cloned()
        .unwrap();
    input
        .logs
        .insert("auth.log".to_string(), b"login token=s3cr3t ok\n".to_vec());
    input.resources.insert(
        "secret.yaml".to_string(),
        "apiVersion: v1\nsecret: hunter2\n".to_string(),
    );

    let result = build(&input, options(&dir)).expect("build bundle");
    let reader = BundleReader::open(&result.archive_path).expect("open bundle");

    let graph: serde_json::Value = reader.read_json("graph.json").unwrap();
    assert_eq!(graph, json!({"password": "[REDACTED]", "name": "x"}));

    let log = reader.read_verified("logs/auth.log").unwrap();
    assert_eq!(log, b"login token: [REDACTED] ok\n");

    let resource = reader.read_verified("resources/secret.yaml").unwrap();
    assert_eq!(resource, b"apiVersion: v1\nsecret: [REDACTED]\n");

    for path in reader.entry_paths() {
        let data = String::from_utf8_lossy(reader.read_raw(path).unwrap()).into_owned();
        for canary in ["abc123", "s3cr3t", "hunter2"] {
            assert!(!data.contains(canary), "{canary} leaked into {path}");
        }
    }
}

#[test]
fn test_no_redaction_keeps_content() {
    let dir = TempDir::new().expect("temp dir");
    let mut input = fluid_input();
    input
        .logs
        .insert("auth.log".to_string(), b"token=s3cr3t\n".to_vec());

    let options = BuildOptions::new()
        .with_timestamp(fixed_time())
        .with_output_dir(dir.path());
    let result = build(&input, options).expect("build bundle");
    let reader = BundleReader::open(&result.archive_path).expect("open bundle");

    assert_eq!(reader.read_verified("logs/auth.log").unwrap(), b"token=s3cr3t\n");
}

// ============================================================================
// Failure Tests
// ============================================================================

#[test]
fn test_invalid_log_name_leaves_no_archive() {
    let dir = TempDir::new().expect("temp dir");
    let mut input = fluid_input();
    input
        .logs
        .insert("../../escape.log".to_string(), b"x".to_vec());

    let err = build(&input, options(&dir)).unwrap_err();
    assert!(matches!(err, BundleError::InvalidPath(_)));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_output_dir_is_a_file() {
    let dir = TempDir::new().expect("temp dir");
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"x").unwrap();

    let options = BuildOptions::new()
        .with_timestamp(fixed_time())
        .with_output_dir(&blocker);
    let err = build(&fluid_input(), options).unwrap_err();
    assert!(matches!(err, BundleError::Archive { .. }));
}

#[test]
fn test_tampered_archive_fails_verification() {
    let (bytes, _) = build_to_vec(
        &fluid_input(),
        BuildOptions::new().with_timestamp(fixed_time()),
    )
    .expect("build in memory");

    // Flip one byte in the decompressed stream and re-pack.
    let mut tar_bytes = Vec::new();
    std::io::Read::read_to_end(
        &mut flate2::read::GzDecoder::new(bytes.as_slice()),
        &mut tar_bytes,
    )
    .unwrap();
    let needle = b"test content";
    let pos = tar_bytes
        .windows(needle.len())
        .position(|w| w == needle)
        .expect("log content present");
    tar_bytes[pos] = b'T';

    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    std::io::Write::write_all(&mut encoder, &tar_bytes).unwrap();
    let repacked = encoder.finish().unwrap();

    let reader = BundleReader::from_bytes(repacked).expect("open bundle");
    assert_eq!(reader.verify_all(), vec!["logs/test.log".to_string()]);
    assert!(matches!(
        reader.read_verified("logs/test.log"),
        Err(BundleError::ChecksumMismatch { .. })
    ));
}
