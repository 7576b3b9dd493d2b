//! fdb - Fluid diagnostic bundler
//!
//! Packages a diagnosis of a Fluid installation into a deterministic,
//! optionally redacted `.tar.gz` bundle, and verifies existing bundles.

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use fdb_bundle::{build, BuildOptions, BundleError, BundleReader, ManifestOrder, RedactionPolicy};
use fdb_cli::exit_codes::ExitCode;
use fdb_cli::input::{self, InputDocument, InputError};
use fdb_cli::logging::{init_logging, LogConfig, LogFormat, LogLevel};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

/// Fluid diagnostic bundler - deterministic, redacted diagnostic archives
#[derive(Parser)]
#[command(name = "fdb")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Log level (trace, debug, info, warn, error, off); overrides FDB_LOG
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    /// Log format on stderr (human, jsonl); overrides FDB_LOG_FORMAT
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a diagnostic bundle
    Build(BuildArgs),

    /// Verify an existing bundle against its manifest
    Verify(VerifyArgs),
}

#[derive(Args, Debug)]
struct BuildArgs {
    /// JSON input document (graph, diagnosis, metadata, logs, resources)
    #[arg(long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Log file to include under logs/ (repeatable)
    #[arg(long = "log", value_name = "FILE")]
    logs: Vec<PathBuf>,

    /// Resource export to include under resources/ (repeatable)
    #[arg(long = "resource", value_name = "REL=FILE")]
    resources: Vec<String>,

    /// Directory that receives the archive
    #[arg(long, env = "FDB_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Redact sensitive data before archiving
    #[arg(long)]
    redact: bool,

    /// Fixed RFC 3339 timestamp for reproducible output
    #[arg(long, value_parser = parse_timestamp)]
    timestamp: Option<DateTime<Utc>>,

    /// Dataset name to include in the root directory name
    #[arg(long)]
    dataset: Option<String>,

    /// List manifest files sorted by path instead of add order
    #[arg(long)]
    sorted_manifest: bool,

    /// Redaction policy file (JSON)
    #[arg(long, env = "FDB_REDACTION_POLICY", value_name = "FILE")]
    redaction_policy: Option<PathBuf>,

    /// Also mask well-known secret formats (cloud keys, tokens, JWTs)
    #[arg(long)]
    detect_secrets: bool,
}

#[derive(Args, Debug)]
struct VerifyArgs {
    /// Bundle archive to verify
    archive: PathBuf,
}

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Bundle(#[from] BundleError),
}

impl CliError {
    fn exit_code(&self) -> ExitCode {
        match self {
            CliError::Input(e) => e.exit_code(),
            CliError::Bundle(e) => ExitCode::from(e),
        }
    }
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| format!("expected RFC 3339 timestamp: {}", e))
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // Help and version go to stdout with success.
            let code = if err.use_stderr() {
                ExitCode::ArgsError.as_i32()
            } else {
                ExitCode::Clean.as_i32()
            };
            let _ = err.print();
            std::process::exit(code);
        }
    };

    let log_config = LogConfig::from_env(cli.global.log_level, cli.global.log_format);
    init_logging(&log_config);

    let exit_code = match &cli.command {
        Commands::Build(args) => run_build(args),
        Commands::Verify(args) => run_verify(args),
    };

    std::process::exit(exit_code.as_i32());
}

fn print_json<T: Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::Clean
        }
        Err(e) => {
            eprintln!("Error: failed to encode output: {}", e);
            ExitCode::InternalError
        }
    }
}

fn build_options(args: &BuildArgs) -> Result<BuildOptions, CliError> {
    let mut options = BuildOptions::new().with_output_dir(&args.output_dir);

    if let Some(ts) = args.timestamp {
        options = options.with_timestamp(ts);
    }
    if let Some(name) = &args.dataset {
        options = options.with_dataset_name(name.clone());
    }
    if args.sorted_manifest {
        options = options.with_manifest_order(ManifestOrder::Sorted);
    }

    let mut policy = match &args.redaction_policy {
        Some(path) => RedactionPolicy::load(path).map_err(InputError::from)?,
        None => RedactionPolicy::default(),
    };
    if args.detect_secrets {
        policy = policy.with_known_secret_detection(true);
    }

    if args.redact {
        options = options.with_redaction().with_redaction_policy(policy);
    } else if args.redaction_policy.is_some() || args.detect_secrets {
        warn!("Redaction policy options have no effect without --redact");
    }

    Ok(options)
}

fn build_bundle(args: &BuildArgs) -> Result<fdb_bundle::BundleResult, CliError> {
    let options = build_options(args)?;

    let document = match &args.input {
        Some(path) => InputDocument::load(path)?,
        None => InputDocument::default(),
    };
    let mut bundle_input = document.into_input(args.timestamp.unwrap_or_else(Utc::now));
    input::add_log_files(&mut bundle_input, &args.logs)?;
    input::add_resource_files(&mut bundle_input, &args.resources)?;

    info!(
        logs = bundle_input.logs.len(),
        resources = bundle_input.resources.len(),
        redact = options.redact,
        "Building bundle"
    );

    Ok(build(&bundle_input, options)?)
}

fn run_build(args: &BuildArgs) -> ExitCode {
    match build_bundle(args) {
        Ok(result) => print_json(&result),
        Err(e) => {
            let code = e.exit_code();
            eprintln!("Error: {} [{}]", e, code);
            code
        }
    }
}

#[derive(Serialize)]
struct VerifyReport<'a> {
    archive: String,
    root: &'a str,
    version: &'a str,
    generated_at: DateTime<Utc>,
    total_files: usize,
    content_hash: &'a str,
    status: &'static str,
    failures: Vec<String>,
}

fn run_verify(args: &VerifyArgs) -> ExitCode {
    let reader = match BundleReader::open(&args.archive) {
        Ok(reader) => reader,
        Err(e) => {
            let code = ExitCode::from(&e);
            eprintln!("Error: {} [{}]", e, code);
            return code;
        }
    };

    let failures = reader.verify_all();
    let manifest = reader.manifest();
    let ok = failures.is_empty();
    let report = VerifyReport {
        archive: args.archive.display().to_string(),
        root: reader.root_dir(),
        version: &manifest.version,
        generated_at: manifest.generated_at,
        total_files: manifest.total_files,
        content_hash: &manifest.content_hash,
        status: if ok { "ok" } else { "failed" },
        failures,
    };

    match print_json(&report) {
        ExitCode::Clean if !ok => ExitCode::VerifyFailed,
        code => code,
    }
}
