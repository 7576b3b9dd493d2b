//! Structured logging for the fdb CLI.
//!
//! - stdout is reserved for command payloads (JSON)
//! - stderr receives all log output (human or JSONL)
//!
//! Library crates only emit `tracing` events; the subscriber is installed
//! here, once, at startup.

pub mod config;

pub use config::{LogConfig, LogFormat, LogLevel};

use std::io::IsTerminal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Crates whose events are shown at the configured level.
const LOG_TARGETS: &[&str] = &["fdb", "fdb_cli", "fdb_bundle", "fdb_redact"];

/// Build the filter directive for a level, e.g. `fdb_bundle=info,...`.
pub fn filter_directive(level: LogLevel) -> String {
    LOG_TARGETS
        .iter()
        .map(|target| format!("{}={}", target, level.as_str()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Build the event filter. A `RUST_LOG` directive is used only when no level
/// was chosen through the CLI or `FDB_LOG`, and falls back to the level when
/// it does not parse.
pub fn build_filter(config: &LogConfig) -> EnvFilter {
    config
        .directive
        .as_deref()
        .and_then(|directive| EnvFilter::try_new(directive).ok())
        .unwrap_or_else(|| EnvFilter::new(filter_directive(config.level)))
}

/// Initialize the logging subsystem.
///
/// Must be called once at startup before any logging occurs.
pub fn init_logging(config: &LogConfig) {
    let filter = build_filter(config);

    match config.format {
        LogFormat::Human => {
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(std::io::stderr().is_terminal());
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .init();
        }
        LogFormat::Jsonl => {
            let json_layer = fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(false)
                .flatten_event(true);
            tracing_subscriber::registry()
                .with(filter)
                .with(json_layer)
                .init();
        }
    }
}
