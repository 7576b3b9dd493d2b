//! Logging configuration.
//!
//! Precedence, highest first:
//! - `--log-level` / `--log-format`
//! - `FDB_LOG` / `FDB_LOG_FORMAT`
//! - `RUST_LOG`, used verbatim as a filter directive
//! - defaults (info, human)

use clap::ValueEnum;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable console format.
    #[default]
    #[value(alias = "console", alias = "pretty")]
    Human,
    /// Machine-parseable JSON lines.
    #[value(alias = "json")]
    Jsonl,
}

/// Log level filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    #[value(alias = "warning")]
    Warn,
    Error,
    #[value(alias = "none", alias = "quiet")]
    Off,
}

impl LogLevel {
    /// Directive spelling understood by `EnvFilter`.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Off => "off",
        }
    }
}

/// Resolved logging configuration.
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    pub format: LogFormat,
    pub level: LogLevel,
    /// Raw `RUST_LOG` directive; set only when neither the CLI nor `FDB_LOG`
    /// chose a level.
    pub directive: Option<String>,
}

impl LogConfig {
    /// Create config from environment and CLI overrides.
    pub fn from_env(cli_level: Option<LogLevel>, cli_format: Option<LogFormat>) -> Self {
        Self::from_lookup(|name| std::env::var(name).ok(), cli_level, cli_format)
    }

    /// Same as [`LogConfig::from_env`] with an explicit variable lookup.
    pub fn from_lookup<F>(
        lookup: F,
        cli_level: Option<LogLevel>,
        cli_format: Option<LogFormat>,
    ) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_level = lookup("FDB_LOG").and_then(|v| LogLevel::from_str(v.trim(), true).ok());
        let env_format =
            lookup("FDB_LOG_FORMAT").and_then(|v| LogFormat::from_str(v.trim(), true).ok());

        let level = cli_level.or(env_level);
        let directive = match level {
            Some(_) => None,
            None => lookup("RUST_LOG").filter(|v| !v.trim().is_empty()),
        };

        LogConfig {
            format: cli_format.or(env_format).unwrap_or_default(),
            level: level.unwrap_or_default(),
            directive,
        }
    }
}
