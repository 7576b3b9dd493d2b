//! Exit codes for the fdb CLI.
//!
//! Exit code ranges:
//! - 0: Success
//! - 10-19: User/environment errors (recoverable by user action)
//! - 20-29: Internal errors

use fdb_bundle::BundleError;

/// Exit codes for fdb operations.
///
/// These codes are a stable contract for automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success
    Clean = 0,

    // ========================================================================
    // User / Environment Errors (10-19)
    // ========================================================================
    /// Invalid arguments or input document
    ArgsError = 10,

    /// Archive failed verification
    VerifyFailed = 12,

    // ========================================================================
    // Internal Errors (20-29)
    // ========================================================================
    /// Bundle could not be built
    InternalError = 20,

    /// I/O error
    IoError = 21,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Stable name for the code, shown next to error messages.
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::VerifyFailed => "ERR_VERIFY",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
        }
    }
}

impl From<&BundleError> for ExitCode {
    fn from(err: &BundleError) -> Self {
        match err {
            BundleError::InvalidPath(_) | BundleError::DuplicatePath(_) | BundleError::Policy(_) => {
                ExitCode::ArgsError
            }
            BundleError::Archive { .. } | BundleError::Io(_) => ExitCode::IoError,
            BundleError::ChecksumMismatch { .. }
            | BundleError::MissingFile(_)
            | BundleError::UnsupportedVersion { .. }
            | BundleError::CorruptedManifest(_)
            | BundleError::UnsafeEntry(_)
            | BundleError::FileNotFound(_) => ExitCode::VerifyFailed,
            BundleError::Redaction { .. }
            | BundleError::Serialization { .. }
            | BundleError::Json(_) => ExitCode::InternalError,
        }
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}
