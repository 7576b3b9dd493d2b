//! Library side of the `fdb` command-line tool.
//!
//! Holds everything the binary needs that is worth testing on its own:
//! exit codes, logging setup and input loading.

pub mod exit_codes;
pub mod input;
pub mod logging;

pub use exit_codes::ExitCode;
