//! Script runner CLI library
//!
//! Provides argument parsing, error types and the `ScriptRunner` used by
//! the `hatch-script` binary.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cli;
pub mod error;
pub mod runner;

pub use cli::Cli;
pub use error::{CliError, CliResult};
pub use runner::ScriptRunner;
