//! Error types for the CLI

use std::path::PathBuf;

use bytecode_system::ChunkError;
use core_types::RuntimeError;
use thiserror::Error;

/// CLI-specific errors
#[derive(Debug, Error)]
pub enum CliError {
    /// Script execution error
    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    /// Chunk file could not be decoded or validated
    #[error("invalid chunk: {0}")]
    Chunk(#[from] ChunkError),

    /// File I/O error
    #[error("cannot read '{}': {source}", path.display())]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed
    #[error("invalid config '{}': {source}", path.display())]
    Config {
        /// Config file
        path: PathBuf,
        /// Parse error
        #[source]
        source: serde_json::Error,
    },

    /// `--entry` names a global that does not exist
    #[error("entry point '{0}' is not defined")]
    MissingEntry(String),

    /// Telemetry could not be serialized
    #[error("cannot render stats: {0}")]
    Stats(#[source] serde_json::Error),
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
