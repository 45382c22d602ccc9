//! Command-line arguments

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use interpreter::RuntimeConfig;

use crate::error::{CliError, CliResult};

/// Run a compiled script chunk
#[derive(Debug, Parser)]
#[command(name = "hatch-script", version, about = "Run a compiled script chunk")]
pub struct Cli {
    /// Binary chunk file
    pub chunk: PathBuf,

    /// Print a listing of the chunk before running it
    #[arg(short, long)]
    pub disassemble: bool,

    /// Global callable to invoke once per frame after the chunk runs
    #[arg(short, long)]
    pub entry: Option<String>,

    /// Number of frames to run `--entry` for
    #[arg(long, default_value_t = 1)]
    pub frames: u32,

    /// JSON runtime configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Initial collection threshold in bytes
    #[arg(long)]
    pub gc_threshold: Option<usize>,

    /// Threshold growth factor after each collection
    #[arg(long)]
    pub growth_factor: Option<f64>,

    /// Maximum call depth per context
    #[arg(long)]
    pub max_call_depth: Option<usize>,

    /// Collect at every safe point
    #[arg(long)]
    pub stress_gc: bool,

    /// Print memory telemetry as JSON when done
    #[arg(long)]
    pub stats: bool,

    /// Log filter, overriding RUST_LOG (e.g. `debug`, `interpreter=trace`)
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Cli {
    /// Runtime configuration from `--config`, then individual flags
    pub fn runtime_config(&self) -> CliResult<RuntimeConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = fs::read_to_string(path).map_err(|source| CliError::Io {
                    path: path.clone(),
                    source,
                })?;
                serde_json::from_str(&text).map_err(|source| CliError::Config {
                    path: path.clone(),
                    source,
                })?
            }
            None => RuntimeConfig::default(),
        };

        if let Some(bytes) = self.gc_threshold {
            config.gc = config.gc.with_initial_threshold(bytes);
        }
        if let Some(factor) = self.growth_factor {
            config.gc = config.gc.with_growth_factor(factor);
        }
        if let Some(depth) = self.max_call_depth {
            config = config.with_max_call_depth(depth);
        }
        if self.stress_gc {
            config.gc = config.gc.with_stress(true);
        }
        Ok(config)
    }
}
