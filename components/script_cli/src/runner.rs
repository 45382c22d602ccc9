//! Host-side orchestration of a runtime
//!
//! The runner owns a runtime with builtins installed and a dedicated
//! context, loads chunk files and drives the per-frame entry point.

use std::fs;
use std::path::Path;

use bytecode_system::Chunk;
use builtins::ConsoleObject;
use core_types::{ContextId, Value};
use interpreter::{Runtime, RuntimeConfig};
use memory_manager::MemoryStats;

use crate::error::{CliError, CliResult};

/// Runtime plus the context scripts run on
pub struct ScriptRunner {
    runtime: Runtime,
    console: ConsoleObject,
    context: ContextId,
}

impl ScriptRunner {
    /// Create a runner with builtins installed
    ///
    /// # Example
    /// ```
    /// use interpreter::RuntimeConfig;
    /// use script_cli::ScriptRunner;
    ///
    /// let runner = ScriptRunner::new(RuntimeConfig::default()).unwrap();
    /// assert!(runner.console_lines().is_empty());
    /// ```
    pub fn new(config: RuntimeConfig) -> CliResult<Self> {
        let mut runtime = Runtime::with_config(config);
        let console = builtins::install(&mut runtime)?;
        let context = runtime.create_context();
        Ok(Self {
            runtime,
            console,
            context,
        })
    }

    /// Read and decode a binary chunk file
    pub fn load_file(path: &Path) -> CliResult<Chunk> {
        let bytes = fs::read(path).map_err(|source| CliError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let chunk = Chunk::from_bytes(&bytes)?;
        tracing::debug!(
            path = %path.display(),
            instructions = chunk.instruction_count(),
            constants = chunk.constants.len(),
            "chunk loaded"
        );
        Ok(chunk)
    }

    /// Run `chunk` as top-level code
    pub fn run(&mut self, chunk: &Chunk) -> CliResult<Value> {
        Ok(self.runtime.run_chunk(self.context, chunk)?)
    }

    /// Call global `entry` once per frame; returns the last frame's result
    ///
    /// The global is resolved again each frame, so a script may rebind it.
    pub fn run_frames(&mut self, entry: &str, frames: u32) -> CliResult<Value> {
        let mut last = Value::Null;
        for frame in 0..frames {
            let callable = self
                .runtime
                .global(entry)
                .ok_or_else(|| CliError::MissingEntry(entry.to_string()))?;
            last = self.runtime.invoke(self.context, callable, &[])?;
            tracing::trace!(frame, "frame complete");
        }
        Ok(last)
    }

    /// Render a value for output
    pub fn display(&self, value: Value) -> String {
        self.runtime.display(value)
    }

    /// Console lines written so far
    pub fn console_lines(&self) -> Vec<String> {
        self.console.lines()
    }

    /// Remove and return buffered console lines
    pub fn take_console(&self) -> Vec<String> {
        self.console.take()
    }

    /// Heap telemetry
    pub fn stats(&self) -> MemoryStats {
        self.runtime.memory_stats()
    }

    /// Heap telemetry as pretty-printed JSON
    pub fn stats_json(&self) -> CliResult<String> {
        serde_json::to_string_pretty(&self.stats()).map_err(CliError::Stats)
    }

    /// Underlying runtime
    pub fn runtime_mut(&mut self) -> &mut Runtime {
        &mut self.runtime
    }

    /// Release the runtime
    pub fn shutdown(self) -> MemoryStats {
        self.runtime.shutdown()
    }
}
