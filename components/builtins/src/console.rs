//! Console class
//!
//! `Console.log`, `Console.warn` and `Console.error` render their arguments,
//! append the line to a shared output buffer and emit a `tracing` event.

use std::sync::Arc;

use core_types::{ObjRef, RuntimeResult, Value};
use interpreter::{NativeCall, NativeSignature, ParamType, Runtime};
use parking_lot::Mutex;

/// Severity of a console line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleLevel {
    /// `Console.log`
    Log,
    /// `Console.warn`
    Warn,
    /// `Console.error`
    Error,
}

impl ConsoleLevel {
    fn prefix(&self) -> &'static str {
        match self {
            ConsoleLevel::Log => "",
            ConsoleLevel::Warn => "Warning: ",
            ConsoleLevel::Error => "Error: ",
        }
    }
}

/// Captured console output, shared between the runtime and the host
#[derive(Debug, Clone, Default)]
pub struct ConsoleObject {
    output: Arc<Mutex<Vec<String>>>,
}

impl ConsoleObject {
    /// Create a console with an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one line at `level`
    pub fn write(&self, level: ConsoleLevel, message: &str) {
        let line = format!("{}{}", level.prefix(), message);
        match level {
            ConsoleLevel::Log => tracing::info!(target: "console", "{}", message),
            ConsoleLevel::Warn => tracing::warn!(target: "console", "{}", message),
            ConsoleLevel::Error => tracing::error!(target: "console", "{}", message),
        }
        self.output.lock().push(line);
    }

    /// Lines written so far
    pub fn lines(&self) -> Vec<String> {
        self.output.lock().clone()
    }

    /// Remove and return the buffered lines
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.output.lock())
    }

    /// Clear the buffer
    pub fn clear(&self) {
        self.output.lock().clear();
    }
}

/// Space-separated display of every argument
fn format_values(call: &NativeCall<'_>) -> String {
    call.args()
        .iter()
        .map(|v| call.display(*v))
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn install(rt: &mut Runtime, class: ObjRef, console: &ConsoleObject) -> RuntimeResult<()> {
    for (name, level) in [
        ("log", ConsoleLevel::Log),
        ("warn", ConsoleLevel::Warn),
        ("error", ConsoleLevel::Error),
    ] {
        let console = console.clone();
        rt.register_native(
            class,
            name,
            NativeSignature::variadic(Vec::<ParamType>::new(), ParamType::Any),
            move |call| {
                console.write(level, &format_values(call));
                Ok(Value::Null)
            },
        )?;
    }
    Ok(())
}
