//! Engine-builtin classes
//!
//! This crate registers the permanent classes every runtime starts with:
//! - `$$FunctionImpl`, `$$ArrayImpl`, `$$MapImpl`, `$$StringImpl`: methods
//!   on functions, arrays, maps and strings
//! - `Math`: numeric routines and constants
//! - `Console`: output captured in a shared buffer
//!
//! # Example
//!
//! ```
//! use bytecode_system::{Chunk, Opcode};
//! use interpreter::Runtime;
//!
//! let mut rt = Runtime::new();
//! let console = builtins::install(&mut rt).unwrap();
//!
//! let mut chunk = Chunk::new();
//! let class = chunk.add_name("Console");
//! let log = chunk.add_name("log");
//! let text = chunk.add_name("ready");
//! chunk.emit(Opcode::GetGlobal(class));
//! chunk.emit(Opcode::Constant(text));
//! chunk.emit(Opcode::Invoke(log, 1));
//! chunk.emit(Opcode::Return);
//!
//! rt.run_chunk(rt.main_context(), &chunk).unwrap();
//! assert_eq!(console.lines(), vec!["ready"]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod array;
pub mod console;
mod function;
mod map;
pub mod math;
pub mod string;

use core_types::RuntimeResult;
use interpreter::{BuiltinKind, Runtime};

// Re-export main types for convenience
pub use console::{ConsoleLevel, ConsoleObject};
pub use math::MathObject;

/// Class backing function, native and bound method values
pub const FUNCTION_CLASS: &str = "$$FunctionImpl";
/// Class backing array values
pub const ARRAY_CLASS: &str = "$$ArrayImpl";
/// Class backing map values
pub const MAP_CLASS: &str = "$$MapImpl";
/// Class backing string values
pub const STRING_CLASS: &str = "$$StringImpl";

/// Register every builtin class on `rt`.
///
/// Classes are permanent and finalized. Returns the console whose buffer
/// receives `Console` output.
pub fn install(rt: &mut Runtime) -> RuntimeResult<ConsoleObject> {
    let kinds = [
        (FUNCTION_CLASS, BuiltinKind::Function, function::install as Installer),
        (ARRAY_CLASS, BuiltinKind::Array, array::install),
        (MAP_CLASS, BuiltinKind::Map, map::install),
        (STRING_CLASS, BuiltinKind::String, string::install),
    ];
    for (name, kind, install) in kinds {
        let class = rt.define_builtin_class(name)?;
        install(rt, class)?;
        rt.set_kind_class(kind, class)?;
        rt.finalize_class(class)?;
    }

    let math = rt.define_builtin_class("Math")?;
    math::install(rt, math)?;
    rt.finalize_class(math)?;

    let console = ConsoleObject::new();
    let class = rt.define_builtin_class("Console")?;
    console::install(rt, class, &console)?;
    rt.finalize_class(class)?;

    tracing::debug!(classes = rt.class_count(), "builtins installed");
    Ok(console)
}

type Installer = fn(&mut Runtime, core_types::ObjRef) -> RuntimeResult<()>;
