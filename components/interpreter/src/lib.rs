//! Bytecode runtime for an embeddable class-based scripting language
//!
//! This crate provides:
//! - Several execution contexts sharing one heap, globals and class registry
//! - A dispatch loop over `bytecode_system` chunks
//! - Single-inheritance classes with method resolution and binding
//! - A typed bridge for registering host routines as class methods
//! - Fault isolation: an error faults only the context it occurred on
//!
//! # Example
//!
//! ```
//! use bytecode_system::{Chunk, Opcode};
//! use core_types::Value;
//! use interpreter::Runtime;
//!
//! let mut rt = Runtime::new();
//! let mut chunk = Chunk::new();
//! let k = chunk.add_constant("hello");
//! chunk.emit(Opcode::Constant(k));
//! chunk.emit(Opcode::Return);
//!
//! let result = rt.run_chunk(rt.main_context(), &chunk).unwrap();
//! assert_eq!(rt.display(result), "hello");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod call_frame;
pub mod classes;
pub mod config;
pub mod context;
mod diagnostics;
mod dispatch;
mod format;
pub mod native;
mod runtime;
mod shared;

// Re-export main types at crate root
pub use call_frame::CallFrame;
pub use classes::BuiltinKind;
pub use config::{ClassRedefinition, RuntimeConfig};
pub use context::{ContextState, ExecutionContext};
pub use diagnostics::DiagnosticsHandler;
pub use native::{NativeCall, NativeFn, NativeSignature, ParamType};
pub use runtime::Runtime;
pub use shared::SharedRuntime;
