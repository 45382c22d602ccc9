//! Bytecode system for the scripting runtime
//!
//! This crate defines the compiled unit the interpreter consumes: an
//! instruction stream plus a constant pool. The compiler that produces chunks
//! lives outside the runtime; this crate only describes, validates, encodes
//! and prints them.
//!
//! # Features
//!
//! - Stack-based instruction set
//! - Constant pool with nested function prototypes
//! - Loader-time validation (constant indices, operand kinds, jump targets)
//! - Binary serialization for precompiled chunk files
//! - Disassembly listings
//!
//! # Example
//!
//! ```
//! use bytecode_system::{Chunk, Constant, Opcode};
//!
//! let mut chunk = Chunk::new();
//!
//! let idx = chunk.add_constant(Constant::Int(42));
//! chunk.emit(Opcode::Constant(idx));
//! chunk.emit(Opcode::Return);
//!
//! chunk.validate(0).unwrap();
//!
//! let bytes = chunk.to_bytes();
//! let restored = Chunk::from_bytes(&bytes).unwrap();
//! assert_eq!(restored, chunk);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chunk;
mod codec;
pub mod constant;
mod disassembler;
pub mod error;
pub mod instruction;
pub mod opcode;

// Re-export main types at crate root
pub use chunk::Chunk;
pub use constant::{Constant, FunctionProto};
pub use error::ChunkError;
pub use instruction::Instruction;
pub use opcode::{Opcode, UpvalueDescriptor};
