//! Chunk loading and validation errors

use core_types::{ErrorKind, RuntimeError};
use thiserror::Error;

/// Error raised while decoding or validating a chunk
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChunkError {
    /// Input ended in the middle of a record
    #[error("unexpected end of chunk data at byte {0}")]
    Truncated(usize),
    /// Input does not start with the chunk magic
    #[error("bad magic number")]
    BadMagic,
    /// Format version this build cannot read
    #[error("unsupported chunk format version {0}")]
    UnsupportedVersion(u8),
    /// Unknown opcode tag
    #[error("unknown opcode tag {tag:#04x} at byte {at}")]
    UnknownOpcode {
        /// Tag byte
        tag: u8,
        /// Byte offset
        at: usize,
    },
    /// Unknown constant tag
    #[error("unknown constant tag {tag:#04x} at byte {at}")]
    UnknownConstant {
        /// Tag byte
        tag: u8,
        /// Byte offset
        at: usize,
    },
    /// String payload is not UTF-8
    #[error("invalid UTF-8 in string at byte {0}")]
    InvalidUtf8(usize),
    /// Bytes left over after the chunk
    #[error("{0} trailing bytes after chunk")]
    TrailingBytes(usize),
    /// Constant index past the end of the pool
    #[error("instruction {at}: constant index {index} out of range ({len} constants)")]
    ConstantOutOfRange {
        /// Instruction index
        at: usize,
        /// Offending constant index
        index: u32,
        /// Pool size
        len: usize,
    },
    /// Operand refers to a constant of the wrong kind
    #[error("instruction {at}: expected {expected} constant at index {index}, found {found}")]
    WrongConstantKind {
        /// Instruction index
        at: usize,
        /// Constant index
        index: u32,
        /// Required kind
        expected: &'static str,
        /// Actual kind
        found: &'static str,
    },
    /// Jump target outside the instruction stream
    #[error("instruction {at}: jump target {target} outside 0..{len}")]
    JumpOutOfRange {
        /// Instruction index
        at: usize,
        /// Target index
        target: u32,
        /// Instruction count
        len: usize,
    },
    /// Upvalue index past the function's capture count
    #[error("instruction {at}: upvalue {index} out of range ({count} upvalues)")]
    UpvalueOutOfRange {
        /// Instruction index
        at: usize,
        /// Upvalue index
        index: u16,
        /// Declared capture count
        count: u16,
    },
    /// Closure descriptor count disagrees with the prototype
    #[error("instruction {at}: closure captures {got} values, prototype declares {expected}")]
    CaptureCountMismatch {
        /// Instruction index
        at: usize,
        /// Descriptors supplied
        got: usize,
        /// Prototype upvalue count
        expected: u16,
    },
    /// Error inside a nested function prototype
    #[error("in function '{function}': {source}")]
    Nested {
        /// Function display name
        function: String,
        /// Underlying error
        #[source]
        source: Box<ChunkError>,
    },
}

impl From<ChunkError> for RuntimeError {
    fn from(err: ChunkError) -> Self {
        RuntimeError::new(ErrorKind::InvalidChunk, err.to_string())
    }
}
