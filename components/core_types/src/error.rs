//! Runtime error types.
//!
//! Every fault the runtime can raise surfaces as a [`RuntimeError`] carrying
//! an [`ErrorKind`]. Faults abort the owning execution context only; the
//! runtime never terminates the process.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::StackFrame;

/// The kind of runtime fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Allocator exhaustion or configured heap limit exceeded
    OutOfMemory,
    /// Malformed compiled input, rejected at load time
    InvalidChunk,
    /// Method resolution miss
    UndefinedMethod,
    /// Field lookup miss
    UndefinedField,
    /// Read of an undefined global
    UndefinedGlobal,
    /// Wrong number of arguments for a call
    ArgumentCountMismatch,
    /// Native argument could not be converted to the host type
    ArgumentTypeMismatch,
    /// Operand of the wrong type for an instruction
    TypeMismatch,
    /// Integer division or remainder by zero
    DivisionByZero,
    /// Container index outside its bounds
    IndexOutOfRange,
    /// Call depth or operand stack limit exceeded
    StackOverflow,
    /// Class name already registered
    DuplicateClass,
    /// Superclass is not a class or would form a cycle
    InvalidInheritance,
    /// Script method added to a finalized class
    SealedClass,
    /// Execution context is unknown, faulted or already running
    ContextUnavailable,
    /// Handle refers to a reclaimed heap slot
    StaleReference,
}

impl ErrorKind {
    /// Stable name of the kind, used in diagnostics and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::OutOfMemory => "OutOfMemory",
            ErrorKind::InvalidChunk => "InvalidChunk",
            ErrorKind::UndefinedMethod => "UndefinedMethod",
            ErrorKind::UndefinedField => "UndefinedField",
            ErrorKind::UndefinedGlobal => "UndefinedGlobal",
            ErrorKind::ArgumentCountMismatch => "ArgumentCountMismatch",
            ErrorKind::ArgumentTypeMismatch => "ArgumentTypeMismatch",
            ErrorKind::TypeMismatch => "TypeMismatch",
            ErrorKind::DivisionByZero => "DivisionByZero",
            ErrorKind::IndexOutOfRange => "IndexOutOfRange",
            ErrorKind::StackOverflow => "StackOverflow",
            ErrorKind::DuplicateClass => "DuplicateClass",
            ErrorKind::InvalidInheritance => "InvalidInheritance",
            ErrorKind::SealedClass => "SealedClass",
            ErrorKind::ContextUnavailable => "ContextUnavailable",
            ErrorKind::StaleReference => "StaleReference",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A runtime fault with message and call trace.
///
/// # Examples
///
/// ```
/// use core_types::{ErrorKind, RuntimeError};
///
/// let error = RuntimeError::new(ErrorKind::DivisionByZero, "integer division by zero")
///     .at_offset(7);
///
/// assert_eq!(error.offset, Some(7));
/// assert_eq!(error.to_string(), "DivisionByZero: integer division by zero");
/// ```
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind}: {message}")]
pub struct RuntimeError {
    /// The kind of fault
    pub kind: ErrorKind,
    /// Human-readable message
    pub message: String,
    /// Instruction offset in the innermost frame, if known
    pub offset: Option<usize>,
    /// Call stack at the time of the fault, innermost first
    pub trace: Vec<StackFrame>,
}

impl RuntimeError {
    /// Create an error without location information.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            offset: None,
            trace: Vec::new(),
        }
    }

    /// Attach the faulting instruction offset unless one is already set.
    pub fn at_offset(mut self, offset: usize) -> Self {
        self.offset.get_or_insert(offset);
        self
    }

    /// Attach a call trace unless one is already set.
    pub fn with_trace(mut self, trace: Vec<StackFrame>) -> Self {
        if self.trace.is_empty() {
            self.trace = trace;
        }
        self
    }
}

/// Result alias used across runtime crates.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
