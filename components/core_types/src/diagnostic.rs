//! Fault reports delivered to the embedding host.

use serde::{Deserialize, Serialize};

use crate::{ErrorKind, RuntimeError};

/// Identifier of an execution context within a runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContextId(pub u32);

impl std::fmt::Display for ContextId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ctx#{}", self.0)
    }
}

/// Report emitted whenever an execution context faults.
///
/// # Examples
///
/// ```
/// use core_types::{ContextId, Diagnostic, ErrorKind, RuntimeError};
///
/// let err = RuntimeError::new(ErrorKind::UndefinedField, "no field 'hp'").at_offset(4);
/// let diag = Diagnostic::from_error(ContextId(2), &err);
///
/// assert_eq!(diag.kind, ErrorKind::UndefinedField);
/// assert_eq!(diag.context, ContextId(2));
/// assert_eq!(diag.offset, Some(4));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Kind of fault
    pub kind: ErrorKind,
    /// Human-readable message
    pub message: String,
    /// Context that faulted
    pub context: ContextId,
    /// Instruction offset in the innermost frame
    pub offset: Option<usize>,
    /// Rendered call trace, innermost first
    pub trace: Vec<String>,
}

impl Diagnostic {
    /// Build a report for `error` raised by `context`.
    pub fn from_error(context: ContextId, error: &RuntimeError) -> Self {
        Self {
            kind: error.kind,
            message: error.message.clone(),
            context,
            offset: error.offset,
            trace: error.trace.iter().map(ToString::to_string).collect(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.context, self.kind, self.message)?;
        if let Some(offset) = self.offset {
            write!(f, " at offset {}", offset)?;
        }
        Ok(())
    }
}
