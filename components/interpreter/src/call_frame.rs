//! Call frame for function call stack management

use std::sync::Arc;

use bytecode_system::FunctionProto;
use core_types::{ObjRef, Value};

/// Call frame representing a script function invocation
///
/// Stored on the context's frame stack. The frame's slot 0 (at
/// `base_pointer`) holds the receiver, or the callee for plain calls;
/// arguments follow.
#[derive(Debug, Clone)]
pub struct CallFrame {
    /// Instruction index to resume the caller at
    pub return_address: usize,
    /// Operand stack index of slot 0
    pub base_pointer: usize,
    /// Function object being executed
    pub function: ObjRef,
    /// Cached prototype of `function`
    pub proto: Arc<FunctionProto>,
    /// Cached materialized constants of `function`
    pub constants: Arc<[Value]>,
    /// Frame runs an initializer; its result is the receiver
    pub constructor: bool,
}

impl CallFrame {
    /// Name used in stack traces
    pub fn function_name(&self) -> Option<&str> {
        self.proto.name.as_deref()
    }
}
