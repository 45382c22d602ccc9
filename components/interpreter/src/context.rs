//! Execution contexts
//!
//! A context is one logical thread of script execution: its own operand
//! stack, frame stack and instruction pointer. Contexts share the runtime's
//! heap, globals and class registry.

use core_types::{ContextId, ObjRef, StackFrame, Value};

use crate::call_frame::CallFrame;

/// Lifecycle state of a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextState {
    /// Created or reset, nothing run yet
    Ready,
    /// Dispatch loop is executing on this context
    Running,
    /// Control is inside a host routine
    SuspendedAtNativeCall,
    /// An unrecovered error aborted the context
    Faulted,
    /// Last invocation finished normally
    Completed,
}

impl ContextState {
    /// True if the context may start a new invocation
    pub fn accepts_work(&self) -> bool {
        matches!(self, ContextState::Ready | ContextState::Completed)
    }
}

/// Execution context for script code
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Identifier within the owning runtime
    pub id: ContextId,
    /// Lifecycle state
    pub state: ContextState,
    /// Operand stack shared by all frames of this context
    pub stack: Vec<Value>,
    /// Active script frames, innermost last
    pub frames: Vec<CallFrame>,
    /// Next instruction of the innermost frame
    pub ip: usize,
    /// Host routines currently active on this context
    pub native_depth: usize,
}

impl ExecutionContext {
    /// Create an empty context
    pub fn new(id: ContextId) -> Self {
        Self {
            id,
            state: ContextState::Ready,
            stack: Vec::with_capacity(256),
            frames: Vec::with_capacity(64),
            ip: 0,
            native_depth: 0,
        }
    }

    /// Transition to `state`
    pub(crate) fn set_state(&mut self, state: ContextState) {
        if self.state != state {
            tracing::trace!(context = %self.id, from = ?self.state, to = ?state, "context state");
            self.state = state;
        }
    }

    /// Innermost frame
    pub fn frame(&self) -> Option<&CallFrame> {
        self.frames.last()
    }

    /// Current call depth
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Values the collector must treat as live
    pub fn roots(&self) -> impl Iterator<Item = Value> + '_ {
        self.stack
            .iter()
            .copied()
            .chain(self.frames.iter().map(|f| Value::Object(f.function)))
    }

    /// Call trace, innermost first
    pub fn trace(&self) -> Vec<StackFrame> {
        let mut offset = self.ip.saturating_sub(1);
        let mut trace = Vec::with_capacity(self.frames.len());
        for frame in self.frames.iter().rev() {
            trace.push(StackFrame {
                function_name: frame.function_name().map(str::to_string),
                offset,
                line: frame.proto.chunk.line_at(offset),
            });
            offset = frame.return_address.saturating_sub(1);
        }
        trace
    }

    /// Drop every frame, keeping the operand stack for inspection
    pub(crate) fn unwind(&mut self) {
        self.frames.clear();
        self.ip = 0;
        self.native_depth = 0;
    }

    /// Clear all state and return to `Ready`
    pub(crate) fn reset(&mut self) {
        self.stack.clear();
        self.frames.clear();
        self.ip = 0;
        self.native_depth = 0;
        self.set_state(ContextState::Ready);
    }

    /// Function object of the innermost frame
    pub fn current_function(&self) -> Option<ObjRef> {
        self.frames.last().map(|f| f.function)
    }
}
