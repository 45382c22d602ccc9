//! The embeddable runtime
//!
//! `Runtime` owns the heap, globals, class registry, native table and every
//! execution context. Hosts drive it through `load_chunk`, `invoke` and the
//! class/native registration calls.

use std::sync::Arc;

use ahash::AHashMap;
use bytecode_system::{Chunk, Constant, FunctionProto};
use core_types::{ContextId, Diagnostic, ErrorKind, ObjRef, RuntimeError, RuntimeResult, Value};
use crossbeam::channel::Receiver;
use memory_manager::{CollectionReport, FunctionObject, Heap, HeapObject, MemoryStats, NameTable};

use crate::classes::ClassRegistry;
use crate::config::RuntimeConfig;
use crate::context::{ContextState, ExecutionContext};
use crate::diagnostics::{DiagnosticsHandler, DiagnosticsSink};
use crate::native::NativeEntry;

/// Embedded scripting runtime
///
/// The runtime manages:
/// - The object heap and its collector
/// - Global variables and the class registry
/// - Host routines exposed as class methods
/// - Any number of execution contexts, one of which is the main context
///
/// # Examples
///
/// ```
/// use bytecode_system::{Chunk, Opcode};
/// use core_types::Value;
/// use interpreter::Runtime;
///
/// let mut rt = Runtime::new();
/// let mut chunk = Chunk::new();
/// let k = chunk.add_constant(40i64);
/// chunk.emit(Opcode::Constant(k));
/// let k = chunk.add_constant(2i64);
/// chunk.emit(Opcode::Constant(k));
/// chunk.emit(Opcode::Add);
/// chunk.emit(Opcode::Return);
///
/// let main = rt.main_context();
/// assert_eq!(rt.run_chunk(main, &chunk).unwrap(), Value::Int(42));
/// ```
pub struct Runtime {
    pub(crate) heap: Heap,
    pub(crate) config: RuntimeConfig,
    pub(crate) classes: ClassRegistry,
    pub(crate) globals: NameTable,
    pub(crate) natives: Vec<NativeEntry>,
    pub(crate) contexts: AHashMap<ContextId, ExecutionContext>,
    pub(crate) next_context: u32,
    pub(crate) main: ContextId,
    /// Values host routines asked to keep alive for the current call
    pub(crate) pins: Vec<Value>,
    pub(crate) diagnostics: DiagnosticsSink,
}

impl Runtime {
    /// Create a runtime with default configuration
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    /// Create a runtime with `config`
    pub fn with_config(config: RuntimeConfig) -> Self {
        let main = ContextId(0);
        let mut contexts = AHashMap::new();
        contexts.insert(main, ExecutionContext::new(main));
        tracing::debug!(
            max_call_depth = config.max_call_depth,
            max_stack_slots = config.max_stack_slots,
            "runtime created"
        );
        Self {
            heap: Heap::with_config(config.gc.clone()),
            config,
            classes: ClassRegistry::default(),
            globals: NameTable::default(),
            natives: Vec::new(),
            contexts,
            next_context: 1,
            main,
            pins: Vec::new(),
            diagnostics: DiagnosticsSink::default(),
        }
    }

    /// Active configuration
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Read-only access to the heap
    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    /// The context created with the runtime
    pub fn main_context(&self) -> ContextId {
        self.main
    }

    /// Create an additional execution context
    pub fn create_context(&mut self) -> ContextId {
        let id = ContextId(self.next_context);
        self.next_context += 1;
        self.contexts.insert(id, ExecutionContext::new(id));
        tracing::debug!(context = %id, "context created");
        id
    }

    /// Current state of context `id`
    pub fn context_state(&self, id: ContextId) -> Option<ContextState> {
        self.contexts.get(&id).map(|c| c.state)
    }

    /// Operand stack of context `id`, bottom first.
    ///
    /// A faulted context keeps the stack it had when the error was raised.
    pub fn context_stack(&self, id: ContextId) -> Option<&[Value]> {
        self.contexts.get(&id).map(|c| c.stack.as_slice())
    }

    /// Clear context `id` and return it to `Ready`
    pub fn reset_context(&mut self, id: ContextId) -> RuntimeResult<()> {
        let ctx = self
            .contexts
            .get_mut(&id)
            .ok_or_else(|| unknown_context(id))?;
        ctx.reset();
        Ok(())
    }

    /// Remove context `id`; the main context cannot be destroyed
    pub fn destroy_context(&mut self, id: ContextId) -> RuntimeResult<()> {
        if id == self.main {
            return Err(RuntimeError::new(
                ErrorKind::ContextUnavailable,
                "the main context cannot be destroyed",
            ));
        }
        self.contexts
            .remove(&id)
            .map(|_| tracing::debug!(context = %id, "context destroyed"))
            .ok_or_else(|| unknown_context(id))
    }

    /// Define or overwrite global `name`
    pub fn set_global(&mut self, name: &str, value: Value) -> RuntimeResult<()> {
        let name = self.heap.intern(name)?;
        self.globals.insert(name, value);
        Ok(())
    }

    /// Look up global `name`, falling back to a class of that name
    pub fn global(&self, name: &str) -> Option<Value> {
        let name = self.heap.lookup_interned(name)?;
        self.globals
            .get(&name)
            .copied()
            .or_else(|| self.classes.get(name).map(Value::Object))
    }

    /// Validate `chunk` and turn it into a callable script function
    ///
    /// # Arguments
    ///
    /// * `chunk` - Top-level code; it takes no arguments and captures nothing
    ///
    /// # Returns
    ///
    /// * `Ok(Value)` - A function value ready for `invoke`
    /// * `Err(RuntimeError)` - `InvalidChunk` if validation fails
    pub fn load_chunk(&mut self, chunk: &Chunk) -> RuntimeResult<Value> {
        chunk.validate(0)?;
        let proto = Arc::new(FunctionProto::script(chunk.clone()));
        self.materialize(proto).map(Value::Object)
    }

    /// Validate and materialize a standalone function prototype
    pub fn load_function(&mut self, proto: Arc<FunctionProto>) -> RuntimeResult<Value> {
        proto.validate()?;
        self.materialize(proto).map(Value::Object)
    }

    /// Allocate a function object for `proto`, resolving its constant pool.
    ///
    /// Strings are interned; nested prototypes become template functions
    /// that `Closure` instructions copy.
    pub(crate) fn materialize(&mut self, proto: Arc<FunctionProto>) -> RuntimeResult<ObjRef> {
        let mut constants = Vec::with_capacity(proto.chunk.constants.len());
        for constant in &proto.chunk.constants {
            let value = match constant {
                Constant::Null => Value::Null,
                Constant::Bool(b) => Value::Bool(*b),
                Constant::Int(n) => Value::Int(*n),
                Constant::Float(n) => Value::Float(*n),
                Constant::Str(s) => Value::Object(self.heap.intern(s)?),
                Constant::Function(nested) => Value::Object(self.materialize(Arc::clone(nested))?),
            };
            constants.push(value);
        }

        self.heap.allocate(HeapObject::Function(FunctionObject {
            upvalues: vec![Value::Null; proto.upvalue_count as usize],
            proto,
            constants: constants.into(),
            class: None,
        }))
    }

    /// Load `chunk` and run it on context `ctx`
    pub fn run_chunk(&mut self, ctx: ContextId, chunk: &Chunk) -> RuntimeResult<Value> {
        let script = match self.load_chunk(chunk) {
            Ok(script) => script,
            Err(err) => {
                tracing::warn!(context = %ctx, error = %err, "chunk rejected");
                return Err(err);
            }
        };
        self.invoke(ctx, script, &[])
    }

    /// Call `callable` with `args` on context `id`.
    ///
    /// On error the context is unwound and left `Faulted` until
    /// `reset_context`, the error carries a stack trace, and a diagnostic is
    /// delivered to the host.
    pub fn invoke(&mut self, id: ContextId, callable: Value, args: &[Value]) -> RuntimeResult<Value> {
        let mut ctx = self.contexts.remove(&id).ok_or_else(|| unknown_context(id))?;
        if !ctx.state.accepts_work() {
            let state = ctx.state;
            self.contexts.insert(id, ctx);
            return Err(RuntimeError::new(
                ErrorKind::ContextUnavailable,
                format!("context {} is {:?}", id, state),
            ));
        }

        ctx.set_state(ContextState::Running);
        let result = self.call_in(&mut ctx, callable, args);
        let result = match result {
            Ok(value) => {
                ctx.set_state(ContextState::Completed);
                Ok(value)
            }
            Err(err) => {
                let err = err.with_trace(ctx.trace());
                ctx.unwind();
                ctx.set_state(ContextState::Faulted);
                tracing::warn!(context = %id, kind = %err.kind, offset = ?err.offset, "{}", err.message);
                self.diagnostics.report(&Diagnostic::from_error(id, &err));
                Err(err)
            }
        };
        self.contexts.insert(id, ctx);
        result
    }

    /// Call `callable` on the main context
    pub fn call(&mut self, callable: Value, args: &[Value]) -> RuntimeResult<Value> {
        self.invoke(self.main, callable, args)
    }

    /// Keep `value` alive until `unpin`
    pub fn pin(&mut self, value: Value) {
        self.pins.push(value);
    }

    /// Release one pin of `value`
    pub fn unpin(&mut self, value: Value) {
        if let Some(i) = self.pins.iter().rposition(|v| v.same(&value)) {
            self.pins.remove(i);
        }
    }

    /// Heap telemetry
    pub fn memory_stats(&self) -> MemoryStats {
        self.heap.stats()
    }

    /// Run a full collection now
    pub fn collect_garbage(&mut self) -> CollectionReport {
        self.collect_with(None)
    }

    /// Collect with every context, global, class and pin as a root.
    ///
    /// `active` is a context currently taken out of the table for execution.
    pub(crate) fn collect_with(&mut self, active: Option<&ExecutionContext>) -> CollectionReport {
        let Self {
            heap,
            contexts,
            globals,
            classes,
            pins,
            ..
        } = self;
        let roots = active
            .into_iter()
            .chain(contexts.values())
            .flat_map(|c| c.roots())
            .chain(
                globals
                    .iter()
                    .flat_map(|(name, value)| [Value::Object(*name), *value]),
            )
            .chain(classes.roots())
            .chain(pins.iter().copied());
        heap.collect(roots)
    }

    /// Install a callback for faulted contexts
    pub fn set_diagnostics_handler(&mut self, handler: DiagnosticsHandler) {
        self.diagnostics.set_handler(handler);
    }

    /// Receive every diagnostic on a channel
    pub fn diagnostics_channel(&mut self) -> Receiver<Diagnostic> {
        self.diagnostics.subscribe()
    }

    /// Tear the runtime down, releasing every heap slot.
    ///
    /// Returns the heap statistics as they were just before release.
    pub fn shutdown(mut self) -> MemoryStats {
        let stats = self.heap.stats();
        self.contexts.clear();
        self.globals.clear();
        self.classes.clear();
        self.pins.clear();
        self.natives.clear();
        self.heap.release_all();
        tracing::debug!(
            live_objects = stats.live_objects,
            live_bytes = stats.live_bytes,
            "runtime shut down"
        );
        stats
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("contexts", &self.contexts.len())
            .field("classes", &self.classes.len())
            .field("globals", &self.globals.len())
            .field("natives", &self.natives.len())
            .field("live_objects", &self.heap.live_objects())
            .finish()
    }
}

fn unknown_context(id: ContextId) -> RuntimeError {
    RuntimeError::new(
        ErrorKind::ContextUnavailable,
        format!("no context {}", id),
    )
}
