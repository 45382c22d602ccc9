//! Native bridge
//!
//! Host routines are registered as class methods. A call validates the
//! argument count and types against the routine's [`NativeSignature`] before
//! anything runs, hands the routine a [`NativeCall`] view of its receiver and
//! arguments, and pushes the returned value. Arguments stay on the operand
//! stack for the duration of the call, so the collector always sees them.

use std::sync::Arc;

use core_types::{ErrorKind, ObjRef, RuntimeError, RuntimeResult, Value};
use memory_manager::{Heap, HeapObject, NativeId, NativeObject};

use crate::context::{ContextState, ExecutionContext};
use crate::Runtime;

/// Host routine callable from scripts.
pub type NativeFn = Arc<dyn Fn(&mut NativeCall<'_>) -> RuntimeResult<Value> + Send + Sync>;

/// Expected type of a native argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    /// Any value
    Any,
    /// Integer
    Int,
    /// Float
    Float,
    /// Integer or float
    Number,
    /// Boolean
    Bool,
    /// String object
    String,
    /// Function, native, bound method or class
    Callable,
    /// Class instance
    Instance,
    /// Class object
    Class,
    /// Array object
    Array,
    /// Map object
    Map,
}

impl ParamType {
    /// Name used in mismatch messages
    pub fn name(&self) -> &'static str {
        match self {
            ParamType::Any => "any",
            ParamType::Int => "int",
            ParamType::Float => "float",
            ParamType::Number => "number",
            ParamType::Bool => "bool",
            ParamType::String => "string",
            ParamType::Callable => "callable",
            ParamType::Instance => "instance",
            ParamType::Class => "class",
            ParamType::Array => "array",
            ParamType::Map => "map",
        }
    }

    fn accepts(&self, heap: &Heap, value: Value) -> bool {
        let object = || value.as_object().and_then(|r| heap.get(r).ok());
        match self {
            ParamType::Any => true,
            ParamType::Int => matches!(value, Value::Int(_)),
            ParamType::Float => matches!(value, Value::Float(_)),
            ParamType::Number => value.is_number(),
            ParamType::Bool => matches!(value, Value::Bool(_)),
            ParamType::String => matches!(object(), Some(HeapObject::String(_))),
            ParamType::Callable => object().map(HeapObject::is_callable).unwrap_or(false),
            ParamType::Instance => matches!(object(), Some(HeapObject::Instance(_))),
            ParamType::Class => matches!(object(), Some(HeapObject::Class(_))),
            ParamType::Array => matches!(object(), Some(HeapObject::Array(_))),
            ParamType::Map => matches!(object(), Some(HeapObject::Map(_))),
        }
    }
}

/// Declared parameters of a native routine (receiver excluded).
///
/// # Examples
///
/// ```
/// use interpreter::{NativeSignature, ParamType};
///
/// let sig = NativeSignature::variadic([ParamType::String], ParamType::Any);
/// assert!(sig.accepts_count(1));
/// assert!(sig.accepts_count(4));
/// assert!(!sig.accepts_count(0));
///
/// let fixed = NativeSignature::from(2u8);
/// assert!(fixed.accepts_count(2));
/// assert!(!fixed.accepts_count(3));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeSignature {
    params: Vec<ParamType>,
    rest: Option<ParamType>,
}

impl NativeSignature {
    /// Fixed parameter list
    pub fn new(params: impl Into<Vec<ParamType>>) -> Self {
        Self {
            params: params.into(),
            rest: None,
        }
    }

    /// `arity` untyped parameters
    pub fn any(arity: usize) -> Self {
        Self::new(vec![ParamType::Any; arity])
    }

    /// Required parameters followed by any number of `rest` arguments
    pub fn variadic(params: impl Into<Vec<ParamType>>, rest: ParamType) -> Self {
        Self {
            params: params.into(),
            rest: Some(rest),
        }
    }

    /// Number of required parameters
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// True if extra arguments are accepted
    pub fn is_variadic(&self) -> bool {
        self.rest.is_some()
    }

    /// True if a call with `argc` arguments has the right count
    pub fn accepts_count(&self, argc: usize) -> bool {
        if self.is_variadic() {
            argc >= self.params.len()
        } else {
            argc == self.params.len()
        }
    }

    fn check(&self, heap: &Heap, name: &str, args: &[Value]) -> RuntimeResult<()> {
        if !self.accepts_count(args.len()) {
            let expected = if self.is_variadic() {
                format!("at least {}", self.params.len())
            } else {
                self.params.len().to_string()
            };
            return Err(RuntimeError::new(
                ErrorKind::ArgumentCountMismatch,
                format!("{} expects {} arguments, got {}", name, expected, args.len()),
            ));
        }

        for (i, arg) in args.iter().enumerate() {
            let expected = self
                .params
                .get(i)
                .copied()
                .or(self.rest)
                .unwrap_or(ParamType::Any);
            if !expected.accepts(heap, *arg) {
                return Err(RuntimeError::new(
                    ErrorKind::ArgumentTypeMismatch,
                    format!(
                        "{}: argument {} expected {}, found {}",
                        name,
                        i + 1,
                        expected.name(),
                        heap.type_name(*arg)
                    ),
                ));
            }
        }
        Ok(())
    }
}

impl From<u8> for NativeSignature {
    fn from(arity: u8) -> Self {
        Self::any(arity as usize)
    }
}

impl From<Vec<ParamType>> for NativeSignature {
    fn from(params: Vec<ParamType>) -> Self {
        Self::new(params)
    }
}

impl<const N: usize> From<[ParamType; N]> for NativeSignature {
    fn from(params: [ParamType; N]) -> Self {
        Self::new(params.to_vec())
    }
}

/// Registered host routine.
pub(crate) struct NativeEntry {
    pub(crate) name: String,
    pub(crate) signature: NativeSignature,
    pub(crate) func: NativeFn,
}

/// A native call in progress: receiver, arguments and runtime services.
pub struct NativeCall<'a> {
    runtime: &'a mut Runtime,
    ctx: &'a mut ExecutionContext,
    slot: usize,
    argc: usize,
}

impl<'a> NativeCall<'a> {
    /// Receiver (`this`), or the wrapper itself for a plain call
    pub fn receiver(&self) -> Value {
        self.ctx.stack[self.slot]
    }

    /// Number of arguments
    pub fn argc(&self) -> usize {
        self.argc
    }

    /// All arguments
    pub fn args(&self) -> &[Value] {
        &self.ctx.stack[self.slot + 1..self.slot + 1 + self.argc]
    }

    /// Argument `i`, or null when absent
    pub fn arg(&self, i: usize) -> Value {
        self.args().get(i).copied().unwrap_or(Value::Null)
    }

    /// Argument `i` as an integer
    pub fn int(&self, i: usize) -> RuntimeResult<i64> {
        self.arg(i)
            .as_int()
            .ok_or_else(|| self.mismatch(i, "int"))
    }

    /// Argument `i` as a float (integers widen)
    pub fn number(&self, i: usize) -> RuntimeResult<f64> {
        self.arg(i)
            .as_number()
            .ok_or_else(|| self.mismatch(i, "number"))
    }

    /// Argument `i` as a boolean
    pub fn bool(&self, i: usize) -> RuntimeResult<bool> {
        self.arg(i)
            .as_bool()
            .ok_or_else(|| self.mismatch(i, "bool"))
    }

    /// Argument `i` as string contents
    pub fn str(&self, i: usize) -> RuntimeResult<&str> {
        self.runtime
            .heap
            .as_str(self.arg(i))
            .ok_or_else(|| self.mismatch(i, "string"))
    }

    /// Argument `i` as a heap handle
    pub fn object(&self, i: usize) -> RuntimeResult<ObjRef> {
        self.arg(i)
            .as_object()
            .ok_or_else(|| self.mismatch(i, "object"))
    }

    /// Receiver as a heap handle
    pub fn receiver_object(&self) -> RuntimeResult<ObjRef> {
        self.receiver().as_object().ok_or_else(|| {
            RuntimeError::new(
                ErrorKind::TypeMismatch,
                format!("receiver must be an object, found {}", self.receiver().type_name()),
            )
        })
    }

    fn mismatch(&self, i: usize, expected: &str) -> RuntimeError {
        RuntimeError::new(
            ErrorKind::ArgumentTypeMismatch,
            format!(
                "argument {} expected {}, found {}",
                i + 1,
                expected,
                self.runtime.heap.type_name(self.arg(i))
            ),
        )
    }

    /// Read-only heap access
    pub fn heap(&self) -> &Heap {
        &self.runtime.heap
    }

    /// Allocate a heap object
    pub fn alloc(&mut self, object: HeapObject) -> RuntimeResult<Value> {
        self.runtime.heap.allocate(object).map(Value::Object)
    }

    /// Mutate a heap object, keeping byte accounting current
    pub fn update<R>(
        &mut self,
        handle: ObjRef,
        f: impl FnOnce(&mut HeapObject) -> R,
    ) -> RuntimeResult<R> {
        self.runtime.heap.update(handle, f)
    }

    /// Intern a string and return it as a value
    pub fn intern(&mut self, text: &str) -> RuntimeResult<Value> {
        self.runtime.heap.intern(text).map(Value::Object)
    }

    /// Keep `value` alive until this call returns
    pub fn pin(&mut self, value: Value) {
        self.runtime.pins.push(value);
    }

    /// Pair `method` with `receiver`
    pub fn bind(&mut self, method: Value, receiver: Value) -> RuntimeResult<Value> {
        self.runtime.bind(method, receiver)
    }

    /// Render a value the way `Console` prints it
    pub fn display(&self, value: Value) -> String {
        self.runtime.display(value)
    }

    /// Call back into script code on the same context.
    ///
    /// A collection may run before this returns; values the routine created
    /// and still needs must be pinned first.
    pub fn invoke(&mut self, callable: Value, args: &[Value]) -> RuntimeResult<Value> {
        let (depth, height, ip) = (self.ctx.frames.len(), self.ctx.stack.len(), self.ctx.ip);
        self.ctx.set_state(ContextState::Running);
        let result = self.runtime.call_in(self.ctx, callable, args).map_err(|err| {
            // The routine may recover, so the callee's frames are discarded here.
            let err = err.with_trace(self.ctx.trace());
            self.ctx.frames.truncate(depth);
            self.ctx.stack.truncate(height);
            self.ctx.ip = ip;
            err
        });
        self.ctx.set_state(ContextState::SuspendedAtNativeCall);
        result
    }

    /// Identifier of the calling context
    pub fn context(&self) -> core_types::ContextId {
        self.ctx.id
    }
}

impl Runtime {
    /// Register a host routine as method `name` of `class`.
    ///
    /// Replaces any existing entry with that name, script-defined or not.
    /// Returns the wrapper value.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_types::Value;
    /// use interpreter::{ParamType, Runtime};
    ///
    /// let mut rt = Runtime::new();
    /// let math = rt.define_class("Calc").unwrap();
    /// rt.register_native(math, "twice", [ParamType::Int], |call| {
    ///     Ok(Value::Int(call.int(0)? * 2))
    /// })
    /// .unwrap();
    ///
    /// let twice = rt.resolve_method(math, "twice").unwrap();
    /// let bound = rt.bind(twice, Value::Object(math)).unwrap();
    /// assert_eq!(rt.call(bound, &[Value::Int(21)]).unwrap(), Value::Int(42));
    /// ```
    pub fn register_native<F>(
        &mut self,
        class: ObjRef,
        name: &str,
        signature: impl Into<NativeSignature>,
        func: F,
    ) -> RuntimeResult<Value>
    where
        F: Fn(&mut NativeCall<'_>) -> RuntimeResult<Value> + Send + Sync + 'static,
    {
        // Validate the class before touching the native table.
        let class_name = self.heap.class(class)?.name;
        let class_label = self.heap.string(class_name)?.to_string();

        let id = NativeId(u32::try_from(self.natives.len()).map_err(|_| {
            RuntimeError::new(ErrorKind::OutOfMemory, "native table is full")
        })?);
        let name_ref = self.heap.intern(name)?;
        let wrapper = self.heap.allocate(HeapObject::Native(NativeObject {
            name: name_ref,
            id,
            class: Some(class),
        }))?;

        let signature = signature.into();
        tracing::debug!(
            class = %class_label,
            method = name,
            arity = signature.arity(),
            variadic = signature.is_variadic(),
            "native registered"
        );

        self.natives.push(NativeEntry {
            name: format!("{}.{}", class_label, name),
            signature,
            func: Arc::new(func),
        });
        self.heap.update(class, |obj| {
            if let HeapObject::Class(c) = obj {
                c.methods.insert(name_ref, Value::Object(wrapper));
            }
        })?;
        Ok(Value::Object(wrapper))
    }

    /// Run native `id` with the receiver and `argc` arguments on top of the stack.
    ///
    /// Count and types are validated first; on failure the stack is left
    /// untouched. On success receiver and arguments are replaced by the result.
    pub(crate) fn call_native(
        &mut self,
        ctx: &mut ExecutionContext,
        id: NativeId,
        argc: usize,
    ) -> RuntimeResult<()> {
        let slot = ctx.stack.len() - 1 - argc;
        let entry = self.natives.get(id.0 as usize).ok_or_else(|| {
            RuntimeError::new(ErrorKind::UndefinedMethod, format!("unknown native #{}", id.0))
        })?;
        entry
            .signature
            .check(&self.heap, &entry.name, &ctx.stack[slot + 1..])?;
        if ctx.native_depth >= self.config.max_native_depth {
            return Err(RuntimeError::new(
                ErrorKind::StackOverflow,
                format!(
                    "native call depth limit of {} exceeded in {}",
                    self.config.max_native_depth, entry.name
                ),
            ));
        }
        let func = Arc::clone(&entry.func);

        let resume = ctx.state;
        ctx.set_state(ContextState::SuspendedAtNativeCall);
        ctx.native_depth += 1;
        let pinned = self.pins.len();

        let result = {
            let mut call = NativeCall {
                runtime: &mut *self,
                ctx: &mut *ctx,
                slot,
                argc,
            };
            func(&mut call)
        };

        self.pins.truncate(pinned);
        ctx.native_depth -= 1;
        ctx.set_state(resume);

        let value = result?;
        ctx.stack.truncate(slot);
        ctx.stack.push(value);
        Ok(())
    }
}
