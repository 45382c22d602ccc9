//! Dispatch loop for bytecode execution
//!
//! Handles call setup, the instruction loop and individual opcode semantics.
//! The top of the loop is the only safe point: no partially built values
//! live outside the operand stack there, so the collector may run.

use std::cmp::Ordering;

use bytecode_system::{Opcode, UpvalueDescriptor};
use core_types::{ErrorKind, ObjRef, RuntimeError, RuntimeResult, Value};
use memory_manager::{FunctionObject, HeapObject, MapKey, MapTable};

use crate::call_frame::CallFrame;
use crate::classes::undefined_method;
use crate::context::ExecutionContext;
use crate::Runtime;

fn underflow() -> RuntimeError {
    RuntimeError::new(ErrorKind::InvalidChunk, "operand stack underflow")
}

fn pop(ctx: &mut ExecutionContext) -> RuntimeResult<Value> {
    ctx.stack.pop().ok_or_else(underflow)
}

fn peek(ctx: &ExecutionContext, distance: usize) -> RuntimeResult<Value> {
    ctx.stack
        .len()
        .checked_sub(1 + distance)
        .map(|i| ctx.stack[i])
        .ok_or_else(underflow)
}

fn frame(ctx: &ExecutionContext) -> RuntimeResult<&CallFrame> {
    ctx.frames
        .last()
        .ok_or_else(|| RuntimeError::new(ErrorKind::InvalidChunk, "no active frame"))
}

fn type_error(message: String) -> RuntimeError {
    RuntimeError::new(ErrorKind::TypeMismatch, message)
}

impl Runtime {
    /// Call `callee` with `args` on `ctx` and run until it returns.
    pub(crate) fn call_in(
        &mut self,
        ctx: &mut ExecutionContext,
        callee: Value,
        args: &[Value],
    ) -> RuntimeResult<Value> {
        if ctx.stack.len() + args.len() + 1 > self.config.max_stack_slots {
            return Err(self.stack_overflow());
        }
        let depth = ctx.frames.len();
        let base = ctx.stack.len();
        ctx.stack.push(callee);
        ctx.stack.extend_from_slice(args);

        self.call_value(ctx, callee, args.len())?;
        if ctx.frames.len() > depth {
            self.run(ctx, depth)?;
        }

        let result = ctx.stack.pop().unwrap_or(Value::Null);
        ctx.stack.truncate(base);
        Ok(result)
    }

    /// Start a call of `callee`; receiver and `argc` arguments are on the stack.
    ///
    /// Script functions get a new frame; natives and argument-less
    /// constructions complete immediately with their result on the stack.
    pub(crate) fn call_value(
        &mut self,
        ctx: &mut ExecutionContext,
        callee: Value,
        argc: usize,
    ) -> RuntimeResult<()> {
        let slot = ctx
            .stack
            .len()
            .checked_sub(argc + 1)
            .ok_or_else(underflow)?;
        let handle = match callee {
            Value::Object(r) => r,
            other => return Err(type_error(format!("cannot call {}", other.type_name()))),
        };

        enum Target {
            Function,
            Native(memory_manager::NativeId),
            Bound(Value, ObjRef),
            Class,
        }
        let target = match self.heap.get(handle)? {
            HeapObject::Function(_) => Target::Function,
            HeapObject::Native(n) => Target::Native(n.id),
            HeapObject::BoundMethod(b) => Target::Bound(b.receiver, b.method),
            HeapObject::Class(_) => Target::Class,
            other => return Err(type_error(format!("cannot call {}", other.kind_name()))),
        };

        match target {
            Target::Function => self.push_frame(ctx, handle, argc, false),
            Target::Native(id) => self.call_native(ctx, id, argc),
            Target::Bound(receiver, method) => {
                ctx.stack[slot] = receiver;
                self.call_value(ctx, Value::Object(method), argc)
            }
            Target::Class => self.construct(ctx, handle, slot, argc),
        }
    }

    fn push_frame(
        &mut self,
        ctx: &mut ExecutionContext,
        function: ObjRef,
        argc: usize,
        constructor: bool,
    ) -> RuntimeResult<()> {
        let f = self.heap.function(function)?;
        if f.arity() as usize != argc {
            return Err(RuntimeError::new(
                ErrorKind::ArgumentCountMismatch,
                format!("{} expects {} arguments, got {}", f.name(), f.arity(), argc),
            ));
        }
        if ctx.frames.len() >= self.config.max_call_depth {
            return Err(RuntimeError::new(
                ErrorKind::StackOverflow,
                format!("call depth limit of {} exceeded", self.config.max_call_depth),
            ));
        }

        ctx.frames.push(CallFrame {
            return_address: ctx.ip,
            base_pointer: ctx.stack.len() - 1 - argc,
            function,
            proto: f.proto.clone(),
            constants: f.constants.clone(),
            constructor,
        });
        ctx.ip = 0;
        Ok(())
    }

    fn construct(
        &mut self,
        ctx: &mut ExecutionContext,
        class: ObjRef,
        slot: usize,
        argc: usize,
    ) -> RuntimeResult<()> {
        let instance = self.instantiate(class)?;
        ctx.stack[slot] = instance;

        let init = match self.heap.lookup_interned("init") {
            Some(name) => self.find_method(class, name)?,
            None => None,
        };
        match init {
            Some(Value::Object(m)) if self.heap.function(m).is_ok() => {
                self.push_frame(ctx, m, argc, true)
            }
            Some(init) => {
                self.call_value(ctx, init, argc)?;
                // Non-script initializers complete here; the result is the instance.
                if let Some(top) = ctx.stack.last_mut() {
                    *top = instance;
                }
                Ok(())
            }
            None if argc == 0 => Ok(()),
            None => Err(RuntimeError::new(
                ErrorKind::ArgumentCountMismatch,
                format!(
                    "class '{}' has no init and takes no arguments, got {}",
                    self.class_label(class),
                    argc
                ),
            )),
        }
    }

    fn invoke_method(
        &mut self,
        ctx: &mut ExecutionContext,
        name: ObjRef,
        argc: usize,
    ) -> RuntimeResult<()> {
        let receiver = peek(ctx, argc)?;
        let slot = ctx.stack.len() - 1 - argc;

        // A callable stored in a field shadows a method of the same name.
        if let Some(field) = self.own_field(receiver, name)? {
            ctx.stack[slot] = field;
            return self.call_value(ctx, field, argc);
        }

        let method = match self.class_of(receiver)? {
            Some(class) => self.find_method(class, name)?,
            None => None,
        };
        match method {
            Some(method) => self.call_value(ctx, method, argc),
            None => Err(undefined_method(
                self.heap.string(name)?,
                &self.describe(receiver),
            )),
        }
    }

    /// Pop the innermost frame, leaving its result in place of slot 0.
    ///
    /// Returns the remaining frame depth.
    fn return_from_frame(&mut self, ctx: &mut ExecutionContext) -> usize {
        let result = ctx.stack.pop().unwrap_or(Value::Null);
        let Some(frame) = ctx.frames.pop() else {
            ctx.stack.push(result);
            return 0;
        };
        let result = if frame.constructor {
            ctx.stack
                .get(frame.base_pointer)
                .copied()
                .unwrap_or(result)
        } else {
            result
        };
        ctx.stack.truncate(frame.base_pointer);
        ctx.stack.push(result);
        ctx.ip = frame.return_address;
        ctx.frames.len()
    }

    fn stack_overflow(&self) -> RuntimeError {
        RuntimeError::new(
            ErrorKind::StackOverflow,
            format!(
                "operand stack limit of {} slots exceeded",
                self.config.max_stack_slots
            ),
        )
    }

    /// Execute until the frame depth drops back to `depth`.
    pub(crate) fn run(&mut self, ctx: &mut ExecutionContext, depth: usize) -> RuntimeResult<()> {
        loop {
            // Safe point.
            if self.heap.should_collect() {
                self.collect_with(Some(&*ctx));
            }
            if ctx.stack.len() > self.config.max_stack_slots {
                return Err(self.stack_overflow());
            }

            let at = ctx.ip;
            let opcode = match frame(ctx)?.proto.chunk.instructions.get(at) {
                Some(inst) => inst.opcode.clone(),
                None => {
                    // Falling off the end returns null.
                    ctx.stack.push(Value::Null);
                    if self.return_from_frame(ctx) <= depth {
                        return Ok(());
                    }
                    continue;
                }
            };
            ctx.ip += 1;

            match self.execute(ctx, opcode) {
                Ok(true) => {
                    if self.return_from_frame(ctx) <= depth {
                        return Ok(());
                    }
                }
                Ok(false) => {}
                Err(err) => return Err(err.at_offset(at)),
            }
        }
    }

    /// Execute one instruction; returns true for `Return`.
    fn execute(&mut self, ctx: &mut ExecutionContext, opcode: Opcode) -> RuntimeResult<bool> {
        match opcode {
            Opcode::Constant(k) => {
                let value = self.constant(ctx, k)?;
                ctx.stack.push(value);
            }
            Opcode::Null => ctx.stack.push(Value::Null),
            Opcode::True => ctx.stack.push(Value::Bool(true)),
            Opcode::False => ctx.stack.push(Value::Bool(false)),
            Opcode::Pop => {
                pop(ctx)?;
            }
            Opcode::Dup => {
                let top = peek(ctx, 0)?;
                ctx.stack.push(top);
            }

            Opcode::GetLocal(s) => {
                let index = local_index(ctx, s)?;
                ctx.stack.push(ctx.stack[index]);
            }
            Opcode::SetLocal(s) => {
                let value = pop(ctx)?;
                let index = local_index(ctx, s)?;
                ctx.stack[index] = value;
            }
            Opcode::GetUpvalue(i) => {
                let function = frame(ctx)?.function;
                let value = self
                    .heap
                    .function(function)?
                    .upvalues
                    .get(i as usize)
                    .copied()
                    .ok_or_else(|| bad_upvalue(i))?;
                ctx.stack.push(value);
            }
            Opcode::SetUpvalue(i) => {
                let value = pop(ctx)?;
                let function = frame(ctx)?.function;
                match self.heap.get_mut(function)? {
                    HeapObject::Function(f) => {
                        let cell = f.upvalues.get_mut(i as usize).ok_or_else(|| bad_upvalue(i))?;
                        *cell = value;
                    }
                    other => return Err(type_error(format!("expected function, found {}", other.kind_name()))),
                }
            }
            Opcode::DefineGlobal(k) => {
                let name = self.name(ctx, k)?;
                let value = pop(ctx)?;
                self.globals.insert(name, value);
            }
            Opcode::GetGlobal(k) => {
                let name = self.name(ctx, k)?;
                let value = self.lookup_global(name)?;
                ctx.stack.push(value);
            }
            Opcode::SetGlobal(k) => {
                let name = self.name(ctx, k)?;
                let value = pop(ctx)?;
                match self.globals.get_mut(&name) {
                    Some(slot) => *slot = value,
                    None => return Err(self.undefined_global(name)),
                }
            }

            Opcode::GetField(k) => {
                let name = self.name(ctx, k)?;
                let object = pop(ctx)?;
                let value = self.get_field(object, name)?;
                ctx.stack.push(value);
            }
            Opcode::SetField(k) => {
                let name = self.name(ctx, k)?;
                let value = pop(ctx)?;
                let object = pop(ctx)?;
                self.set_field(object, name, value)?;
            }
            Opcode::GetSuper(k) => {
                let name = self.name(ctx, k)?;
                let receiver = pop(ctx)?;
                let method = self.super_method(ctx.current_function(), name)?;
                let bound = self.bind(method, receiver)?;
                ctx.stack.push(bound);
            }

            Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Div | Opcode::Mod => {
                let b = pop(ctx)?;
                let a = pop(ctx)?;
                let result = self.arithmetic(&opcode, a, b)?;
                ctx.stack.push(result);
            }
            Opcode::Negate => {
                let value = match pop(ctx)? {
                    Value::Int(n) => Value::Int(n.wrapping_neg()),
                    Value::Float(n) => Value::Float(-n),
                    other => {
                        return Err(type_error(format!(
                            "cannot negate {}",
                            self.heap.type_name(other)
                        )))
                    }
                };
                ctx.stack.push(value);
            }
            Opcode::Not => {
                let value = pop(ctx)?;
                ctx.stack.push(Value::Bool(!value.is_truthy()));
            }
            Opcode::Equal | Opcode::NotEqual => {
                let b = pop(ctx)?;
                let a = pop(ctx)?;
                let equal = values_equal(a, b);
                ctx.stack
                    .push(Value::Bool(equal == matches!(opcode, Opcode::Equal)));
            }
            Opcode::Less | Opcode::LessEqual | Opcode::Greater | Opcode::GreaterEqual => {
                let b = pop(ctx)?;
                let a = pop(ctx)?;
                let ordering = self.compare(a, b)?;
                let result = match opcode {
                    Opcode::Less => ordering == Some(Ordering::Less),
                    Opcode::LessEqual => {
                        matches!(ordering, Some(Ordering::Less | Ordering::Equal))
                    }
                    Opcode::Greater => ordering == Some(Ordering::Greater),
                    _ => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
                };
                ctx.stack.push(Value::Bool(result));
            }

            Opcode::Jump(target) => ctx.ip = target as usize,
            Opcode::JumpIfFalse(target) => {
                if !pop(ctx)?.is_truthy() {
                    ctx.ip = target as usize;
                }
            }
            Opcode::Call(argc) => {
                let callee = peek(ctx, argc as usize)?;
                self.call_value(ctx, callee, argc as usize)?;
            }
            Opcode::Invoke(k, argc) => {
                let name = self.name(ctx, k)?;
                self.invoke_method(ctx, name, argc as usize)?;
            }
            Opcode::SuperInvoke(k, argc) => {
                let name = self.name(ctx, k)?;
                peek(ctx, argc as usize)?;
                let method = self.super_method(ctx.current_function(), name)?;
                self.call_value(ctx, method, argc as usize)?;
            }
            Opcode::Return => return Ok(true),

            Opcode::Closure(k, captures) => {
                let closure = self.make_closure(ctx, k, &captures)?;
                ctx.stack.push(closure);
            }
            Opcode::Class(k) => {
                let name = self.name(ctx, k)?;
                let class = self.declare_class(name)?;
                ctx.stack.push(Value::Object(class));
            }
            Opcode::Inherit => {
                let parent = pop(ctx)?;
                let class = self.class_operand(peek(ctx, 0)?)?;
                self.inherit(class, parent)?;
            }
            Opcode::Method(k) => {
                let name = self.name(ctx, k)?;
                let method = pop(ctx)?;
                let class = self.class_operand(peek(ctx, 0)?)?;
                self.add_script_method(class, name, method)?;
            }
            Opcode::EndClass => {
                let class = self.class_operand(pop(ctx)?)?;
                self.finalize_class(class)?;
            }

            Opcode::NewArray(n) => {
                let start = ctx
                    .stack
                    .len()
                    .checked_sub(n as usize)
                    .ok_or_else(underflow)?;
                let items = ctx.stack.split_off(start);
                let array = self.heap.allocate(HeapObject::Array(items))?;
                ctx.stack.push(Value::Object(array));
            }
            Opcode::NewMap(pairs) => {
                let start = ctx
                    .stack
                    .len()
                    .checked_sub(2 * pairs as usize)
                    .ok_or_else(underflow)?;
                let flat = ctx.stack.split_off(start);
                let mut map = MapTable::default();
                for pair in flat.chunks_exact(2) {
                    map.insert(MapKey(pair[0]), pair[1]);
                }
                let map = self.heap.allocate(HeapObject::Map(map))?;
                ctx.stack.push(Value::Object(map));
            }
            Opcode::GetIndex => {
                let index = pop(ctx)?;
                let container = pop(ctx)?;
                let value = self.get_index(container, index)?;
                ctx.stack.push(value);
            }
            Opcode::SetIndex => {
                let value = pop(ctx)?;
                let index = pop(ctx)?;
                let container = pop(ctx)?;
                self.set_index(container, index, value)?;
            }
        }
        Ok(false)
    }

    fn constant(&self, ctx: &ExecutionContext, k: u32) -> RuntimeResult<Value> {
        frame(ctx)?
            .constants
            .get(k as usize)
            .copied()
            .ok_or_else(|| {
                RuntimeError::new(
                    ErrorKind::InvalidChunk,
                    format!("constant index {} out of range", k),
                )
            })
    }

    fn name(&self, ctx: &ExecutionContext, k: u32) -> RuntimeResult<ObjRef> {
        match self.constant(ctx, k)? {
            Value::Object(r) if self.heap.string(r).is_ok() => Ok(r),
            _ => Err(RuntimeError::new(
                ErrorKind::InvalidChunk,
                format!("constant {} is not a name", k),
            )),
        }
    }

    fn class_operand(&self, value: Value) -> RuntimeResult<ObjRef> {
        match value {
            Value::Object(r) if self.heap.class(r).is_ok() => Ok(r),
            other => Err(type_error(format!(
                "expected class, found {}",
                self.heap.type_name(other)
            ))),
        }
    }

    fn make_closure(
        &mut self,
        ctx: &ExecutionContext,
        k: u32,
        captures: &[UpvalueDescriptor],
    ) -> RuntimeResult<Value> {
        let template = match self.constant(ctx, k)? {
            Value::Object(r) => r,
            other => {
                return Err(type_error(format!(
                    "closure constant is {}",
                    other.type_name()
                )))
            }
        };
        let current = frame(ctx)?;
        let enclosing = self.heap.function(current.function)?;

        let mut upvalues = Vec::with_capacity(captures.len());
        for capture in captures {
            let value = if capture.is_local {
                let index = local_index(ctx, capture.index)?;
                ctx.stack[index]
            } else {
                enclosing
                    .upvalues
                    .get(capture.index as usize)
                    .copied()
                    .ok_or_else(|| bad_upvalue(capture.index))?
            };
            upvalues.push(value);
        }

        let owner = enclosing.class;
        let template = self.heap.function(template)?;
        let closure = FunctionObject {
            proto: template.proto.clone(),
            constants: template.constants.clone(),
            upvalues,
            class: owner,
        };
        self.heap
            .allocate(HeapObject::Function(closure))
            .map(Value::Object)
    }

    fn lookup_global(&self, name: ObjRef) -> RuntimeResult<Value> {
        if let Some(value) = self.globals.get(&name) {
            return Ok(*value);
        }
        if let Some(class) = self.classes.get(name) {
            return Ok(Value::Object(class));
        }
        Err(self.undefined_global(name))
    }

    fn undefined_global(&self, name: ObjRef) -> RuntimeError {
        let label = self.heap.string(name).unwrap_or("<stale>");
        RuntimeError::new(
            ErrorKind::UndefinedGlobal,
            format!("undefined global '{}'", label),
        )
    }

    fn arithmetic(&mut self, op: &Opcode, a: Value, b: Value) -> RuntimeResult<Value> {
        if let (Opcode::Add, Some(x), Some(y)) = (op, self.heap.as_str(a), self.heap.as_str(b)) {
            let joined = format!("{}{}", x, y);
            return self.heap.intern(&joined).map(Value::Object);
        }

        match (a, b) {
            (Value::Int(x), Value::Int(y)) => match op {
                Opcode::Add => Ok(Value::Int(x.wrapping_add(y))),
                Opcode::Sub => Ok(Value::Int(x.wrapping_sub(y))),
                Opcode::Mul => Ok(Value::Int(x.wrapping_mul(y))),
                Opcode::Div | Opcode::Mod if y == 0 => Err(RuntimeError::new(
                    ErrorKind::DivisionByZero,
                    "integer division by zero",
                )),
                Opcode::Div => Ok(Value::Int(x.wrapping_div(y))),
                _ => Ok(Value::Int(x.wrapping_rem(y))),
            },
            _ => match (a.as_number(), b.as_number()) {
                (Some(x), Some(y)) => Ok(Value::Float(match op {
                    Opcode::Add => x + y,
                    Opcode::Sub => x - y,
                    Opcode::Mul => x * y,
                    Opcode::Div => x / y,
                    _ => x % y,
                })),
                _ => Err(type_error(format!(
                    "unsupported operands for {:?}: {} and {}",
                    op,
                    self.heap.type_name(a),
                    self.heap.type_name(b)
                ))),
            },
        }
    }

    fn compare(&self, a: Value, b: Value) -> RuntimeResult<Option<Ordering>> {
        match (a, b) {
            (Value::Int(x), Value::Int(y)) => Ok(Some(x.cmp(&y))),
            _ => {
                if let (Some(x), Some(y)) = (a.as_number(), b.as_number()) {
                    return Ok(x.partial_cmp(&y));
                }
                if let (Some(x), Some(y)) = (self.heap.as_str(a), self.heap.as_str(b)) {
                    return Ok(Some(x.cmp(y)));
                }
                Err(type_error(format!(
                    "cannot compare {} and {}",
                    self.heap.type_name(a),
                    self.heap.type_name(b)
                )))
            }
        }
    }

    fn get_index(&self, container: Value, index: Value) -> RuntimeResult<Value> {
        let handle = container
            .as_object()
            .ok_or_else(|| type_error(format!("cannot index {}", container.type_name())))?;
        match self.heap.get(handle)? {
            HeapObject::Array(items) => {
                let i = array_index(index, items.len())?;
                Ok(items[i])
            }
            HeapObject::Map(map) => Ok(map.get(&MapKey(index)).copied().unwrap_or(Value::Null)),
            other => Err(type_error(format!("cannot index {}", other.kind_name()))),
        }
    }

    fn set_index(&mut self, container: Value, index: Value, value: Value) -> RuntimeResult<()> {
        let handle = container
            .as_object()
            .ok_or_else(|| type_error(format!("cannot index {}", container.type_name())))?;
        let checked = match self.heap.get(handle)? {
            HeapObject::Array(items) => Some(array_index(index, items.len())?),
            HeapObject::Map(_) => None,
            other => return Err(type_error(format!("cannot index {}", other.kind_name()))),
        };
        self.heap.update(handle, |obj| match (obj, checked) {
            (HeapObject::Array(items), Some(i)) => items[i] = value,
            (HeapObject::Map(map), _) => {
                map.insert(MapKey(index), value);
            }
            _ => {}
        })
    }
}

fn local_index(ctx: &ExecutionContext, slot: u16) -> RuntimeResult<usize> {
    let index = frame(ctx)?.base_pointer + slot as usize;
    if index < ctx.stack.len() {
        Ok(index)
    } else {
        Err(RuntimeError::new(
            ErrorKind::InvalidChunk,
            format!("local slot {} out of range", slot),
        ))
    }
}

fn bad_upvalue(index: u16) -> RuntimeError {
    RuntimeError::new(
        ErrorKind::InvalidChunk,
        format!("upvalue {} out of range", index),
    )
}

fn array_index(index: Value, len: usize) -> RuntimeResult<usize> {
    match index {
        Value::Int(i) if i >= 0 && (i as usize) < len => Ok(i as usize),
        Value::Int(i) => Err(RuntimeError::new(
            ErrorKind::IndexOutOfRange,
            format!("index {} out of range for length {}", i, len),
        )),
        other => Err(type_error(format!(
            "array index must be int, found {}",
            other.type_name()
        ))),
    }
}

/// Equality: numbers by value across int/float, objects by handle.
pub(crate) fn values_equal(a: Value, b: Value) -> bool {
    match (a, b) {
        (Value::Int(x), Value::Float(y)) | (Value::Float(y), Value::Int(x)) => x as f64 == y,
        _ => a == b,
    }
}
