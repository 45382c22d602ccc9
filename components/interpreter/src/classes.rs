//! Class registry, method resolution and binding.
//!
//! Classes form a single-inheritance chain through `parent` handles.
//! Resolution walks that chain iteratively; a subclass entry always shadows
//! an ancestor entry of the same name.

use ahash::AHashMap;
use core_types::{ErrorKind, ObjRef, RuntimeError, RuntimeResult, Value};
use memory_manager::{BoundMethodObject, ClassObject, HeapObject, InstanceObject, NameTable};

use crate::config::ClassRedefinition;
use crate::Runtime;

/// Value kinds whose methods resolve through a builtin class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinKind {
    /// Functions, natives and bound methods
    Function,
    /// Arrays
    Array,
    /// Maps
    Map,
    /// Strings
    String,
}

/// Name → class table.
#[derive(Debug, Default)]
pub(crate) struct ClassRegistry {
    by_name: AHashMap<ObjRef, ObjRef>,
    kinds: [Option<ObjRef>; 4],
}

impl ClassRegistry {
    pub(crate) fn get(&self, name: ObjRef) -> Option<ObjRef> {
        self.by_name.get(&name).copied()
    }

    pub(crate) fn kind(&self, kind: BuiltinKind) -> Option<ObjRef> {
        self.kinds[kind as usize]
    }

    pub(crate) fn len(&self) -> usize {
        self.by_name.len()
    }

    pub(crate) fn roots(&self) -> impl Iterator<Item = Value> + '_ {
        self.by_name
            .iter()
            .flat_map(|(name, class)| [Value::Object(*name), Value::Object(*class)])
            .chain(self.kinds.iter().flatten().map(|c| Value::Object(*c)))
    }

    pub(crate) fn clear(&mut self) {
        self.by_name.clear();
        self.kinds = [None; 4];
    }
}

pub(crate) fn undefined_method(name: &str, on: &str) -> RuntimeError {
    RuntimeError::new(
        ErrorKind::UndefinedMethod,
        format!("undefined method '{}' on {}", name, on),
    )
}

impl Runtime {
    /// Create and register a class named `name`.
    ///
    /// An existing name is handled per [`ClassRedefinition`]: `Error` fails
    /// with `DuplicateClass`, `Replace` registers the new class and leaves
    /// the old one to existing instances.
    pub fn define_class(&mut self, name: &str) -> RuntimeResult<ObjRef> {
        let name = self.heap.intern(name)?;
        self.declare_class(name)
    }

    /// Define a class that is never collected, for engine builtins
    pub fn define_builtin_class(&mut self, name: &str) -> RuntimeResult<ObjRef> {
        let class = self.define_class(name)?;
        self.heap.set_permanent(class, true)?;
        Ok(class)
    }

    pub(crate) fn declare_class(&mut self, name: ObjRef) -> RuntimeResult<ObjRef> {
        let label = self.heap.string(name)?.to_string();
        if self.classes.get(name).is_some() {
            match self.config.class_redefinition {
                ClassRedefinition::Error => {
                    return Err(RuntimeError::new(
                        ErrorKind::DuplicateClass,
                        format!("class '{}' is already defined", label),
                    ))
                }
                ClassRedefinition::Replace => {
                    tracing::debug!(class = %label, "replacing class definition");
                }
            }
        }

        let class = self
            .heap
            .allocate(HeapObject::Class(ClassObject::new(name)))?;
        self.classes.by_name.insert(name, class);
        tracing::debug!(class = %label, "class defined");
        Ok(class)
    }

    /// Registered class named `name`
    pub fn class_named(&self, name: &str) -> Option<ObjRef> {
        self.heap
            .lookup_interned(name)
            .and_then(|n| self.classes.get(n))
    }

    /// Number of registered classes
    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// Route method calls on values of `kind` through `class`
    pub fn set_kind_class(&mut self, kind: BuiltinKind, class: ObjRef) -> RuntimeResult<()> {
        self.heap.class(class)?;
        self.classes.kinds[kind as usize] = Some(class);
        Ok(())
    }

    /// Make `parent` the superclass of `class`.
    ///
    /// Fails with `InvalidInheritance` if `parent` is not a class, if `class`
    /// already has a parent, or if the link would close a cycle.
    pub fn inherit(&mut self, class: ObjRef, parent: Value) -> RuntimeResult<()> {
        let parent = match parent {
            Value::Object(r) if self.heap.class(r).is_ok() => r,
            other => {
                return Err(RuntimeError::new(
                    ErrorKind::InvalidInheritance,
                    format!("superclass must be a class, found {}", self.heap.type_name(other)),
                ))
            }
        };

        let target = self.heap.class(class)?;
        if target.finalized {
            return Err(RuntimeError::new(
                ErrorKind::SealedClass,
                format!("class '{}' is already finalized", self.class_label(class)),
            ));
        }
        if target.parent.is_some() {
            return Err(RuntimeError::new(
                ErrorKind::InvalidInheritance,
                format!("class '{}' already has a superclass", self.class_label(class)),
            ));
        }

        let mut cursor = Some(parent);
        while let Some(c) = cursor {
            if c == class {
                return Err(RuntimeError::new(
                    ErrorKind::InvalidInheritance,
                    format!("class '{}' cannot inherit from itself", self.class_label(class)),
                ));
            }
            cursor = self.heap.class(c)?.parent;
        }

        self.heap.update(class, |obj| {
            if let HeapObject::Class(c) = obj {
                c.parent = Some(parent);
            }
        })
    }

    /// Add a script method; fails with `SealedClass` once the class is finalized
    pub(crate) fn add_script_method(
        &mut self,
        class: ObjRef,
        name: ObjRef,
        method: Value,
    ) -> RuntimeResult<()> {
        if self.heap.class(class)?.finalized {
            return Err(RuntimeError::new(
                ErrorKind::SealedClass,
                format!(
                    "cannot add method '{}' to finalized class '{}'",
                    self.heap.string(name)?,
                    self.class_label(class)
                ),
            ));
        }

        if let Value::Object(m) = method {
            match self.heap.get_mut(m)? {
                HeapObject::Function(f) => f.class = Some(class),
                HeapObject::Native(n) => n.class = Some(class),
                _ => {}
            }
        }

        self.heap.update(class, |obj| {
            if let HeapObject::Class(c) = obj {
                c.methods.insert(name, method);
            }
        })
    }

    /// Close a class body; script methods can no longer be added
    pub fn finalize_class(&mut self, class: ObjRef) -> RuntimeResult<()> {
        match self.heap.get_mut(class)? {
            HeapObject::Class(c) => {
                c.finalized = true;
                Ok(())
            }
            other => Err(RuntimeError::new(
                ErrorKind::TypeMismatch,
                format!("expected class, found {}", other.kind_name()),
            )),
        }
    }

    /// Look up `name` on `class` and then its ancestors
    pub fn resolve_method(&self, class: ObjRef, name: &str) -> Option<Value> {
        let name = self.heap.lookup_interned(name)?;
        self.find_method(class, name).ok().flatten()
    }

    pub(crate) fn find_method(&self, class: ObjRef, name: ObjRef) -> RuntimeResult<Option<Value>> {
        let mut cursor = Some(class);
        while let Some(c) = cursor {
            let class = self.heap.class(c)?;
            if let Some(method) = class.methods.get(&name) {
                return Ok(Some(*method));
            }
            cursor = class.parent;
        }
        Ok(None)
    }

    /// Pair a callable with a receiver.
    ///
    /// Calling the result with `[x1..xn]` is the same as calling `method`
    /// with `receiver` as `this` and `[x1..xn]` as arguments. The receiver is
    /// not checked against the method's owning class.
    pub fn bind(&mut self, method: Value, receiver: Value) -> RuntimeResult<Value> {
        let callable = match method {
            Value::Object(r) if self.heap.get(r)?.is_callable() => r,
            other => {
                return Err(RuntimeError::new(
                    ErrorKind::TypeMismatch,
                    format!("cannot bind {}", self.heap.type_name(other)),
                ))
            }
        };
        self.heap
            .allocate(HeapObject::BoundMethod(BoundMethodObject {
                receiver,
                method: callable,
            }))
            .map(Value::Object)
    }

    /// Class that methods on `value` resolve through
    pub(crate) fn class_of(&self, value: Value) -> RuntimeResult<Option<ObjRef>> {
        let Value::Object(r) = value else {
            return Ok(None);
        };
        Ok(match self.heap.get(r)? {
            HeapObject::Instance(i) => Some(i.class),
            HeapObject::Class(_) => Some(r),
            HeapObject::Function(_) | HeapObject::Native(_) | HeapObject::BoundMethod(_) => {
                self.classes.kind(BuiltinKind::Function)
            }
            HeapObject::Array(_) => self.classes.kind(BuiltinKind::Array),
            HeapObject::Map(_) => self.classes.kind(BuiltinKind::Map),
            HeapObject::String(_) => self.classes.kind(BuiltinKind::String),
        })
    }

    /// Own field (instance field or class static) named `name`
    pub(crate) fn own_field(&self, value: Value, name: ObjRef) -> RuntimeResult<Option<Value>> {
        let Value::Object(r) = value else {
            return Ok(None);
        };
        Ok(match self.heap.get(r)? {
            HeapObject::Instance(i) => i.fields.get(&name).copied(),
            HeapObject::Class(c) => c.statics.get(&name).copied(),
            _ => None,
        })
    }

    /// Read field `name`, falling back to a method.
    ///
    /// Methods read through a class value come back unbound; through any
    /// other value they are bound to it.
    pub(crate) fn get_field(&mut self, value: Value, name: ObjRef) -> RuntimeResult<Value> {
        if let Some(field) = self.own_field(value, name)? {
            return Ok(field);
        }
        if let Some(class) = self.class_of(value)? {
            if let Some(method) = self.find_method(class, name)? {
                if value == Value::Object(class) {
                    return Ok(method);
                }
                return self.bind(method, value);
            }
        }
        Err(RuntimeError::new(
            ErrorKind::UndefinedField,
            format!(
                "undefined field '{}' on {}",
                self.heap.string(name)?,
                self.describe(value)
            ),
        ))
    }

    /// Write field `name` on an instance (or a static on a class)
    pub(crate) fn set_field(&mut self, target: Value, name: ObjRef, value: Value) -> RuntimeResult<()> {
        let handle = match target {
            Value::Object(r) => r,
            other => {
                return Err(RuntimeError::new(
                    ErrorKind::TypeMismatch,
                    format!("cannot set field on {}", other.type_name()),
                ))
            }
        };
        let kind = self.heap.get(handle)?.kind_name();
        let stored = self.heap.update(handle, |obj| match obj {
            HeapObject::Instance(i) => {
                i.fields.insert(name, value);
                true
            }
            HeapObject::Class(c) => {
                c.statics.insert(name, value);
                true
            }
            _ => false,
        })?;
        if stored {
            Ok(())
        } else {
            Err(RuntimeError::new(
                ErrorKind::TypeMismatch,
                format!("cannot set field on {}", kind),
            ))
        }
    }

    /// Set static field `name` on `class`
    pub fn set_static(&mut self, class: ObjRef, name: &str, value: Value) -> RuntimeResult<()> {
        self.heap.class(class)?;
        let name = self.heap.intern(name)?;
        self.set_field(Value::Object(class), name, value)
    }

    /// Create an empty instance of `class`
    pub fn instantiate(&mut self, class: ObjRef) -> RuntimeResult<Value> {
        self.heap.class(class)?;
        self.heap
            .allocate(HeapObject::Instance(InstanceObject {
                class,
                fields: NameTable::default(),
            }))
            .map(Value::Object)
    }

    /// Method `name` on the superclass of the running method's class
    pub(crate) fn super_method(&self, function: Option<ObjRef>, name: ObjRef) -> RuntimeResult<Value> {
        let label = self.heap.string(name)?.to_string();
        let owner = function
            .and_then(|f| self.heap.function(f).ok())
            .and_then(|f| f.class)
            .ok_or_else(|| undefined_method(&label, "super outside a method"))?;
        let parent = self
            .heap
            .class(owner)?
            .parent
            .ok_or_else(|| undefined_method(&label, &format!("superclass of '{}'", self.class_label(owner))))?;
        self.find_method(parent, name)?
            .ok_or_else(|| undefined_method(&label, &format!("superclass of '{}'", self.class_label(owner))))
    }

    pub(crate) fn class_label(&self, class: ObjRef) -> String {
        self.heap
            .class(class)
            .and_then(|c| self.heap.string(c.name))
            .map(str::to_string)
            .unwrap_or_else(|_| "<stale class>".to_string())
    }

    /// Short description of a value for error messages
    pub(crate) fn describe(&self, value: Value) -> String {
        match value {
            Value::Object(r) => match self.heap.get(r) {
                Ok(HeapObject::Instance(i)) => format!("'{}' instance", self.class_label(i.class)),
                Ok(HeapObject::Class(_)) => format!("class '{}'", self.class_label(r)),
                Ok(other) => other.kind_name().to_string(),
                Err(_) => "stale reference".to_string(),
            },
            other => other.type_name().to_string(),
        }
    }
}
