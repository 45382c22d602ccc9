//! Heap object kinds
//!
//! Every garbage-collected allocation is one [`HeapObject`] variant. Objects
//! refer to each other only through [`ObjRef`] handles, so the collector can
//! enumerate outgoing edges with [`HeapObject::trace`].

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use ahash::AHashMap;
use bytecode_system::FunctionProto;
use core_types::{ObjRef, Value};
use indexmap::IndexMap;

/// Field and method tables keyed by interned name.
pub type NameTable = AHashMap<ObjRef, Value>;

/// Identifier of a host routine in the runtime's native table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeId(pub u32);

/// Interned string with its precomputed hash.
#[derive(Debug, Clone)]
pub struct StringObject {
    /// Contents
    pub text: Box<str>,
    /// Content hash, fixed at interning time
    pub hash: u64,
}

/// Script function instantiated from a prototype.
#[derive(Debug, Clone)]
pub struct FunctionObject {
    /// Compiled template
    pub proto: Arc<FunctionProto>,
    /// Constant pool materialized as runtime values
    pub constants: Arc<[Value]>,
    /// Captured values, copied at closure creation
    pub upvalues: Vec<Value>,
    /// Owning class when the function is a method
    pub class: Option<ObjRef>,
}

impl FunctionObject {
    /// Declared parameter count
    pub fn arity(&self) -> u8 {
        self.proto.arity
    }

    /// Display name used in traces
    pub fn name(&self) -> &str {
        self.proto.display_name()
    }
}

/// Wrapper that exposes a host routine as a callable value.
#[derive(Debug, Clone)]
pub struct NativeObject {
    /// Interned method name
    pub name: ObjRef,
    /// Index into the native table
    pub id: NativeId,
    /// Class the routine is registered on
    pub class: Option<ObjRef>,
}

/// Class with single inheritance.
#[derive(Debug, Clone)]
pub struct ClassObject {
    /// Interned class name
    pub name: ObjRef,
    /// Parent class
    pub parent: Option<ObjRef>,
    /// Method table (functions and native wrappers)
    pub methods: NameTable,
    /// Class-level fields
    pub statics: NameTable,
    /// Set once the defining chunk closed the class body
    pub finalized: bool,
}

impl ClassObject {
    /// Create an empty, unfinalized class
    pub fn new(name: ObjRef) -> Self {
        Self {
            name,
            parent: None,
            methods: NameTable::default(),
            statics: NameTable::default(),
            finalized: false,
        }
    }
}

/// Instance of a class with an open field table.
#[derive(Debug, Clone)]
pub struct InstanceObject {
    /// Class of the instance
    pub class: ObjRef,
    /// Fields added dynamically
    pub fields: NameTable,
}

/// Receiver paired with a callable.
#[derive(Debug, Clone, Copy)]
pub struct BoundMethodObject {
    /// Value passed as `this`
    pub receiver: Value,
    /// Function or native wrapper
    pub method: ObjRef,
}

/// Map key: heap references compare by handle, primitives by bits.
///
/// Strings are interned, so two string keys with equal content are the same
/// key. `1` and `1.0` are distinct keys.
#[derive(Debug, Clone, Copy)]
pub struct MapKey(pub Value);

impl PartialEq for MapKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.same(&other.0)
    }
}

impl Eq for MapKey {}

impl Hash for MapKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self.0 {
            Value::Null => 0u8.hash(state),
            Value::Bool(b) => (1u8, b).hash(state),
            Value::Int(n) => (2u8, n).hash(state),
            Value::Float(n) => (3u8, n.to_bits()).hash(state),
            Value::Object(r) => (4u8, r).hash(state),
        }
    }
}

/// Insertion-ordered script map.
pub type MapTable = IndexMap<MapKey, Value, ahash::RandomState>;

/// A garbage-collected allocation.
#[derive(Debug, Clone)]
pub enum HeapObject {
    /// Interned string
    String(StringObject),
    /// Script function
    Function(FunctionObject),
    /// Host routine wrapper
    Native(NativeObject),
    /// Class
    Class(ClassObject),
    /// Instance
    Instance(InstanceObject),
    /// Bound method
    BoundMethod(BoundMethodObject),
    /// Ordered sequence
    Array(Vec<Value>),
    /// Key/value mapping
    Map(MapTable),
}

impl HeapObject {
    /// Kind name used in error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            HeapObject::String(_) => "string",
            HeapObject::Function(_) => "function",
            HeapObject::Native(_) => "native function",
            HeapObject::Class(_) => "class",
            HeapObject::Instance(_) => "instance",
            HeapObject::BoundMethod(_) => "bound method",
            HeapObject::Array(_) => "array",
            HeapObject::Map(_) => "map",
        }
    }

    /// True for values that can be called
    pub fn is_callable(&self) -> bool {
        matches!(
            self,
            HeapObject::Function(_)
                | HeapObject::Native(_)
                | HeapObject::BoundMethod(_)
                | HeapObject::Class(_)
        )
    }

    /// Push every handle this object refers to
    pub fn trace(&self, out: &mut Vec<ObjRef>) {
        fn push(value: &Value, out: &mut Vec<ObjRef>) {
            if let Value::Object(r) = value {
                out.push(*r);
            }
        }
        fn push_table(table: &NameTable, out: &mut Vec<ObjRef>) {
            for (name, value) in table {
                out.push(*name);
                push(value, out);
            }
        }

        match self {
            HeapObject::String(_) => {}
            HeapObject::Function(f) => {
                f.constants.iter().for_each(|v| push(v, out));
                f.upvalues.iter().for_each(|v| push(v, out));
                out.extend(f.class);
            }
            HeapObject::Native(n) => {
                out.push(n.name);
                out.extend(n.class);
            }
            HeapObject::Class(c) => {
                out.push(c.name);
                out.extend(c.parent);
                push_table(&c.methods, out);
                push_table(&c.statics, out);
            }
            HeapObject::Instance(i) => {
                out.push(i.class);
                push_table(&i.fields, out);
            }
            HeapObject::BoundMethod(b) => {
                push(&b.receiver, out);
                out.push(b.method);
            }
            HeapObject::Array(items) => items.iter().for_each(|v| push(v, out)),
            HeapObject::Map(map) => {
                for (key, value) in map {
                    push(&key.0, out);
                    push(value, out);
                }
            }
        }
    }

    /// Approximate bytes owned by this object, used for threshold accounting
    pub fn size_hint(&self) -> usize {
        const VALUE: usize = std::mem::size_of::<Value>();
        const ENTRY: usize = std::mem::size_of::<ObjRef>() + VALUE;

        let payload = match self {
            HeapObject::String(s) => s.text.len(),
            HeapObject::Function(f) => f.upvalues.capacity() * VALUE,
            HeapObject::Native(_) | HeapObject::BoundMethod(_) => 0,
            HeapObject::Class(c) => (c.methods.capacity() + c.statics.capacity()) * ENTRY,
            HeapObject::Instance(i) => i.fields.capacity() * ENTRY,
            HeapObject::Array(items) => items.capacity() * VALUE,
            HeapObject::Map(map) => map.capacity() * (2 * VALUE),
        };
        std::mem::size_of::<HeapObject>() + payload
    }
}
