//! Tagged value representation.
//!
//! `Value` is the fixed-size, copyable currency of the interpreter. Primitive
//! payloads are stored inline; heap payloads are non-owning [`ObjRef`]
//! handles into the managed heap, which remains the sole owner.

use std::fmt;

/// Handle to an object owned by the managed heap.
///
/// `index` selects the heap slot, `generation` detects use of a handle whose
/// slot has since been reclaimed and reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjRef {
    /// Slot index in the heap arena
    pub index: u32,
    /// Generation of the slot at the time the handle was issued
    pub generation: u32,
}

impl ObjRef {
    /// Create a handle from its raw parts.
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

impl fmt::Debug for ObjRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjRef({}/{})", self.index, self.generation)
    }
}

/// Represents any script value.
///
/// # Examples
///
/// ```
/// use core_types::{ObjRef, Value};
///
/// assert!(!Value::Null.is_truthy());
/// assert!(Value::Int(0).is_truthy());
/// assert_eq!(Value::Float(1.5).as_number(), Some(1.5));
/// assert!(Value::Object(ObjRef::new(0, 0)).as_object().is_some());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Value {
    /// Absence of a value
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// IEEE 754 double-precision floating point
    Float(f64),
    /// Reference to a heap object
    Object(ObjRef),
}

impl Value {
    /// Returns whether this value is truthy.
    ///
    /// Only `null` and `false` are falsy; numbers (including zero) and all
    /// heap objects are truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Null | Value::Bool(false))
    }

    /// Returns true for `Value::Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true for integer and floating-point values.
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    /// Integer payload, if this is an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric payload widened to `f64`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Boolean payload, if this is a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Heap handle, if this references a heap object.
    pub fn as_object(&self) -> Option<ObjRef> {
        match self {
            Value::Object(r) => Some(*r),
            _ => None,
        }
    }

    /// Name of the primitive tag. Heap objects report `"object"`; the heap
    /// knows the precise kind.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Object(_) => "object",
        }
    }

    /// Identity comparison: primitives by value, floats by bit pattern and
    /// heap objects by handle.
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            _ => self == other,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<ObjRef> for Value {
    fn from(r: ObjRef) -> Self {
        Value::Object(r)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(n) => {
                if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
                    write!(f, "{:.1}", n)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::Object(r) => write!(f, "<object {}>", r.index),
        }
    }
}
