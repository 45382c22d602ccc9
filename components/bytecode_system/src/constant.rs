//! Constant pool entries and function prototypes

use crate::chunk::Chunk;
use crate::error::ChunkError;
use std::sync::Arc;

/// Compiled function template referenced from a constant pool
///
/// A prototype is immutable; the runtime instantiates it into function
/// objects through `Closure`, each with its own captured values.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionProto {
    /// Function name, `None` for anonymous functions and top-level scripts
    pub name: Option<String>,
    /// Number of declared parameters (excluding the receiver slot)
    pub arity: u8,
    /// Number of captured values this function expects
    pub upvalue_count: u16,
    /// Function body
    pub chunk: Chunk,
}

impl FunctionProto {
    /// Create a named prototype without captures
    pub fn new(name: impl Into<String>, arity: u8, chunk: Chunk) -> Self {
        Self {
            name: Some(name.into()),
            arity,
            upvalue_count: 0,
            chunk,
        }
    }

    /// Wrap a top-level chunk as a zero-arity, nameless prototype
    pub fn script(chunk: Chunk) -> Self {
        Self {
            name: None,
            arity: 0,
            upvalue_count: 0,
            chunk,
        }
    }

    /// Set the number of captured values
    pub fn with_upvalues(mut self, count: u16) -> Self {
        self.upvalue_count = count;
        self
    }

    /// Display name for traces and disassembly
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<script>")
    }

    /// Validate this prototype's body and every nested prototype
    pub fn validate(&self) -> Result<(), ChunkError> {
        self.chunk
            .validate(self.upvalue_count)
            .map_err(|source| ChunkError::Nested {
                function: self.display_name().to_string(),
                source: Box::new(source),
            })
    }
}

/// Constant pool entry
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    /// Null
    Null,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Float
    Float(f64),
    /// String literal or identifier (interned by the runtime on load)
    Str(String),
    /// Nested function prototype
    Function(Arc<FunctionProto>),
}

impl Constant {
    /// Short kind name used in validation errors
    pub fn kind(&self) -> &'static str {
        match self {
            Constant::Null => "null",
            Constant::Bool(_) => "bool",
            Constant::Int(_) => "int",
            Constant::Float(_) => "float",
            Constant::Str(_) => "string",
            Constant::Function(_) => "function",
        }
    }

    /// Borrow string contents
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Constant::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow function prototype
    pub fn as_function(&self) -> Option<&Arc<FunctionProto>> {
        match self {
            Constant::Function(f) => Some(f),
            _ => None,
        }
    }
}

impl From<&str> for Constant {
    fn from(s: &str) -> Self {
        Constant::Str(s.to_string())
    }
}

impl From<i64> for Constant {
    fn from(n: i64) -> Self {
        Constant::Int(n)
    }
}

impl From<f64> for Constant {
    fn from(n: f64) -> Self {
        Constant::Float(n)
    }
}

impl From<FunctionProto> for Constant {
    fn from(proto: FunctionProto) -> Self {
        Constant::Function(Arc::new(proto))
    }
}
