//! Core value types and error handling for the scripting runtime.
//!
//! This crate provides the foundational types shared by every runtime
//! component: the tagged value representation, heap handles, the runtime
//! error taxonomy and the diagnostics record handed to the embedding host.
//!
//! # Overview
//!
//! - [`Value`] - Tagged representation of script values
//! - [`ObjRef`] - Generational handle into the managed heap
//! - [`RuntimeError`] - Runtime faults with a call trace
//! - [`ErrorKind`] - Kinds of runtime faults
//! - [`Diagnostic`] - Fault report delivered to the host
//! - [`StackFrame`] - Call stack frame information
//!
//! # Examples
//!
//! ```
//! use core_types::{ErrorKind, RuntimeError, Value};
//!
//! let num = Value::Int(42);
//! assert!(num.is_truthy());
//! assert_eq!(num.type_name(), "int");
//!
//! let error = RuntimeError::new(ErrorKind::UndefinedMethod, "no method 'jump'");
//! assert_eq!(error.kind, ErrorKind::UndefinedMethod);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod diagnostic;
mod error;
mod source;
mod value;

pub use diagnostic::{ContextId, Diagnostic};
pub use error::{ErrorKind, RuntimeError, RuntimeResult};
pub use source::StackFrame;
pub use value::{ObjRef, Value};
