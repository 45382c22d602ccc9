//! Memory Manager - heap arena and garbage collector
//!
//! This component provides:
//! - A handle arena owning every script object ([`Heap`])
//! - Weak string interning with precomputed hashes ([`Interner`])
//! - Stop-the-world mark-and-sweep collection with an adaptive threshold
//! - Permanent objects that survive every cycle until [`Heap::release_all`]
//! - Memory telemetry ([`MemoryStats`])
//!
//! Handles are generational: using one after its object was reclaimed
//! yields a `StaleReference` error rather than touching the reused slot.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
mod gc;
pub mod heap;
pub mod interner;
pub mod object;
pub mod stats;

// Re-export main types
pub use config::GcConfig;
pub use heap::Heap;
pub use interner::Interner;
pub use object::{
    BoundMethodObject, ClassObject, FunctionObject, HeapObject, InstanceObject, MapKey,
    MapTable, NameTable, NativeId, NativeObject, StringObject,
};
pub use stats::{CollectionReport, MemoryStats};
