//! Integration test suite for the scripting runtime
//!
//! These tests verify that components work together across component
//! boundaries: chunks assembled here are encoded, decoded and run with the
//! builtin classes installed.

/// Re-export components for test convenience
pub mod components {
    pub use builtins;
    pub use bytecode_system;
    pub use core_types;
    pub use interpreter;
    pub use memory_manager;
    pub use script_cli;
}

use bytecode_system::{Chunk, FunctionProto, Opcode};

/// Build a named function prototype with `f`
pub fn function(name: &str, arity: u8, f: impl FnOnce(&mut Chunk)) -> FunctionProto {
    let mut chunk = Chunk::new();
    f(&mut chunk);
    FunctionProto::new(name, arity, chunk)
}

/// Push an integer
pub fn int(chunk: &mut Chunk, n: i64) {
    let k = chunk.add_constant(n);
    chunk.emit(Opcode::Constant(k));
}

/// Push a string
pub fn string(chunk: &mut Chunk, s: &str) {
    let k = chunk.add_name(s);
    chunk.emit(Opcode::Constant(k));
}

/// Push global `name`
pub fn global(chunk: &mut Chunk, name: &str) {
    let k = chunk.add_name(name);
    chunk.emit(Opcode::GetGlobal(k));
}

/// Pop into a new global `name`
pub fn define(chunk: &mut Chunk, name: &str) {
    let k = chunk.add_name(name);
    chunk.emit(Opcode::DefineGlobal(k));
}

/// `receiver.method(args...)` with receiver and args already pushed
pub fn invoke(chunk: &mut Chunk, method: &str, argc: u8) {
    let k = chunk.add_name(method);
    chunk.emit(Opcode::Invoke(k, argc));
}

/// Push a capture-free closure of `proto`
pub fn closure(chunk: &mut Chunk, proto: FunctionProto) {
    let k = chunk.add_constant(proto);
    chunk.emit(Opcode::Closure(k, Vec::new()));
}

/// Emit `for local in 0..n { body }`; the counter lives in `local`
pub fn counted_loop(chunk: &mut Chunk, local: u16, n: i64, body: impl FnOnce(&mut Chunk)) {
    int(chunk, 0);
    let top = chunk.next_index();
    chunk.emit(Opcode::GetLocal(local));
    int(chunk, n);
    chunk.emit(Opcode::Less);
    let exit = chunk.next_index() as usize;
    chunk.emit(Opcode::JumpIfFalse(0));
    body(chunk);
    chunk.emit(Opcode::GetLocal(local));
    int(chunk, 1);
    chunk.emit(Opcode::Add);
    chunk.emit(Opcode::SetLocal(local));
    chunk.emit(Opcode::Jump(top));
    let done = chunk.next_index();
    chunk.patch_jump(exit, done);
}
