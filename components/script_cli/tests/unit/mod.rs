//! Unit tests for script_cli

mod cli_tests;
mod runner_tests;

use bytecode_system::{Chunk, FunctionProto, Opcode};
use std::path::PathBuf;
use tempfile::TempDir;

/// Write `chunk` to a file in `dir`
pub fn write_chunk(dir: &TempDir, name: &str, chunk: &Chunk) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, chunk.to_bytes()).unwrap();
    path
}

/// `ticks = 0; fn tick() { ticks = ticks + 1; Console.log(ticks); return ticks }`
pub fn ticker() -> Chunk {
    let mut tick = Chunk::new();
    let ticks = tick.add_name("ticks");
    let console = tick.add_name("Console");
    let log = tick.add_name("log");
    let one = tick.add_constant(1i64);
    tick.emit(Opcode::GetGlobal(ticks));
    tick.emit(Opcode::Constant(one));
    tick.emit(Opcode::Add);
    tick.emit(Opcode::SetGlobal(ticks));
    tick.emit(Opcode::GetGlobal(console));
    tick.emit(Opcode::GetGlobal(ticks));
    tick.emit(Opcode::Invoke(log, 1));
    tick.emit(Opcode::Pop);
    tick.emit(Opcode::GetGlobal(ticks));
    tick.emit(Opcode::Return);

    let mut c = Chunk::new();
    let ticks = c.add_name("ticks");
    let name = c.add_name("tick");
    let zero = c.add_constant(0i64);
    c.emit(Opcode::Constant(zero));
    c.emit(Opcode::DefineGlobal(ticks));
    let k = c.add_constant(FunctionProto::new("tick", 0, tick));
    c.emit(Opcode::Closure(k, Vec::new()));
    c.emit(Opcode::DefineGlobal(name));
    c.emit(Opcode::Null);
    c.emit(Opcode::Return);
    c
}

/// `return "done"`
pub fn constant_string(text: &str) -> Chunk {
    let mut c = Chunk::new();
    let k = c.add_name(text);
    c.emit(Opcode::Constant(k));
    c.emit(Opcode::Return);
    c
}
