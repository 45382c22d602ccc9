//! ScriptRunner behavior

use super::{constant_string, ticker, write_chunk};
use core_types::{ErrorKind, Value};
use interpreter::RuntimeConfig;
use script_cli::{CliError, ScriptRunner};

fn runner() -> ScriptRunner {
    ScriptRunner::new(RuntimeConfig::default()).unwrap()
}

#[test]
fn test_load_and_run_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_chunk(&dir, "hello.hbc", &constant_string("done"));

    let chunk = ScriptRunner::load_file(&path).unwrap();
    let mut runner = runner();
    let value = runner.run(&chunk).unwrap();
    assert_eq!(runner.display(value), "done");
}

#[test]
fn test_missing_file() {
    let err = ScriptRunner::load_file(std::path::Path::new("/nonexistent/a.hbc")).unwrap_err();
    assert!(matches!(err, CliError::Io { .. }));
    assert!(err.to_string().contains("/nonexistent/a.hbc"));
}

#[test]
fn test_corrupt_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.hbc");
    std::fs::write(&path, b"not a chunk").unwrap();
    assert!(matches!(
        ScriptRunner::load_file(&path),
        Err(CliError::Chunk(_))
    ));
}

#[test]
fn test_run_frames() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_chunk(&dir, "ticker.hbc", &ticker());
    let chunk = ScriptRunner::load_file(&path).unwrap();

    let mut runner = runner();
    runner.run(&chunk).unwrap();
    let last = runner.run_frames("tick", 3).unwrap();

    assert_eq!(last, Value::Int(3));
    assert_eq!(runner.take_console(), vec!["1", "2", "3"]);
    assert!(runner.console_lines().is_empty());
}

#[test]
fn test_zero_frames_returns_null() {
    let mut runner = runner();
    runner.run(&ticker()).unwrap();
    assert_eq!(runner.run_frames("tick", 0).unwrap(), Value::Null);
}

#[test]
fn test_missing_entry() {
    let mut runner = runner();
    runner.run(&ticker()).unwrap();
    let err = runner.run_frames("update", 1).unwrap_err();
    assert!(matches!(err, CliError::MissingEntry(ref name) if name == "update"));
}

#[test]
fn test_entry_error_is_runtime_error() {
    let mut runner = ScriptRunner::new(RuntimeConfig::default()).unwrap();
    runner.run(&ticker()).unwrap();
    // Entry must be callable
    runner
        .runtime_mut()
        .set_global("tick", Value::Int(1))
        .unwrap();
    match runner.run_frames("tick", 1) {
        Err(CliError::Runtime(e)) => assert_eq!(e.kind, ErrorKind::TypeMismatch),
        other => panic!("expected runtime error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_stats_json() {
    let mut runner = runner();
    runner.run(&ticker()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&runner.stats_json().unwrap()).unwrap();
    assert!(json["live_objects"].as_u64().unwrap() > 0);

    let stats = runner.shutdown();
    assert!(stats.live_objects > 0);
}

/// `fn next() { return 2 }; fn step() { step = next; return 1 }`
fn rebinding_entry() -> bytecode_system::Chunk {
    use bytecode_system::{Chunk, FunctionProto, Opcode};

    let mut next = Chunk::new();
    let two = next.add_constant(2i64);
    next.emit(Opcode::Constant(two));
    next.emit(Opcode::Return);

    let mut step = Chunk::new();
    let next_name = step.add_name("next");
    let step_name = step.add_name("step");
    let one = step.add_constant(1i64);
    step.emit(Opcode::GetGlobal(next_name));
    step.emit(Opcode::SetGlobal(step_name));
    step.emit(Opcode::Constant(one));
    step.emit(Opcode::Return);

    let mut c = Chunk::new();
    for (name, body) in [("next", next), ("step", step)] {
        let k = c.add_constant(FunctionProto::new(name, 0, body));
        c.emit(Opcode::Closure(k, Vec::new()));
        let global = c.add_name(name);
        c.emit(Opcode::DefineGlobal(global));
    }
    c.emit(Opcode::Null);
    c.emit(Opcode::Return);
    c
}

#[test]
fn test_entry_rebound_by_script_is_followed() {
    let config = RuntimeConfig::default().with_gc(memory_manager::GcConfig::default().with_stress(true));
    let mut runner = ScriptRunner::new(config).unwrap();
    runner.run(&rebinding_entry()).unwrap();

    assert_eq!(runner.run_frames("step", 3).unwrap(), Value::Int(2));
    assert!(runner.stats().collection_count > 0);
}
