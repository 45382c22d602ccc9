//! Collection driven by the runtime's roots

use bytecode_system::Opcode;
use core_types::{ErrorKind, Value};
use interpreter::{ContextState, Runtime, RuntimeConfig};
use memory_manager::{GcConfig, HeapObject};

use crate::helpers::{build, int, run, string};

#[test]
fn test_globals_keep_objects_alive() {
    let mut rt = Runtime::new();
    let chunk = build(|c| {
        let name = c.add_name("inventory");
        int(c, 1);
        c.emit(Opcode::NewArray(1));
        c.emit(Opcode::DefineGlobal(name));
        c.emit(Opcode::Null);
        c.emit(Opcode::Return);
    });
    run(&mut rt, &chunk).unwrap();

    let array = rt.global("inventory").unwrap().as_object().unwrap();
    rt.collect_garbage();
    assert!(rt.heap().contains(array));

    rt.set_global("inventory", Value::Null).unwrap();
    let report = rt.collect_garbage();
    assert!(!rt.heap().contains(array));
    assert!(report.reclaimed_objects >= 1);
}

#[test]
fn test_unrooted_results_are_reclaimed() {
    let mut rt = Runtime::new();
    let chunk = build(|c| {
        c.emit(Opcode::NewMap(0));
        c.emit(Opcode::Return);
    });
    let map = run(&mut rt, &chunk).unwrap().as_object().unwrap();
    rt.collect_garbage();
    assert!(!rt.heap().contains(map));
}

#[test]
fn test_builtin_classes_are_permanent() {
    let mut rt = Runtime::new();
    let class = rt.define_builtin_class("Console").unwrap();
    assert!(rt.heap().is_permanent(class));
    rt.collect_garbage();
    assert!(rt.heap().contains(class));
}

#[test]
fn test_collection_under_stress_preserves_live_values() {
    let config = RuntimeConfig::default().with_gc(GcConfig::default().with_stress(true));
    let mut rt = Runtime::with_config(config);

    // i = 0; keep = ["keep"]; while i < 100 { []; i = i + 1 }; return keep[0]
    let chunk = build(|c| {
        int(c, 0);
        string(c, "keep");
        c.emit(Opcode::NewArray(1));
        let top = c.next_index();
        c.emit(Opcode::GetLocal(1));
        int(c, 100);
        c.emit(Opcode::Less);
        let exit = c.next_index() as usize;
        c.emit(Opcode::JumpIfFalse(0));
        c.emit(Opcode::NewArray(0));
        c.emit(Opcode::Pop);
        c.emit(Opcode::GetLocal(1));
        int(c, 1);
        c.emit(Opcode::Add);
        c.emit(Opcode::SetLocal(1));
        c.emit(Opcode::Jump(top));
        let done = c.next_index();
        c.patch_jump(exit, done);
        c.emit(Opcode::GetLocal(2));
        int(c, 0);
        c.emit(Opcode::GetIndex);
        c.emit(Opcode::Return);
    });

    let result = run(&mut rt, &chunk).unwrap();
    assert_eq!(rt.display(result), "keep");
    let stats = rt.memory_stats();
    assert!(stats.collection_count > 100);
    assert!(stats.live_objects < 20);
}

#[test]
fn test_pinned_host_values_survive() {
    let mut rt = Runtime::new();
    let class = rt.define_class("Item").unwrap();
    let item = rt.instantiate(class).unwrap();
    rt.pin(item);
    rt.collect_garbage();
    assert!(rt.heap().instance(item.as_object().unwrap()).is_ok());
}

#[test]
fn test_shutdown_releases_everything() {
    let mut rt = Runtime::new();
    rt.set_global("xs", Value::Null).unwrap();
    let chunk = build(|c| {
        c.emit(Opcode::NewArray(0));
        c.emit(Opcode::Return);
    });
    run(&mut rt, &chunk).unwrap();

    let stats = rt.shutdown();
    assert!(stats.live_objects > 0);
}

#[test]
fn test_live_bytes_track_array_growth() {
    let mut rt = Runtime::new();
    let before = rt.memory_stats().live_bytes;
    let big = build(|c| {
        for n in 0..64 {
            int(c, n);
        }
        c.emit(Opcode::NewArray(64));
        c.emit(Opcode::Return);
    });
    let array = run(&mut rt, &big).unwrap();
    rt.pin(array);
    assert!(rt.memory_stats().live_bytes > before);
    assert!(matches!(
        rt.heap().get(array.as_object().unwrap()).unwrap(),
        HeapObject::Array(items) if items.len() == 64
    ));
}

#[test]
fn test_out_of_memory_faults_only_the_context() {
    let config = RuntimeConfig::default().with_gc(GcConfig::default().with_max_heap_bytes(Some(64 * 1024)));
    let mut rt = Runtime::with_config(config);
    let diagnostics = rt.diagnostics_channel();
    let worker = rt.create_context();

    // chain = null; loop { chain = [chain] }
    let hog = build(|c| {
        c.emit(Opcode::Null);
        let top = c.next_index();
        c.emit(Opcode::GetLocal(1));
        c.emit(Opcode::NewArray(1));
        c.emit(Opcode::SetLocal(1));
        c.emit(Opcode::Jump(top));
    });

    let err = rt.run_chunk(worker, &hog).unwrap_err();
    assert_eq!(err.kind, ErrorKind::OutOfMemory);
    assert_eq!(rt.context_state(worker), Some(ContextState::Faulted));

    let diagnostic = diagnostics.try_recv().unwrap();
    assert_eq!(diagnostic.kind, ErrorKind::OutOfMemory);
    assert_eq!(diagnostic.context, worker);

    // Resetting drops the chain; the next collection reclaims it.
    rt.reset_context(worker).unwrap();
    let before = rt.memory_stats().live_bytes;
    rt.collect_garbage();
    assert!(rt.memory_stats().live_bytes < before);

    let other = rt.create_context();
    let chunk = build(|c| {
        int(c, 5);
        c.emit(Opcode::NewArray(1));
        int(c, 0);
        c.emit(Opcode::GetIndex);
        c.emit(Opcode::Return);
    });
    assert_eq!(rt.run_chunk(other, &chunk).unwrap(), Value::Int(5));
    assert_eq!(rt.run_chunk(worker, &chunk).unwrap(), Value::Int(5));
}
