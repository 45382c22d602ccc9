//! Collector behavior with the interpreter and builtins together

use bytecode_system::{Chunk, Opcode};
use core_types::Value;
use integration_tests::{counted_loop, define, global, int, invoke, string};
use interpreter::{Runtime, RuntimeConfig};
use memory_manager::GcConfig;

fn stress_runtime() -> Runtime {
    let config = RuntimeConfig::default().with_gc(GcConfig::default().with_stress(true));
    let mut rt = Runtime::with_config(config);
    builtins::install(&mut rt).unwrap();
    rt
}

#[test]
fn test_garbage_maps_are_reclaimed_while_global_survives() {
    let mut rt = stress_runtime();
    rt.collect_garbage();
    let baseline = rt.memory_stats().live_objects;

    // keep = {"hp": 10}; for i in 0..200 { {"tmp": i} }; return keep.get("hp", 0)
    let mut c = Chunk::new();
    string(&mut c, "hp");
    int(&mut c, 10);
    c.emit(Opcode::NewMap(1));
    define(&mut c, "keep");
    counted_loop(&mut c, 1, 200, |c| {
        string(c, "tmp");
        c.emit(Opcode::GetLocal(1));
        c.emit(Opcode::NewMap(1));
        c.emit(Opcode::Pop);
    });
    c.emit(Opcode::Pop);
    global(&mut c, "keep");
    string(&mut c, "hp");
    int(&mut c, 0);
    invoke(&mut c, "get", 2);
    c.emit(Opcode::Return);

    let main = rt.main_context();
    assert_eq!(rt.run_chunk(main, &c).unwrap(), Value::Int(10));

    rt.collect_garbage();
    assert!(rt.memory_stats().live_objects < baseline + 10);
    assert!(rt.global("keep").is_some());
}

#[test]
fn test_contexts_share_a_heap() {
    let mut rt = stress_runtime();
    let a = rt.create_context();
    let b = rt.create_context();

    // context a: shared = []
    let mut setup = Chunk::new();
    setup.emit(Opcode::NewArray(0));
    define(&mut setup, "shared");
    setup.emit(Opcode::Null);
    setup.emit(Opcode::Return);
    rt.run_chunk(a, &setup).unwrap();

    // context b: shared.push("from b"); return shared.len()
    let mut push = Chunk::new();
    global(&mut push, "shared");
    string(&mut push, "from b");
    invoke(&mut push, "push", 1);
    push.emit(Opcode::Return);
    assert_eq!(rt.run_chunk(b, &push).unwrap(), Value::Int(1));

    rt.destroy_context(b).unwrap();
    rt.collect_garbage();

    let shared = rt.global("shared").unwrap();
    assert_eq!(rt.display(shared), r#"["from b"]"#);
}

#[test]
fn test_shutdown_after_builtins() {
    let rt = stress_runtime();
    let stats = rt.shutdown();
    assert!(stats.live_objects > 0);
}
