//! Encoded programs that lean on the builtin classes
//!
//! Each program is encoded to bytes, decoded and run with builtins installed.

use bytecode_system::{Chunk, Opcode};
use core_types::{ErrorKind, Value};
use integration_tests::{closure, counted_loop, define, function, global, int, invoke, string};
use interpreter::{Runtime, RuntimeConfig};
use memory_manager::GcConfig;

fn runtime(config: RuntimeConfig) -> (Runtime, builtins::ConsoleObject) {
    let mut rt = Runtime::with_config(config);
    let console = builtins::install(&mut rt).unwrap();
    (rt, console)
}

fn decode(chunk: &Chunk) -> Chunk {
    Chunk::from_bytes(&chunk.to_bytes()).unwrap()
}

/// scores = []; for i in 0..40 { scores.push(i) }
/// return scores.filter(even).map(times_ten).join(",")
fn scores_program() -> Chunk {
    let mut c = Chunk::new();
    c.emit(Opcode::NewArray(0));
    define(&mut c, "scores");
    counted_loop(&mut c, 1, 40, |c| {
        global(c, "scores");
        c.emit(Opcode::GetLocal(1));
        invoke(c, "push", 1);
        c.emit(Opcode::Pop);
    });
    c.emit(Opcode::Pop);

    global(&mut c, "scores");
    closure(
        &mut c,
        function("even", 1, |f| {
            f.emit(Opcode::GetLocal(1));
            int(f, 2);
            f.emit(Opcode::Mod);
            int(f, 0);
            f.emit(Opcode::Equal);
            f.emit(Opcode::Return);
        }),
    );
    invoke(&mut c, "filter", 1);
    closure(
        &mut c,
        function("times_ten", 1, |f| {
            f.emit(Opcode::GetLocal(1));
            int(f, 10);
            f.emit(Opcode::Mul);
            f.emit(Opcode::Return);
        }),
    );
    invoke(&mut c, "map", 1);
    string(&mut c, ",");
    invoke(&mut c, "join", 1);
    c.emit(Opcode::Return);
    c
}

fn expected_scores() -> String {
    (0..40)
        .filter(|i| i % 2 == 0)
        .map(|i| (i * 10).to_string())
        .collect::<Vec<_>>()
        .join(",")
}

#[test]
fn test_scores_program() {
    let (mut rt, _) = runtime(RuntimeConfig::default());
    let main = rt.main_context();
    let result = rt.run_chunk(main, &decode(&scores_program())).unwrap();
    assert_eq!(rt.display(result), expected_scores());
}

#[test]
fn test_scores_program_under_stress_gc() {
    let config = RuntimeConfig::default().with_gc(GcConfig::default().with_stress(true));
    let (mut rt, _) = runtime(config);
    let main = rt.main_context();
    let result = rt.run_chunk(main, &decode(&scores_program())).unwrap();
    assert_eq!(rt.display(result), expected_scores());
    assert!(rt.memory_stats().collection_count > 40);
}

/// class Player { init(name) { this.name = name }
///                greet() { Console.log("hi " + this.name); return this.name.upper() } }
fn player_program() -> Chunk {
    let mut c = Chunk::new();
    let class = c.add_name("Player");
    c.emit(Opcode::Class(class));
    closure(
        &mut c,
        function("init", 1, |f| {
            let name = f.add_name("name");
            f.emit(Opcode::GetLocal(0));
            f.emit(Opcode::GetLocal(1));
            f.emit(Opcode::SetField(name));
            f.emit(Opcode::Null);
            f.emit(Opcode::Return);
        }),
    );
    let init = c.add_name("init");
    c.emit(Opcode::Method(init));
    closure(
        &mut c,
        function("greet", 0, |f| {
            let name = f.add_name("name");
            global(f, "Console");
            string(f, "hi ");
            f.emit(Opcode::GetLocal(0));
            f.emit(Opcode::GetField(name));
            f.emit(Opcode::Add);
            invoke(f, "log", 1);
            f.emit(Opcode::Pop);
            f.emit(Opcode::GetLocal(0));
            f.emit(Opcode::GetField(name));
            invoke(f, "upper", 0);
            f.emit(Opcode::Return);
        }),
    );
    let greet = c.add_name("greet");
    c.emit(Opcode::Method(greet));
    c.emit(Opcode::EndClass);

    global(&mut c, "Player");
    string(&mut c, "ada");
    c.emit(Opcode::Call(1));
    invoke(&mut c, "greet", 0);
    c.emit(Opcode::Return);
    c
}

#[test]
fn test_script_class_uses_builtins() {
    let (mut rt, console) = runtime(RuntimeConfig::default());
    let main = rt.main_context();
    let result = rt.run_chunk(main, &decode(&player_program())).unwrap();
    assert_eq!(rt.display(result), "ADA");
    assert_eq!(console.lines(), vec!["hi ada"]);
}

#[test]
fn test_builtin_error_faults_only_its_context() {
    let (mut rt, _) = runtime(RuntimeConfig::default());
    let worker = rt.create_context();

    // [].get(3)
    let mut bad = Chunk::new();
    bad.emit(Opcode::NewArray(0));
    int(&mut bad, 3);
    invoke(&mut bad, "get", 1);
    bad.emit(Opcode::Return);

    let err = rt.run_chunk(worker, &decode(&bad)).unwrap_err();
    assert_eq!(err.kind, ErrorKind::IndexOutOfRange);
    assert!(!err.trace.is_empty());

    let main = rt.main_context();
    let mut good = Chunk::new();
    global(&mut good, "Math");
    int(&mut good, -4);
    invoke(&mut good, "abs", 1);
    good.emit(Opcode::Return);
    assert_eq!(rt.run_chunk(main, &good).unwrap(), Value::Int(4));
}
