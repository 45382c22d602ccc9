//! Integration tests for interpreter
//!
//! Whole programs assembled by hand, decoded from bytes, and run end to end.

use bytecode_system::{Chunk, FunctionProto, Opcode};
use core_types::{ErrorKind, Value};
use interpreter::{ContextState, ParamType, Runtime};

fn function(name: &str, arity: u8, f: impl FnOnce(&mut Chunk)) -> FunctionProto {
    let mut chunk = Chunk::new();
    f(&mut chunk);
    FunctionProto::new(name, arity, chunk)
}

/// class Entity { init(hp) { this.hp = hp } hit(n) { this.hp = this.hp - n; return this.hp } }
/// class Boss < Entity { hit(n) { return super.hit(n / 2) } }
fn game_program() -> Chunk {
    let mut c = Chunk::new();

    let init = function("init", 1, |f| {
        let hp = f.add_name("hp");
        f.emit(Opcode::GetLocal(0));
        f.emit(Opcode::GetLocal(1));
        f.emit(Opcode::SetField(hp));
        f.emit(Opcode::Null);
        f.emit(Opcode::Return);
    });
    let hit = function("hit", 1, |f| {
        let hp = f.add_name("hp");
        f.emit(Opcode::GetLocal(0));
        f.emit(Opcode::GetLocal(0));
        f.emit(Opcode::GetField(hp));
        f.emit(Opcode::GetLocal(1));
        f.emit(Opcode::Sub);
        f.emit(Opcode::SetField(hp));
        f.emit(Opcode::GetLocal(0));
        f.emit(Opcode::GetField(hp));
        f.emit(Opcode::Return);
    });
    let boss_hit = function("hit", 1, |f| {
        let name = f.add_name("hit");
        let two = f.add_constant(2i64);
        f.emit(Opcode::GetLocal(0));
        f.emit(Opcode::GetLocal(1));
        f.emit(Opcode::Constant(two));
        f.emit(Opcode::Div);
        f.emit(Opcode::SuperInvoke(name, 1));
        f.emit(Opcode::Return);
    });

    let entity = c.add_name("Entity");
    let boss = c.add_name("Boss");
    let init_name = c.add_name("init");
    let hit_name = c.add_name("hit");

    c.emit(Opcode::Class(entity));
    let k = c.add_constant(init);
    c.emit(Opcode::Closure(k, Vec::new()));
    c.emit(Opcode::Method(init_name));
    let k = c.add_constant(hit);
    c.emit(Opcode::Closure(k, Vec::new()));
    c.emit(Opcode::Method(hit_name));
    c.emit(Opcode::EndClass);

    c.emit(Opcode::Class(boss));
    c.emit(Opcode::GetGlobal(entity));
    c.emit(Opcode::Inherit);
    let k = c.add_constant(boss_hit);
    c.emit(Opcode::Closure(k, Vec::new()));
    c.emit(Opcode::Method(hit_name));
    c.emit(Opcode::EndClass);

    // boss = Boss(100); boss.hit(40); return boss.hit(10)
    c.emit(Opcode::GetGlobal(boss));
    let hundred = c.add_constant(100i64);
    c.emit(Opcode::Constant(hundred));
    c.emit(Opcode::Call(1));
    c.emit(Opcode::Dup);
    let forty = c.add_constant(40i64);
    c.emit(Opcode::Constant(forty));
    c.emit(Opcode::Invoke(hit_name, 1));
    c.emit(Opcode::Pop);
    let ten = c.add_constant(10i64);
    c.emit(Opcode::Constant(ten));
    c.emit(Opcode::Invoke(hit_name, 1));
    c.emit(Opcode::Return);
    c
}

#[test]
fn test_class_hierarchy_program() {
    let mut rt = Runtime::new();
    let main = rt.main_context();
    assert_eq!(rt.run_chunk(main, &game_program()).unwrap(), Value::Int(75));
}

#[test]
fn test_program_survives_encoding() {
    let bytes = game_program().to_bytes();
    let decoded = Chunk::from_bytes(&bytes).unwrap();

    let mut rt = Runtime::new();
    let main = rt.main_context();
    assert_eq!(rt.run_chunk(main, &decoded).unwrap(), Value::Int(75));
}

#[test]
fn test_host_drives_script_objects() {
    let mut rt = Runtime::new();
    let main = rt.main_context();
    let mut setup = game_program();
    // Replace the trailing program with a plain return.
    setup.instructions.truncate(12);
    setup.emit(Opcode::Null);
    setup.emit(Opcode::Return);
    rt.run_chunk(main, &setup).unwrap();

    let entity = rt.class_named("Entity").unwrap();
    let instance = rt.call(Value::Object(entity), &[Value::Int(30)]).unwrap();
    rt.pin(instance);

    let hit = rt.resolve_method(entity, "hit").unwrap();
    let hit = rt.bind(hit, instance).unwrap();
    assert_eq!(rt.call(hit, &[Value::Int(5)]).unwrap(), Value::Int(25));
    assert_eq!(rt.call(hit, &[Value::Int(5)]).unwrap(), Value::Int(20));
}

#[test]
fn test_script_and_natives_cooperate() {
    let mut rt = Runtime::new();
    let log = rt.define_builtin_class("Log").unwrap();
    rt.register_native(log, "join", [ParamType::Array, ParamType::String], |call| {
        let items = call.heap().array(call.object(0)?)?.to_vec();
        let sep = call.str(1)?.to_string();
        let text = items
            .iter()
            .map(|v| call.display(*v))
            .collect::<Vec<_>>()
            .join(&sep);
        call.intern(&text)
    })
    .unwrap();

    let mut c = Chunk::new();
    let name = c.add_name("Log");
    c.emit(Opcode::GetGlobal(name));
    for n in [1i64, 2, 3] {
        let k = c.add_constant(n);
        c.emit(Opcode::Constant(k));
    }
    c.emit(Opcode::NewArray(3));
    let sep = c.add_name("-");
    c.emit(Opcode::Constant(sep));
    let join = c.add_name("join");
    c.emit(Opcode::Invoke(join, 2));
    c.emit(Opcode::Return);

    let main = rt.main_context();
    let result = rt.run_chunk(main, &c).unwrap();
    assert_eq!(rt.display(result), "1-2-3");
}

#[test]
fn test_one_faulted_context_does_not_stop_others() {
    let mut rt = Runtime::new();
    let contexts: Vec<_> = (0..3).map(|_| rt.create_context()).collect();

    let mut bad = Chunk::new();
    let missing = bad.add_name("missing");
    bad.emit(Opcode::GetGlobal(missing));
    bad.emit(Opcode::Return);

    let mut good = Chunk::new();
    let k = good.add_constant(1i64);
    good.emit(Opcode::Constant(k));
    good.emit(Opcode::Return);

    let err = rt.run_chunk(contexts[1], &bad).unwrap_err();
    assert_eq!(err.kind, ErrorKind::UndefinedGlobal);
    for &ctx in [contexts[0], contexts[2]].iter() {
        assert_eq!(rt.run_chunk(ctx, &good).unwrap(), Value::Int(1));
    }
    assert_eq!(rt.context_state(contexts[1]), Some(ContextState::Faulted));
}
