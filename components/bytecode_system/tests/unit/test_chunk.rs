//! Tests for Chunk construction

use bytecode_system::{Chunk, Constant, FunctionProto, Opcode};

#[test]
fn test_chunk_emit_instruction() {
    let mut chunk = Chunk::new();
    chunk.emit(Opcode::Null);
    assert_eq!(chunk.instruction_count(), 1);
    assert!(matches!(chunk.instructions[0].opcode, Opcode::Null));
}

#[test]
fn test_chunk_add_constant_returns_sequential_indices() {
    let mut chunk = Chunk::new();
    assert_eq!(chunk.add_constant(Constant::Int(1)), 0);
    assert_eq!(chunk.add_constant(Constant::Int(2)), 1);
    assert_eq!(chunk.add_constant(Constant::Int(1)), 0);
}

#[test]
fn test_next_index_tracks_emission() {
    let mut chunk = Chunk::new();
    assert_eq!(chunk.next_index(), 0);
    chunk.emit(Opcode::True);
    chunk.emit(Opcode::Pop);
    assert_eq!(chunk.next_index(), 2);
}

#[test]
fn test_script_proto_is_nameless() {
    let proto = FunctionProto::script(Chunk::new());
    assert_eq!(proto.name, None);
    assert_eq!(proto.arity, 0);
    assert_eq!(proto.display_name(), "<script>");
}

#[test]
fn test_constant_kind_names() {
    assert_eq!(Constant::Str("a".into()).kind(), "string");
    assert_eq!(Constant::Float(1.0).kind(), "float");
    assert_eq!(
        Constant::from(FunctionProto::new("f", 0, Chunk::new())).kind(),
        "function"
    );
}
