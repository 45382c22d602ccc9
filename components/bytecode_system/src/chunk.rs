//! Bytecode chunk representation
//!
//! A chunk is the unit the loader accepts: instructions plus the constant
//! pool they index into.

use crate::constant::Constant;
use crate::error::ChunkError;
use crate::instruction::Instruction;
use crate::opcode::Opcode;

/// A chunk of bytecode with associated constants
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Chunk {
    /// Instructions in this chunk
    pub instructions: Vec<Instruction>,
    /// Constant pool
    pub constants: Vec<Constant>,
}

impl Chunk {
    /// Create a new empty chunk
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an instruction to the chunk
    pub fn emit(&mut self, opcode: Opcode) {
        self.instructions.push(Instruction::new(opcode));
    }

    /// Add an instruction tagged with a source line
    pub fn emit_at(&mut self, opcode: Opcode, line: u32) {
        self.instructions.push(Instruction::at_line(opcode, line));
    }

    /// Add a constant to the pool and return its index
    ///
    /// Strings, integers and booleans are deduplicated.
    pub fn add_constant(&mut self, value: impl Into<Constant>) -> u32 {
        let value = value.into();
        let dedup = matches!(
            value,
            Constant::Str(_) | Constant::Int(_) | Constant::Bool(_) | Constant::Null
        );
        if dedup {
            if let Some(idx) = self.constants.iter().position(|c| *c == value) {
                return idx as u32;
            }
        }
        let idx = self.constants.len() as u32;
        self.constants.push(value);
        idx
    }

    /// Add a string constant (identifier or literal) and return its index
    pub fn add_name(&mut self, name: &str) -> u32 {
        self.add_constant(Constant::Str(name.to_string()))
    }

    /// Index of the next instruction to be emitted
    pub fn next_index(&self) -> u32 {
        self.instructions.len() as u32
    }

    /// Rewrite the target of the jump at `at`
    ///
    /// Used to back-patch forward jumps once their destination is known.
    pub fn patch_jump(&mut self, at: usize, target: u32) {
        if let Some(inst) = self.instructions.get_mut(at) {
            match &mut inst.opcode {
                Opcode::Jump(t) | Opcode::JumpIfFalse(t) => *t = target,
                _ => {}
            }
        }
    }

    /// Get number of instructions
    pub fn instruction_count(&self) -> usize {
        self.instructions.len()
    }

    /// Source line of the instruction at `offset`, if recorded
    pub fn line_at(&self, offset: usize) -> Option<u32> {
        self.instructions.get(offset).and_then(Instruction::line)
    }

    /// Check every operand against this chunk's pool and bounds
    ///
    /// `upvalue_count` is the capture count of the function owning the chunk
    /// (0 for a top-level script). Nested prototypes are validated
    /// recursively.
    pub fn validate(&self, upvalue_count: u16) -> Result<(), ChunkError> {
        let len = self.instructions.len();

        for (at, inst) in self.instructions.iter().enumerate() {
            if let Some(index) = inst.opcode.name_operand() {
                self.expect_constant(at, index, "string", |c| c.as_str().is_some())?;
            }

            if let Some(target) = inst.opcode.jump_target() {
                if target as usize >= len {
                    return Err(ChunkError::JumpOutOfRange { at, target, len });
                }
            }

            match &inst.opcode {
                Opcode::Constant(index) => {
                    self.constant(at, *index)?;
                }
                Opcode::GetUpvalue(index) | Opcode::SetUpvalue(index) => {
                    if *index >= upvalue_count {
                        return Err(ChunkError::UpvalueOutOfRange {
                            at,
                            index: *index,
                            count: upvalue_count,
                        });
                    }
                }
                Opcode::Closure(index, captures) => {
                    let proto = self
                        .expect_constant(at, *index, "function", |c| c.as_function().is_some())?
                        .as_function()
                        .cloned();
                    if let Some(proto) = proto {
                        if captures.len() != proto.upvalue_count as usize {
                            return Err(ChunkError::CaptureCountMismatch {
                                at,
                                got: captures.len(),
                                expected: proto.upvalue_count,
                            });
                        }
                    }
                    for capture in captures.iter().filter(|c| !c.is_local) {
                        if capture.index >= upvalue_count {
                            return Err(ChunkError::UpvalueOutOfRange {
                                at,
                                index: capture.index,
                                count: upvalue_count,
                            });
                        }
                    }
                }
                _ => {}
            }
        }

        for constant in &self.constants {
            if let Constant::Function(proto) = constant {
                proto.validate()?;
            }
        }

        Ok(())
    }

    fn constant(&self, at: usize, index: u32) -> Result<&Constant, ChunkError> {
        self.constants
            .get(index as usize)
            .ok_or(ChunkError::ConstantOutOfRange {
                at,
                index,
                len: self.constants.len(),
            })
    }

    fn expect_constant(
        &self,
        at: usize,
        index: u32,
        expected: &'static str,
        check: impl Fn(&Constant) -> bool,
    ) -> Result<&Constant, ChunkError> {
        let constant = self.constant(at, index)?;
        if check(constant) {
            Ok(constant)
        } else {
            Err(ChunkError::WrongConstantKind {
                at,
                index,
                expected,
                found: constant.kind(),
            })
        }
    }
}
