//! Bytecode instruction representation

use crate::opcode::Opcode;

/// One instruction and the source line it came from, if known
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    /// The opcode for this instruction
    pub opcode: Opcode,
    /// 1-based source line
    pub line: Option<u32>,
}

impl Instruction {
    /// Instruction without line information
    pub fn new(opcode: Opcode) -> Self {
        Self { opcode, line: None }
    }

    /// Instruction from source line `line`; line 0 means unknown
    pub fn at_line(opcode: Opcode, line: u32) -> Self {
        Self {
            opcode,
            line: (line != 0).then_some(line),
        }
    }

    /// Source line, if known
    pub fn line(&self) -> Option<u32> {
        self.line
    }
}
