//! Binary encoding of chunks
//!
//! Layout: magic `HSBC`, one version byte, then the chunk body. Integers are
//! little-endian; strings and lists carry a u32 length prefix.

use crate::chunk::Chunk;
use crate::constant::{Constant, FunctionProto};
use crate::error::ChunkError;
use crate::instruction::Instruction;
use crate::opcode::{Opcode, UpvalueDescriptor};
use std::sync::Arc;

const MAGIC: &[u8; 4] = b"HSBC";
const VERSION: u8 = 1;

mod tag {
    pub const CONST_NULL: u8 = 0;
    pub const CONST_BOOL: u8 = 1;
    pub const CONST_INT: u8 = 2;
    pub const CONST_FLOAT: u8 = 3;
    pub const CONST_STR: u8 = 4;
    pub const CONST_FUNCTION: u8 = 5;
}

fn opcode_tag(op: &Opcode) -> u8 {
    match op {
        Opcode::Constant(_) => 0x01,
        Opcode::Null => 0x02,
        Opcode::True => 0x03,
        Opcode::False => 0x04,
        Opcode::Pop => 0x05,
        Opcode::Dup => 0x06,
        Opcode::GetLocal(_) => 0x10,
        Opcode::SetLocal(_) => 0x11,
        Opcode::GetUpvalue(_) => 0x12,
        Opcode::SetUpvalue(_) => 0x13,
        Opcode::DefineGlobal(_) => 0x14,
        Opcode::GetGlobal(_) => 0x15,
        Opcode::SetGlobal(_) => 0x16,
        Opcode::GetField(_) => 0x20,
        Opcode::SetField(_) => 0x21,
        Opcode::GetSuper(_) => 0x22,
        Opcode::Add => 0x30,
        Opcode::Sub => 0x31,
        Opcode::Mul => 0x32,
        Opcode::Div => 0x33,
        Opcode::Mod => 0x34,
        Opcode::Negate => 0x35,
        Opcode::Not => 0x36,
        Opcode::Equal => 0x37,
        Opcode::NotEqual => 0x38,
        Opcode::Less => 0x39,
        Opcode::LessEqual => 0x3A,
        Opcode::Greater => 0x3B,
        Opcode::GreaterEqual => 0x3C,
        Opcode::Jump(_) => 0x40,
        Opcode::JumpIfFalse(_) => 0x41,
        Opcode::Call(_) => 0x42,
        Opcode::Invoke(_, _) => 0x43,
        Opcode::SuperInvoke(_, _) => 0x44,
        Opcode::Return => 0x45,
        Opcode::Closure(_, _) => 0x50,
        Opcode::Class(_) => 0x51,
        Opcode::Inherit => 0x52,
        Opcode::Method(_) => 0x53,
        Opcode::EndClass => 0x54,
        Opcode::NewArray(_) => 0x60,
        Opcode::NewMap(_) => 0x61,
        Opcode::GetIndex => 0x62,
        Opcode::SetIndex => 0x63,
    }
}

impl Chunk {
    /// Serialize chunk to bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(MAGIC);
        out.push(VERSION);
        write_chunk(&mut out, self);
        out
    }

    /// Deserialize chunk from bytes
    ///
    /// Decoding only checks the byte layout; call [`Chunk::validate`] before
    /// executing the result.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ChunkError> {
        let mut reader = Reader { bytes, pos: 0 };
        if reader.take(4)? != MAGIC {
            return Err(ChunkError::BadMagic);
        }
        let version = reader.u8()?;
        if version != VERSION {
            return Err(ChunkError::UnsupportedVersion(version));
        }
        let chunk = reader.chunk()?;
        let rest = bytes.len() - reader.pos;
        if rest != 0 {
            return Err(ChunkError::TrailingBytes(rest));
        }
        Ok(chunk)
    }
}

fn write_u16(out: &mut Vec<u8>, n: u16) {
    out.extend_from_slice(&n.to_le_bytes());
}

fn write_u32(out: &mut Vec<u8>, n: u32) {
    out.extend_from_slice(&n.to_le_bytes());
}

fn write_str(out: &mut Vec<u8>, s: &str) {
    write_u32(out, s.len() as u32);
    out.extend_from_slice(s.as_bytes());
}

fn write_chunk(out: &mut Vec<u8>, chunk: &Chunk) {
    write_u32(out, chunk.constants.len() as u32);
    for constant in &chunk.constants {
        write_constant(out, constant);
    }
    write_u32(out, chunk.instructions.len() as u32);
    for inst in &chunk.instructions {
        write_u32(out, inst.line().unwrap_or(0));
        write_opcode(out, &inst.opcode);
    }
}

fn write_constant(out: &mut Vec<u8>, constant: &Constant) {
    match constant {
        Constant::Null => out.push(tag::CONST_NULL),
        Constant::Bool(b) => {
            out.push(tag::CONST_BOOL);
            out.push(*b as u8);
        }
        Constant::Int(n) => {
            out.push(tag::CONST_INT);
            out.extend_from_slice(&n.to_le_bytes());
        }
        Constant::Float(n) => {
            out.push(tag::CONST_FLOAT);
            out.extend_from_slice(&n.to_bits().to_le_bytes());
        }
        Constant::Str(s) => {
            out.push(tag::CONST_STR);
            write_str(out, s);
        }
        Constant::Function(proto) => {
            out.push(tag::CONST_FUNCTION);
            match &proto.name {
                Some(name) => {
                    out.push(1);
                    write_str(out, name);
                }
                None => out.push(0),
            }
            out.push(proto.arity);
            write_u16(out, proto.upvalue_count);
            write_chunk(out, &proto.chunk);
        }
    }
}

fn write_opcode(out: &mut Vec<u8>, op: &Opcode) {
    out.push(opcode_tag(op));
    match op {
        Opcode::Constant(k)
        | Opcode::DefineGlobal(k)
        | Opcode::GetGlobal(k)
        | Opcode::SetGlobal(k)
        | Opcode::GetField(k)
        | Opcode::SetField(k)
        | Opcode::GetSuper(k)
        | Opcode::Jump(k)
        | Opcode::JumpIfFalse(k)
        | Opcode::Class(k)
        | Opcode::Method(k) => write_u32(out, *k),
        Opcode::GetLocal(n)
        | Opcode::SetLocal(n)
        | Opcode::GetUpvalue(n)
        | Opcode::SetUpvalue(n)
        | Opcode::NewArray(n)
        | Opcode::NewMap(n) => write_u16(out, *n),
        Opcode::Call(argc) => out.push(*argc),
        Opcode::Invoke(k, argc) | Opcode::SuperInvoke(k, argc) => {
            write_u32(out, *k);
            out.push(*argc);
        }
        Opcode::Closure(k, captures) => {
            write_u32(out, *k);
            write_u16(out, captures.len() as u16);
            for capture in captures {
                out.push(capture.is_local as u8);
                write_u16(out, capture.index);
            }
        }
        _ => {}
    }
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], ChunkError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.bytes.len())
            .ok_or(ChunkError::Truncated(self.pos))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, ChunkError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, ChunkError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, ChunkError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn u64(&mut self) -> Result<u64, ChunkError> {
        let b = self.take(8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(b);
        Ok(u64::from_le_bytes(buf))
    }

    fn string(&mut self) -> Result<String, ChunkError> {
        let len = self.u32()? as usize;
        let at = self.pos;
        let raw = self.take(len)?;
        std::str::from_utf8(raw)
            .map(str::to_string)
            .map_err(|_| ChunkError::InvalidUtf8(at))
    }

    /// Length prefix for a list, rejected early if it cannot fit the input
    fn count(&mut self) -> Result<usize, ChunkError> {
        let at = self.pos;
        let n = self.u32()? as usize;
        if n > self.bytes.len() - self.pos {
            return Err(ChunkError::Truncated(at));
        }
        Ok(n)
    }

    fn chunk(&mut self) -> Result<Chunk, ChunkError> {
        let constant_count = self.count()?;
        let mut constants = Vec::with_capacity(constant_count);
        for _ in 0..constant_count {
            constants.push(self.constant()?);
        }

        let instruction_count = self.count()?;
        let mut instructions = Vec::with_capacity(instruction_count);
        for _ in 0..instruction_count {
            let line = self.u32()?;
            let opcode = self.opcode()?;
            instructions.push(Instruction::at_line(opcode, line));
        }

        Ok(Chunk {
            instructions,
            constants,
        })
    }

    fn constant(&mut self) -> Result<Constant, ChunkError> {
        let at = self.pos;
        Ok(match self.u8()? {
            tag::CONST_NULL => Constant::Null,
            tag::CONST_BOOL => Constant::Bool(self.u8()? != 0),
            tag::CONST_INT => Constant::Int(self.u64()? as i64),
            tag::CONST_FLOAT => Constant::Float(f64::from_bits(self.u64()?)),
            tag::CONST_STR => Constant::Str(self.string()?),
            tag::CONST_FUNCTION => {
                let name = match self.u8()? {
                    0 => None,
                    _ => Some(self.string()?),
                };
                let arity = self.u8()?;
                let upvalue_count = self.u16()?;
                let chunk = self.chunk()?;
                Constant::Function(Arc::new(FunctionProto {
                    name,
                    arity,
                    upvalue_count,
                    chunk,
                }))
            }
            tag => return Err(ChunkError::UnknownConstant { tag, at }),
        })
    }

    fn opcode(&mut self) -> Result<Opcode, ChunkError> {
        let at = self.pos;
        Ok(match self.u8()? {
            0x01 => Opcode::Constant(self.u32()?),
            0x02 => Opcode::Null,
            0x03 => Opcode::True,
            0x04 => Opcode::False,
            0x05 => Opcode::Pop,
            0x06 => Opcode::Dup,
            0x10 => Opcode::GetLocal(self.u16()?),
            0x11 => Opcode::SetLocal(self.u16()?),
            0x12 => Opcode::GetUpvalue(self.u16()?),
            0x13 => Opcode::SetUpvalue(self.u16()?),
            0x14 => Opcode::DefineGlobal(self.u32()?),
            0x15 => Opcode::GetGlobal(self.u32()?),
            0x16 => Opcode::SetGlobal(self.u32()?),
            0x20 => Opcode::GetField(self.u32()?),
            0x21 => Opcode::SetField(self.u32()?),
            0x22 => Opcode::GetSuper(self.u32()?),
            0x30 => Opcode::Add,
            0x31 => Opcode::Sub,
            0x32 => Opcode::Mul,
            0x33 => Opcode::Div,
            0x34 => Opcode::Mod,
            0x35 => Opcode::Negate,
            0x36 => Opcode::Not,
            0x37 => Opcode::Equal,
            0x38 => Opcode::NotEqual,
            0x39 => Opcode::Less,
            0x3A => Opcode::LessEqual,
            0x3B => Opcode::Greater,
            0x3C => Opcode::GreaterEqual,
            0x40 => Opcode::Jump(self.u32()?),
            0x41 => Opcode::JumpIfFalse(self.u32()?),
            0x42 => Opcode::Call(self.u8()?),
            0x43 => Opcode::Invoke(self.u32()?, self.u8()?),
            0x44 => Opcode::SuperInvoke(self.u32()?, self.u8()?),
            0x45 => Opcode::Return,
            0x50 => {
                let k = self.u32()?;
                let n = self.u16()?;
                let mut captures = Vec::with_capacity(n as usize);
                for _ in 0..n {
                    let is_local = self.u8()? != 0;
                    let index = self.u16()?;
                    captures.push(UpvalueDescriptor { is_local, index });
                }
                Opcode::Closure(k, captures)
            }
            0x51 => Opcode::Class(self.u32()?),
            0x52 => Opcode::Inherit,
            0x53 => Opcode::Method(self.u32()?),
            0x54 => Opcode::EndClass,
            0x60 => Opcode::NewArray(self.u16()?),
            0x61 => Opcode::NewMap(self.u16()?),
            0x62 => Opcode::GetIndex,
            0x63 => Opcode::SetIndex,
            tag => return Err(ChunkError::UnknownOpcode { tag, at }),
        })
    }
}
