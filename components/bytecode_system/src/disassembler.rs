//! Human-readable chunk listings

use crate::chunk::Chunk;
use crate::constant::Constant;
use crate::opcode::Opcode;
use std::fmt::Write;

impl Chunk {
    /// Render an annotated listing of this chunk and its nested functions
    pub fn disassemble(&self, name: &str) -> String {
        let mut out = String::new();
        self.write_listing(&mut out, name);
        out
    }

    fn write_listing(&self, out: &mut String, name: &str) {
        let _ = writeln!(out, "== {} ==", name);
        for (offset, inst) in self.instructions.iter().enumerate() {
            let line = inst
                .line()
                .map(|l| format!("{:>4}", l))
                .unwrap_or_else(|| "   |".to_string());
            let _ = writeln!(
                out,
                "{:04} {} {}",
                offset,
                line,
                self.render_opcode(&inst.opcode)
            );
        }
        for constant in &self.constants {
            if let Constant::Function(proto) = constant {
                out.push('\n');
                proto.chunk.write_listing(out, proto.display_name());
            }
        }
    }

    fn render_constant(&self, index: u32) -> String {
        match self.constants.get(index as usize) {
            Some(Constant::Null) => "null".to_string(),
            Some(Constant::Bool(b)) => b.to_string(),
            Some(Constant::Int(n)) => n.to_string(),
            Some(Constant::Float(n)) => format!("{:?}", n),
            Some(Constant::Str(s)) => format!("{:?}", s),
            Some(Constant::Function(f)) => format!("<fn {}>", f.display_name()),
            None => "<invalid>".to_string(),
        }
    }

    fn render_opcode(&self, op: &Opcode) -> String {
        let name = format!("{:?}", op);
        let mnemonic = name.split('(').next().unwrap_or(&name).to_string();
        match op {
            Opcode::Constant(k)
            | Opcode::DefineGlobal(k)
            | Opcode::GetGlobal(k)
            | Opcode::SetGlobal(k)
            | Opcode::GetField(k)
            | Opcode::SetField(k)
            | Opcode::GetSuper(k)
            | Opcode::Class(k)
            | Opcode::Method(k) => {
                format!("{:<14} {:>4} {}", mnemonic, k, self.render_constant(*k))
            }
            Opcode::Invoke(k, argc) | Opcode::SuperInvoke(k, argc) => format!(
                "{:<14} {:>4} {} ({} args)",
                mnemonic,
                k,
                self.render_constant(*k),
                argc
            ),
            Opcode::Closure(k, captures) => {
                let mut s = format!("{:<14} {:>4} {}", mnemonic, k, self.render_constant(*k));
                for c in captures {
                    let _ = write!(
                        s,
                        " {}{}",
                        if c.is_local { "local:" } else { "upvalue:" },
                        c.index
                    );
                }
                s
            }
            Opcode::Jump(t) | Opcode::JumpIfFalse(t) => format!("{:<14} -> {:04}", mnemonic, t),
            Opcode::GetLocal(n)
            | Opcode::SetLocal(n)
            | Opcode::GetUpvalue(n)
            | Opcode::SetUpvalue(n)
            | Opcode::NewArray(n)
            | Opcode::NewMap(n) => format!("{:<14} {:>4}", mnemonic, n),
            Opcode::Call(argc) => format!("{:<14} {:>4}", mnemonic, argc),
            _ => mnemonic,
        }
    }
}
