//! Bytecode opcodes for the scripting runtime
//!
//! Operands named `u32` index the constant pool unless noted; jump targets
//! are absolute instruction indices.

/// Descriptor for a captured variable (upvalue)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UpvalueDescriptor {
    /// true if captured from the enclosing frame's locals, false if from its upvalues
    pub is_local: bool,
    /// Local slot (if local) or upvalue index (if not)
    pub index: u16,
}

impl UpvalueDescriptor {
    /// Capture a local slot of the enclosing frame
    pub fn local(index: u16) -> Self {
        Self {
            is_local: true,
            index,
        }
    }

    /// Capture an upvalue of the enclosing function
    pub fn upvalue(index: u16) -> Self {
        Self {
            is_local: false,
            index,
        }
    }
}

/// Bytecode opcodes
#[derive(Debug, Clone, PartialEq)]
pub enum Opcode {
    // Literals and stack shuffling
    /// Push constant from the pool
    Constant(u32),
    /// Push null
    Null,
    /// Push true
    True,
    /// Push false
    False,
    /// Discard the top value
    Pop,
    /// Duplicate the top value
    Dup,

    // Variables
    /// Push frame slot (slot 0 is the receiver)
    GetLocal(u16),
    /// Pop into frame slot
    SetLocal(u16),
    /// Push captured value
    GetUpvalue(u16),
    /// Pop into captured value
    SetUpvalue(u16),
    /// Pop and bind a new global named by a string constant
    DefineGlobal(u32),
    /// Push global named by a string constant
    GetGlobal(u32),
    /// Pop into an existing global
    SetGlobal(u32),

    // Fields and methods
    /// Replace the object on top with its field (or bound method)
    GetField(u32),
    /// Pop value and object, store the field
    SetField(u32),
    /// Pop receiver, push the superclass method bound to it
    GetSuper(u32),

    // Arithmetic and comparison
    /// Add (or concatenate two strings)
    Add,
    /// Subtract top from second-top
    Sub,
    /// Multiply
    Mul,
    /// Divide second-top by top
    Div,
    /// Remainder of second-top by top
    Mod,
    /// Arithmetic negation
    Negate,
    /// Logical not (truthiness)
    Not,
    /// Equality
    Equal,
    /// Inequality
    NotEqual,
    /// Less than
    Less,
    /// Less than or equal
    LessEqual,
    /// Greater than
    Greater,
    /// Greater than or equal
    GreaterEqual,

    // Control flow
    /// Unconditional jump to instruction index
    Jump(u32),
    /// Pop condition, jump if falsy
    JumpIfFalse(u32),
    /// Call the value below `argc` arguments
    Call(u8),
    /// Call a method by name on the receiver below `argc` arguments
    Invoke(u32, u8),
    /// Call a superclass method by name on the receiver below `argc` arguments
    SuperInvoke(u32, u8),
    /// Return from the current function
    Return,

    // Functions and classes
    /// Instantiate a function constant, capturing values per descriptor
    Closure(u32, Vec<UpvalueDescriptor>),
    /// Define a class named by a string constant and push it
    Class(u32),
    /// Pop superclass and set it as the parent of the class below
    Inherit,
    /// Pop function and add it as a method of the class below
    Method(u32),
    /// Finalize the class on top and pop it
    EndClass,

    // Containers
    /// Pop `n` values into a new array
    NewArray(u16),
    /// Pop `n` key/value pairs into a new map
    NewMap(u16),
    /// Pop index and container, push element
    GetIndex,
    /// Pop value, index and container, store element
    SetIndex,
}

impl Opcode {
    /// Constant-pool index of a name operand, if this opcode has one
    pub fn name_operand(&self) -> Option<u32> {
        match self {
            Opcode::DefineGlobal(k)
            | Opcode::GetGlobal(k)
            | Opcode::SetGlobal(k)
            | Opcode::GetField(k)
            | Opcode::SetField(k)
            | Opcode::GetSuper(k)
            | Opcode::Invoke(k, _)
            | Opcode::SuperInvoke(k, _)
            | Opcode::Class(k)
            | Opcode::Method(k) => Some(*k),
            _ => None,
        }
    }

    /// Jump target, if this opcode transfers control
    pub fn jump_target(&self) -> Option<u32> {
        match self {
            Opcode::Jump(t) | Opcode::JumpIfFalse(t) => Some(*t),
            _ => None,
        }
    }

    /// Check if this opcode is a terminator (ends basic block)
    pub fn is_terminator(&self) -> bool {
        matches!(self, Opcode::Return | Opcode::Jump(_) | Opcode::JumpIfFalse(_))
    }

    /// Check if this opcode is a binary arithmetic operation
    pub fn is_binary_arithmetic(&self) -> bool {
        matches!(
            self,
            Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Div | Opcode::Mod
        )
    }
}
