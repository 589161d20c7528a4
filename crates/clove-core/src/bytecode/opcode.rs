//! Instruction tags consumed by the dispatch loop.

use core::fmt;

/// One-byte instruction tag. `Constant` is followed by a one-byte operand
/// (an index into the chunk's constant pool); every other opcode stands alone.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpCode {
    /// Push `constants[operand]`.
    Constant = 0,
    /// Push `nil`.
    Nil,
    /// Push `true`.
    True,
    /// Push `false`.
    False,
    /// Pop b, pop a, push `a == b`.
    Equal,
    /// Pop b, pop a, push `a > b` (numbers only).
    Greater,
    /// Pop b, pop a, push `a < b` (numbers only).
    Less,
    /// Pop b, pop a, push `a + b` (numbers) or the concatenation (strings).
    Add,
    /// Pop b, pop a, push `a - b`.
    Subtract,
    /// Pop b, pop a, push `a * b`.
    Multiply,
    /// Pop b, pop a, push `a / b`.
    Divide,
    /// Pop a, push whether `a` is falsey.
    Not,
    /// Pop a, push `-a` (numbers only).
    Negate,
    /// Pop a, print it, end interpretation.
    Return,
}

impl OpCode {
    /// Every opcode, in encoding order.
    pub const ALL: [OpCode; 14] = [
        OpCode::Constant,
        OpCode::Nil,
        OpCode::True,
        OpCode::False,
        OpCode::Equal,
        OpCode::Greater,
        OpCode::Less,
        OpCode::Add,
        OpCode::Subtract,
        OpCode::Multiply,
        OpCode::Divide,
        OpCode::Not,
        OpCode::Negate,
        OpCode::Return,
    ];

    /// Mnemonic used by the disassembler and the assembler.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            OpCode::Constant => "OP_CONSTANT",
            OpCode::Nil => "OP_NIL",
            OpCode::True => "OP_TRUE",
            OpCode::False => "OP_FALSE",
            OpCode::Equal => "OP_EQUAL",
            OpCode::Greater => "OP_GREATER",
            OpCode::Less => "OP_LESS",
            OpCode::Add => "OP_ADD",
            OpCode::Subtract => "OP_SUBTRACT",
            OpCode::Multiply => "OP_MULTIPLY",
            OpCode::Divide => "OP_DIVIDE",
            OpCode::Not => "OP_NOT",
            OpCode::Negate => "OP_NEGATE",
            OpCode::Return => "OP_RETURN",
        }
    }

    /// Number of operand bytes following the opcode.
    pub const fn operand_width(self) -> usize {
        match self {
            OpCode::Constant => 1,
            _ => 0,
        }
    }

    /// Looks an opcode up by mnemonic, with or without the `OP_` prefix,
    /// ignoring ASCII case.
    pub fn from_mnemonic(name: &str) -> Option<Self> {
        let upper = name.to_ascii_uppercase();
        let bare = upper.strip_prefix("OP_").unwrap_or(upper.as_str());
        Self::ALL.into_iter().find(|op| &op.mnemonic()[3..] == bare)
    }
}

impl From<OpCode> for u8 {
    fn from(op: OpCode) -> Self { op as u8 }
}

impl TryFrom<u8> for OpCode {
    type Error = u8;

    /// Decodes a raw byte; unknown bytes are handed back unchanged.
    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        OpCode::ALL.get(byte as usize).copied().ok_or(byte)
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.mnemonic()) }
}
