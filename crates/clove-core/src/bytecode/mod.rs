//! Bytecode primitives: the chunk container, the opcode set, and the text
//! tooling (assembler, disassembler) built on top of them.

/// Chunk representation plus its run-length line table.
pub mod chunk;
/// Instruction set.
pub mod opcode;
/// Human readable rendering of chunks.
pub mod disasm;
/// Line-oriented text assembler.
pub mod asm;

pub use asm::AsmError;
pub use chunk::{Chunk, ChunkError, LineRun, LineTable};
pub use opcode::OpCode;
