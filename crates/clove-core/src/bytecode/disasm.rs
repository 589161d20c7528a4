//! Textual disassembly used by the CLI, the REPL and execution tracing.

use core::fmt::Write;

use crate::bytecode::{chunk::Chunk, opcode::OpCode};
use crate::value::{Heap, Value};

/// Produce a multi-line listing of the whole chunk under a `== name ==` header.
pub fn disassemble_chunk(chunk: &Chunk, heap: &Heap, name: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {name} ==");

    let mut offset = 0;
    while offset < chunk.len() {
        let (text, next) = disassemble_instruction(chunk, heap, offset);
        let _ = writeln!(out, "{text}");
        offset = next;
    }
    out
}

/// Render the instruction at `offset` and return it with the offset of the
/// next instruction. Malformed bytes are rendered, never trusted.
pub fn disassemble_instruction(chunk: &Chunk, heap: &Heap, offset: usize) -> (String, usize) {
    let mut out = String::new();
    let _ = write!(out, "{offset:04} ");

    let line = chunk.line_for_offset(offset).ok();
    let same_as_previous = offset > 0 && line.is_some() && chunk.line_for_offset(offset - 1).ok() == line;
    match line {
        _ if same_as_previous => out.push_str("   | "),
        Some(line) => {
            let _ = write!(out, "{line:4} ");
        }
        None => out.push_str("   ? "),
    }

    let Some(&byte) = chunk.code().get(offset) else {
        out.push_str("<end of chunk>");
        return (out, offset + 1);
    };

    match OpCode::try_from(byte) {
        Ok(OpCode::Constant) => constant_instruction(&mut out, chunk, heap, offset),
        Ok(op) => {
            out.push_str(op.mnemonic());
            (out, offset + 1)
        }
        Err(raw) => {
            let _ = write!(out, "Unknown opcode {raw}");
            (out, offset + 1)
        }
    }
}

fn constant_instruction(out: &mut String, chunk: &Chunk, heap: &Heap, offset: usize) -> (String, usize) {
    let name = OpCode::Constant.mnemonic();
    let Some(&index) = chunk.code().get(offset + 1) else {
        let _ = write!(out, "{name:<16} <missing operand>");
        return (core::mem::take(out), offset + 1);
    };
    match chunk.constant(index as usize) {
        Ok(value) => {
            let _ = write!(out, "{name:<16} {index:4} '{}'", show_value(owner_of(chunk, heap, value), value));
        }
        Err(_) => {
            let _ = write!(out, "{name:<16} {index:4} <invalid constant>");
        }
    }
    (core::mem::take(out), offset + 2)
}

/// Heap able to resolve `value`: the chunk's own for its string constants,
/// `heap` otherwise.
fn owner_of<'a>(chunk: &'a Chunk, heap: &'a Heap, value: Value) -> &'a Heap {
    match value {
        Value::Obj(r) if chunk.objects().owns(r) => chunk.objects(),
        _ => heap,
    }
}

fn show_value(heap: &Heap, value: Value) -> String {
    let text = heap.display(value).to_string();
    if text.chars().count() <= 64 {
        text
    } else {
        let head: String = text.chars().take(64).collect();
        format!("{head}…")
    }
}

/// One-line rendering of the value stack, bottom first: `[ a ][ b ]`.
pub fn format_stack(stack: &[Value], heap: &Heap) -> String {
    let mut out = String::new();
    for value in stack {
        let _ = write!(out, "[ {} ]", show_value(heap, *value));
    }
    out
}
