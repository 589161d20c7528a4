//! Small line-oriented assembler for hand-built chunks.
//!
//! ```text
//! ; -((1.2 + 3.4) / 5.6)
//! CONSTANT 1.2
//! CONSTANT 3.4
//! ADD
//! CONSTANT 5.6
//! DIVIDE
//! NEGATE
//! 2: RETURN
//! ```
//!
//! - Mnemonics accept the `OP_` prefix and any case.
//! - `CONSTANT` takes a number, a double-quoted string (`\"`, `\\`, `\n`, `\t`
//!   escapes), `true`, `false`, `nil`, or `#<idx>` to reference an existing
//!   constant without adding one.
//! - `CONST <literal>` adds a constant without emitting an instruction.
//! - `BYTE <0-255>` emits a raw byte (handy for malformed-program tests).
//! - A leading `<n>:` sets the source line; otherwise the text line is used.
//! - `;` starts a comment.

use thiserror::Error;

use crate::bytecode::{chunk::Chunk, opcode::OpCode};
use crate::value::Value;

/// Assembly failure, attributed to the offending text line (1-based).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {message}")]
pub struct AsmError {
    /// Text line of the failure.
    pub line: usize,
    /// What went wrong.
    pub message: String,
}

impl AsmError {
    fn new(line: usize, message: impl Into<String>) -> Self { Self { line, message: message.into() } }
}

/// Assemble `source` into a [`Chunk`]. String constants are owned by the chunk.
pub fn assemble(source: &str) -> Result<Chunk, AsmError> {
    let mut chunk = Chunk::new();

    for (idx, raw_line) in source.lines().enumerate() {
        let text_line = idx + 1;
        let mut line = strip_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let mut line_no = u32::try_from(text_line).map_err(|_| AsmError::new(text_line, "too many lines"))?;
        if let Some((prefix, rest)) = line.split_once(':') {
            if !prefix.is_empty() && prefix.trim().bytes().all(|b| b.is_ascii_digit()) {
                line_no = prefix
                    .trim()
                    .parse()
                    .map_err(|_| AsmError::new(text_line, format!("invalid line number `{prefix}`")))?;
                if line_no == 0 {
                    return Err(AsmError::new(text_line, "source lines are 1-based"));
                }
                line = rest.trim();
            }
        }

        let (head, operand) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };

        match head.to_ascii_uppercase().as_str() {
            "CONST" => {
                let value = parse_literal(operand, &mut chunk).map_err(|m| AsmError::new(text_line, m))?;
                chunk.add_constant(value);
                continue;
            }
            "BYTE" => {
                let byte = operand
                    .parse::<u8>()
                    .map_err(|_| AsmError::new(text_line, format!("BYTE expects 0-255, got `{operand}`")))?;
                chunk.write(byte, line_no);
                continue;
            }
            _ => {}
        }

        let op = OpCode::from_mnemonic(head)
            .ok_or_else(|| AsmError::new(text_line, format!("unknown instruction `{head}`")))?;

        if op == OpCode::Constant {
            let index = constant_operand(operand, &mut chunk).map_err(|m| AsmError::new(text_line, m))?;
            chunk.write_op(op, line_no);
            chunk.write(index, line_no);
        } else if operand.is_empty() {
            chunk.write_op(op, line_no);
        } else {
            return Err(AsmError::new(text_line, format!("{} takes no operand", op.mnemonic())));
        }
    }

    Ok(chunk)
}

fn strip_comment(line: &str) -> &str {
    let mut in_str = false;
    let mut escaping = false;
    for (i, c) in line.char_indices() {
        if in_str {
            match c {
                _ if escaping => escaping = false,
                '\\' => escaping = true,
                '"' => in_str = false,
                _ => {}
            }
        } else if c == '"' {
            in_str = true;
        } else if c == ';' {
            return &line[..i];
        }
    }
    line
}

fn constant_operand(operand: &str, chunk: &mut Chunk) -> Result<u8, String> {
    if let Some(raw) = operand.strip_prefix('#') {
        return raw.parse::<u8>().map_err(|_| format!("constant index expects 0-255, got `{raw}`"));
    }
    let value = parse_literal(operand, chunk)?;
    let index = chunk.add_constant(value);
    u8::try_from(index).map_err(|_| String::from("too many constants in one chunk"))
}

fn parse_literal(text: &str, chunk: &mut Chunk) -> Result<Value, String> {
    match text {
        "" => Err("missing operand".into()),
        "nil" => Ok(Value::Nil),
        "true" => Ok(Value::Bool(true)),
        "false" => Ok(Value::Bool(false)),
        s if s.starts_with('"') => {
            let bytes = parse_string_literal(s)?;
            Ok(Value::Obj(chunk.take_string(bytes)))
        }
        s => s.parse::<f64>().map(Value::Number).map_err(|_| format!("invalid literal `{s}`")),
    }
}

fn parse_string_literal(input: &str) -> Result<Vec<u8>, String> {
    let bytes = input.as_bytes();
    if bytes.len() < 2 || bytes[0] != b'"' || bytes[bytes.len() - 1] != b'"' {
        return Err("string literal expected".into());
    }

    let mut out = Vec::with_capacity(bytes.len() - 2);
    let mut escaping = false;
    for &b in &bytes[1..bytes.len() - 1] {
        if escaping {
            out.push(match b {
                b'n' => b'\n',
                b't' => b'\t',
                other => other,
            });
            escaping = false;
        } else if b == b'\\' {
            escaping = true;
        } else {
            out.push(b);
        }
    }

    if escaping {
        return Err("incomplete escape sequence".into());
    }
    Ok(out)
}
