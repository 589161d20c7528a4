//! Erreurs surfacées par `interpret`.

use clove_compiler::CompileError;
use thiserror::Error;

/// A dynamic-semantics failure, attributed to the source line of the
/// instruction that raised it.
///
/// Renders as the message followed by `[line N] in script`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}\n[line {}] in script", line_label(.line))]
pub struct RuntimeError {
    /// Human-readable cause, e.g. `Operands must be numbers.`
    pub message: String,
    /// Source line, when the chunk could resolve one.
    pub line: Option<u32>,
}

fn line_label(line: &Option<u32>) -> String { line.map_or_else(|| "?".to_owned(), |l| l.to_string()) }

/// Outcome of a failed `interpret` call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InterpretError {
    /// The source could not be compiled; nothing ran.
    #[error(transparent)]
    Compile(#[from] CompileError),
    /// Execution stopped on a runtime error; the stack has been reset.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl InterpretError {
    /// Process exit status for a batch host (sysexits `EX_DATAERR` / `EX_SOFTWARE`).
    pub const fn exit_code(&self) -> u8 {
        match self {
            InterpretError::Compile(_) => 65,
            InterpretError::Runtime(_) => 70,
        }
    }
}

/// Result alias for VM entry points.
pub type VmResult<T = ()> = Result<T, InterpretError>;
