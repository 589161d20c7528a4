//! clove-compiler — front-end en une passe : source → [`Chunk`].
//!
//! Le scanner produit les jetons à la demande, le compilateur Pratt émet
//! directement le bytecode, sans AST intermédiaire. La grammaire couvre
//! exactement ce que le jeu d’opcodes sait exécuter : littéraux, groupes,
//! `-`/`!` unaires, arithmétique, comparaisons et égalité.
//!
//! ```
//! use clove_core::OpCode;
//!
//! let chunk = clove_compiler::compile("-(1 + 2) + \"s\"").unwrap();
//! assert_eq!(chunk.code().last(), Some(&u8::from(OpCode::Return)));
//! assert_eq!(chunk.objects().len(), 1);
//! ```
//!
//! [`Chunk`]: clove_core::Chunk

#![deny(missing_docs)]

use core::fmt;

use thiserror::Error;

mod compiler;
pub mod scanner;

pub use compiler::{compile, MAX_NESTING};
pub use scanner::{LexError, LexErrorKind, Scanner, Token, TokenKind};

/* ─────────────────────────── Diagnostics ─────────────────────────── */

/// Where in the token stream a diagnostic points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// At a token, with its lexeme.
    At(String),
    /// At end of input.
    End,
    /// Raised by the scanner; no token to point at.
    Lexical,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::At(lexeme) => write!(f, " at '{lexeme}'"),
            Location::End => f.write_str(" at end"),
            Location::Lexical => Ok(()),
        }
    }
}

/// A located compile error, rendered `[line N] Error at 'x': message`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[line {line}] Error{location}: {message}")]
pub struct Diagnostic {
    /// 1-based source line.
    pub line: u32,
    /// Token the error points at.
    pub location: Location,
    /// Human-readable message.
    pub message: String,
}

/// Compilation failure: the diagnostics collected before giving up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    /// Accumulated diagnostics, in source order.
    pub diagnostics: Vec<Diagnostic>,
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, d) in self.diagnostics.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{d}")?;
        }
        Ok(())
    }
}

impl std::error::Error for CompileError {}

impl From<Diagnostic> for CompileError {
    fn from(d: Diagnostic) -> Self { Self { diagnostics: vec![d] } }
}

/// Result alias for the front-end.
pub type CompileResult<T> = Result<T, CompileError>;
