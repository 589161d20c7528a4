//! Single-pass Pratt compiler. The first error stops compilation: with an
//! expression-only grammar there is no statement boundary to resynchronise on.

use clove_core::{Chunk, OpCode, Value};
use tracing::{debug, instrument};

use crate::scanner::{Scanner, Token, TokenKind};
use crate::{CompileError, Diagnostic, Location};

/// Binding power, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    None,
    Assignment,
    Equality,
    Comparison,
    Term,
    Factor,
    Unary,
    Primary,
}

impl Precedence {
    const fn next(self) -> Self {
        match self {
            Self::None => Self::Assignment,
            Self::Assignment => Self::Equality,
            Self::Equality => Self::Comparison,
            Self::Comparison => Self::Term,
            Self::Term => Self::Factor,
            Self::Factor => Self::Unary,
            Self::Unary | Self::Primary => Self::Primary,
        }
    }

    const fn of_infix(kind: TokenKind) -> Self {
        match kind {
            TokenKind::BangEqual | TokenKind::EqualEqual => Self::Equality,
            TokenKind::Greater | TokenKind::GreaterEqual | TokenKind::Less | TokenKind::LessEqual => Self::Comparison,
            TokenKind::Minus | TokenKind::Plus => Self::Term,
            TokenKind::Slash | TokenKind::Star => Self::Factor,
            _ => Self::None,
        }
    }
}

type PResult<T = ()> = Result<T, Diagnostic>;

/// Deepest accepted nesting of sub-expressions (groups, unary operators,
/// right operands).
pub const MAX_NESTING: usize = 256;

/// Compile `source` into a chunk ending with `RETURN`. String literals are
/// owned by the returned chunk; nothing outside it is touched, even on error.
#[instrument(level = "debug", skip_all, fields(len = source.len()))]
pub fn compile(source: &str) -> Result<Chunk, CompileError> {
    let mut parser = Parser::new(source);
    match parser.run() {
        Ok(()) => {
            let chunk = parser.chunk;
            debug!(bytes = chunk.len(), constants = chunk.consts.len(), "chunk compiled");
            Ok(chunk)
        }
        Err(diagnostic) => {
            debug!(%diagnostic, "compilation failed");
            Err(diagnostic.into())
        }
    }
}

struct Parser<'src> {
    scanner: Scanner<'src>,
    chunk: Chunk,
    current: Token<'src>,
    previous: Token<'src>,
    depth: usize,
}

impl<'src> Parser<'src> {
    fn new(source: &'src str) -> Self {
        let eof = Token { kind: TokenKind::Eof, lexeme: "", line: 1 };
        Self { scanner: Scanner::new(source), chunk: Chunk::new(), current: eof, previous: eof, depth: 0 }
    }

    fn run(&mut self) -> PResult {
        self.advance()?;
        self.expression()?;
        self.consume(TokenKind::Eof, "Expect end of expression.")?;
        self.emit(OpCode::Return);
        Ok(())
    }

    /* ────────── Jetons ────────── */

    fn advance(&mut self) -> PResult {
        self.previous = self.current;
        self.current = self.scanner.next_token().map_err(|e| Diagnostic {
            line: e.line,
            location: Location::Lexical,
            message: e.to_string(),
        })?;
        Ok(())
    }

    fn consume(&mut self, kind: TokenKind, message: &str) -> PResult {
        if self.current.kind == kind {
            self.advance()
        } else {
            Err(error_at(self.current, message))
        }
    }

    /* ────────── Émission ────────── */

    fn emit(&mut self, op: OpCode) { self.chunk.write_op(op, self.previous.line); }

    fn emit_pair(&mut self, a: OpCode, b: OpCode) {
        self.emit(a);
        self.emit(b);
    }

    fn emit_constant(&mut self, value: Value) -> PResult {
        let index = self.chunk.add_constant(value);
        let index = u8::try_from(index).map_err(|_| error_at(self.previous, "Too many constants in one chunk."))?;
        self.emit(OpCode::Constant);
        self.chunk.write(index, self.previous.line);
        Ok(())
    }

    /* ────────── Pratt ────────── */

    fn expression(&mut self) -> PResult { self.parse_precedence(Precedence::Assignment) }

    fn parse_precedence(&mut self, precedence: Precedence) -> PResult {
        self.advance()?;
        if self.depth == MAX_NESTING {
            return Err(error_at(self.previous, "Expression nests too deeply."));
        }
        self.depth += 1;
        let parsed = self.prefix_then_infix(precedence);
        self.depth -= 1;
        parsed
    }

    fn prefix_then_infix(&mut self, precedence: Precedence) -> PResult {
        self.prefix()?;
        while precedence <= Precedence::of_infix(self.current.kind) {
            self.advance()?;
            self.binary()?;
        }
        Ok(())
    }

    fn prefix(&mut self) -> PResult {
        match self.previous.kind {
            TokenKind::LeftParen => self.grouping(),
            TokenKind::Minus | TokenKind::Bang => self.unary(),
            TokenKind::Number => self.number(),
            TokenKind::String => self.string(),
            TokenKind::True => self.literal(OpCode::True),
            TokenKind::False => self.literal(OpCode::False),
            TokenKind::Nil => self.literal(OpCode::Nil),
            _ => Err(error_at(self.previous, "Expect expression.")),
        }
    }

    fn literal(&mut self, op: OpCode) -> PResult {
        self.emit(op);
        Ok(())
    }

    fn grouping(&mut self) -> PResult {
        self.expression()?;
        self.consume(TokenKind::RightParen, "Expect ')' after expression.")
    }

    fn unary(&mut self) -> PResult {
        let operator = self.previous.kind;
        self.parse_precedence(Precedence::Unary)?;
        match operator {
            TokenKind::Minus => self.emit(OpCode::Negate),
            _ => self.emit(OpCode::Not),
        }
        Ok(())
    }

    fn binary(&mut self) -> PResult {
        let operator = self.previous.kind;
        self.parse_precedence(Precedence::of_infix(operator).next())?;
        match operator {
            TokenKind::BangEqual => self.emit_pair(OpCode::Equal, OpCode::Not),
            TokenKind::EqualEqual => self.emit(OpCode::Equal),
            TokenKind::Greater => self.emit(OpCode::Greater),
            TokenKind::GreaterEqual => self.emit_pair(OpCode::Less, OpCode::Not),
            TokenKind::Less => self.emit(OpCode::Less),
            TokenKind::LessEqual => self.emit_pair(OpCode::Greater, OpCode::Not),
            TokenKind::Plus => self.emit(OpCode::Add),
            TokenKind::Minus => self.emit(OpCode::Subtract),
            TokenKind::Star => self.emit(OpCode::Multiply),
            TokenKind::Slash => self.emit(OpCode::Divide),
            _ => unreachable!("no infix rule for {operator:?}"),
        }
        Ok(())
    }

    fn number(&mut self) -> PResult {
        let lexeme = self.previous.lexeme;
        let n = lexeme.parse::<f64>().map_err(|_| error_at(self.previous, "Invalid number literal."))?;
        self.emit_constant(Value::Number(n))
    }

    fn string(&mut self) -> PResult {
        let lexeme = self.previous.lexeme;
        let body = &lexeme.as_bytes()[1..lexeme.len() - 1];
        let handle = self.chunk.take_string(body.to_vec());
        self.emit_constant(Value::Obj(handle))
    }
}

fn error_at(token: Token<'_>, message: &str) -> Diagnostic {
    let location = match token.kind {
        TokenKind::Eof => Location::End,
        _ => Location::At(token.lexeme.to_owned()),
    };
    Diagnostic { line: token.line, location, message: message.to_owned() }
}
