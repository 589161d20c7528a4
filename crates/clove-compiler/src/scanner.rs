//! Scanner : découpe la source en jetons à la demande, en comptant les lignes.

use core::fmt;

/// Token kinds. The full Lox punctuation and keyword set is recognised so
/// that unsupported syntax fails in the parser with a located message
/// instead of as an unexpected character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `{`
    LeftBrace,
    /// `}`
    RightBrace,
    /// `,`
    Comma,
    /// `.`
    Dot,
    /// `-`
    Minus,
    /// `+`
    Plus,
    /// `;`
    Semicolon,
    /// `/`
    Slash,
    /// `*`
    Star,
    /// `!`
    Bang,
    /// `!=`
    BangEqual,
    /// `=`
    Equal,
    /// `==`
    EqualEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterEqual,
    /// `<`
    Less,
    /// `<=`
    LessEqual,
    /// Identifier.
    Identifier,
    /// Double-quoted string; the lexeme keeps its quotes.
    String,
    /// Number literal.
    Number,
    /// `and`
    And,
    /// `class`
    Class,
    /// `else`
    Else,
    /// `false`
    False,
    /// `for`
    For,
    /// `fun`
    Fun,
    /// `if`
    If,
    /// `nil`
    Nil,
    /// `or`
    Or,
    /// `print`
    Print,
    /// `return`
    Return,
    /// `super`
    Super,
    /// `this`
    This,
    /// `true`
    True,
    /// `var`
    Var,
    /// `while`
    While,
    /// End of input.
    Eof,
}

/// A token borrowing its lexeme from the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'src> {
    /// Kind.
    pub kind: TokenKind,
    /// Source text of the token (empty for `Eof`).
    pub lexeme: &'src str,
    /// 1-based line where the token ends (multi-line strings report their last line).
    pub line: u32,
}

/// Lexical error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexErrorKind {
    /// A character that starts no token.
    UnexpectedChar,
    /// A string literal without its closing quote.
    UnterminatedString,
}

/// Lexical error with its line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexError {
    /// Line of the error (for strings, the line where input ran out).
    pub line: u32,
    /// What went wrong.
    pub kind: LexErrorKind,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            LexErrorKind::UnexpectedChar => f.write_str("Unexpected character."),
            LexErrorKind::UnterminatedString => f.write_str("Unterminated string."),
        }
    }
}

impl std::error::Error for LexError {}

/// On-demand scanner over a source string.
pub struct Scanner<'src> {
    src: &'src str,
    bytes: &'src [u8],
    start: usize,
    off: usize,
    line: u32,
}

impl<'src> Scanner<'src> {
    /// Scanner positioned at the start of `src`, line 1.
    pub fn new(src: &'src str) -> Self { Self { src, bytes: src.as_bytes(), start: 0, off: 0, line: 1 } }

    /// Next token; `Eof` is returned forever once the input is exhausted.
    pub fn next_token(&mut self) -> Result<Token<'src>, LexError> {
        self.skip_ws_and_comments();
        self.start = self.off;

        let Some(c) = self.bump() else {
            return Ok(self.make(TokenKind::Eof));
        };

        let kind = match c {
            b if is_alpha(b) => self.identifier(),
            b if b.is_ascii_digit() => self.number(),
            b'"' => self.string()?,
            b'(' => TokenKind::LeftParen,
            b')' => TokenKind::RightParen,
            b'{' => TokenKind::LeftBrace,
            b'}' => TokenKind::RightBrace,
            b';' => TokenKind::Semicolon,
            b',' => TokenKind::Comma,
            b'.' => TokenKind::Dot,
            b'-' => TokenKind::Minus,
            b'+' => TokenKind::Plus,
            b'/' => TokenKind::Slash,
            b'*' => TokenKind::Star,
            b'!' => if self.eat(b'=') { TokenKind::BangEqual } else { TokenKind::Bang },
            b'=' => if self.eat(b'=') { TokenKind::EqualEqual } else { TokenKind::Equal },
            b'<' => if self.eat(b'=') { TokenKind::LessEqual } else { TokenKind::Less },
            b'>' => if self.eat(b'=') { TokenKind::GreaterEqual } else { TokenKind::Greater },
            _ => {
                self.skip_utf8_tail();
                return Err(LexError { line: self.line, kind: LexErrorKind::UnexpectedChar });
            }
        };

        Ok(self.make(kind))
    }

    /* ────────── Primitives internes ────────── */

    #[inline] fn peek(&self) -> Option<u8> { self.bytes.get(self.off).copied() }
    #[inline] fn peek2(&self) -> Option<u8> { self.bytes.get(self.off + 1).copied() }
    #[inline] fn bump(&mut self) -> Option<u8> { let b = self.peek(); if b.is_some() { self.off += 1; } b }
    #[inline] fn eat(&mut self, b: u8) -> bool { if self.peek() == Some(b) { self.off += 1; true } else { false } }

    fn make(&self, kind: TokenKind) -> Token<'src> {
        Token { kind, lexeme: &self.src[self.start..self.off], line: self.line }
    }

    // Keeps `off` on a char boundary after rejecting a non-ASCII lead byte.
    fn skip_utf8_tail(&mut self) {
        while self.peek().is_some_and(|b| b & 0xC0 == 0x80) {
            self.off += 1;
        }
    }

    fn skip_ws_and_comments(&mut self) {
        while let Some(b) = self.peek() {
            match b {
                b' ' | b'\r' | b'\t' => self.off += 1,
                b'\n' => {
                    self.line += 1;
                    self.off += 1;
                }
                b'/' if self.peek2() == Some(b'/') => {
                    while self.peek().is_some_and(|b| b != b'\n') {
                        self.off += 1;
                    }
                }
                _ => return,
            }
        }
    }

    fn string(&mut self) -> Result<TokenKind, LexError> {
        loop {
            match self.bump() {
                Some(b'"') => return Ok(TokenKind::String),
                Some(b'\n') => self.line += 1,
                Some(_) => {}
                None => return Err(LexError { line: self.line, kind: LexErrorKind::UnterminatedString }),
            }
        }
    }

    fn number(&mut self) -> TokenKind {
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.off += 1;
        }
        if self.peek() == Some(b'.') && self.peek2().is_some_and(|b| b.is_ascii_digit()) {
            self.off += 1;
            while self.peek().is_some_and(|b| b.is_ascii_digit()) {
                self.off += 1;
            }
        }
        TokenKind::Number
    }

    fn identifier(&mut self) -> TokenKind {
        while self.peek().is_some_and(|b| is_alpha(b) || b.is_ascii_digit()) {
            self.off += 1;
        }
        keyword_of(&self.src[self.start..self.off]).unwrap_or(TokenKind::Identifier)
    }
}

#[inline]
const fn is_alpha(b: u8) -> bool { b.is_ascii_alphabetic() || b == b'_' }

fn keyword_of(s: &str) -> Option<TokenKind> {
    Some(match s {
        "and" => TokenKind::And,
        "class" => TokenKind::Class,
        "else" => TokenKind::Else,
        "false" => TokenKind::False,
        "for" => TokenKind::For,
        "fun" => TokenKind::Fun,
        "if" => TokenKind::If,
        "nil" => TokenKind::Nil,
        "or" => TokenKind::Or,
        "print" => TokenKind::Print,
        "return" => TokenKind::Return,
        "super" => TokenKind::Super,
        "this" => TokenKind::This,
        "true" => TokenKind::True,
        "var" => TokenKind::Var,
        "while" => TokenKind::While,
        _ => return None,
    })
}
