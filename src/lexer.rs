//! Lexical analysis for the shell command language.
//!
//! The lexer turns a line of source text into a flat sequence of [`Token`]s.
//! Tokens borrow their text from the source, so the source must outlive them.

/// Kind of a lexical token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// A run of non-special, non-whitespace characters.
    Word,
    /// The statement separator, `;`.
    Semi,
    /// Opening parenthesis of a subshell, `(`.
    LParen,
    /// Closing parenthesis of a subshell, `)`.
    RParen,
    /// The AND list operator, `&&`.
    AmpAmp,
    /// The OR list operator, `||`.
    PipePipe,
    /// End of input. Always the last token of a complete scan.
    Eof,
}

/// A token resulting from lexical analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    /// What kind of token this is.
    pub kind: TokenKind,
    /// The exact source text of the token. Empty for [`TokenKind::Eof`].
    pub text: &'a str,
    /// 0-based byte offset of the token in the source.
    pub position: usize,
}

impl<'a> Token<'a> {
    pub fn new(kind: TokenKind, text: &'a str, position: usize) -> Self {
        Self {
            kind,
            text,
            position,
        }
    }

    /// True for `&&` and `||`.
    pub fn is_list_op(&self) -> bool {
        matches!(self.kind, TokenKind::AmpAmp | TokenKind::PipePipe)
    }
}

fn is_special(byte: u8) -> bool {
    byte.is_ascii_whitespace() || matches!(byte, b';' | b'(' | b')' | b'&' | b'|')
}

/// Scanner over a single source string.
///
/// Special characters are all ASCII, so scanning bytes never splits a
/// multi-byte character inside a word.
pub struct Lexer<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a lexer that scans `source` from the beginning.
    pub fn new(source: &'a str) -> Self {
        Self::starting_at(source, 0)
    }

    /// Creates a lexer that starts scanning at byte `offset` of `source`.
    ///
    /// Token positions stay absolute in `source`, which lets a caller lex only
    /// the part of an accumulated buffer that was appended since the last scan.
    pub fn starting_at(source: &'a str, offset: usize) -> Self {
        Self {
            source,
            pos: offset.min(source.len()),
        }
    }

    /// Current scan offset. After [`Lexer::make_tokens`] stopped early this
    /// points at the character that could not be tokenized.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Scans the remaining input.
    ///
    /// A complete scan ends with exactly one [`TokenKind::Eof`] token. A lone
    /// `&` or `|` has no token kind: the scan stops there and the returned
    /// sequence has no `Eof`.
    pub fn make_tokens(&mut self) -> Vec<Token<'a>> {
        let mut out = Vec::new();

        loop {
            while self.peek_byte(0).is_some_and(|b| b.is_ascii_whitespace()) {
                self.pos += 1;
            }

            let start = self.pos;
            let kind = match self.peek_byte(0) {
                None => Some(TokenKind::Eof),
                Some(b';') => self.single(TokenKind::Semi),
                Some(b'(') => self.single(TokenKind::LParen),
                Some(b')') => self.single(TokenKind::RParen),
                Some(b'&') => self.double(b'&', TokenKind::AmpAmp),
                Some(b'|') => self.double(b'|', TokenKind::PipePipe),
                Some(_) => {
                    while self.peek_byte(0).is_some_and(|b| !is_special(b)) {
                        self.pos += 1;
                    }
                    Some(TokenKind::Word)
                }
            };

            let Some(kind) = kind else {
                break;
            };

            out.push(Token::new(kind, &self.source[start..self.pos], start));
            if kind == TokenKind::Eof {
                break;
            }
        }

        out
    }

    fn peek_byte(&self, n: usize) -> Option<u8> {
        self.source.as_bytes().get(self.pos + n).copied()
    }

    fn single(&mut self, kind: TokenKind) -> Option<TokenKind> {
        self.pos += 1;
        Some(kind)
    }

    fn double(&mut self, second: u8, kind: TokenKind) -> Option<TokenKind> {
        if self.peek_byte(1) == Some(second) {
            self.pos += 2;
            Some(kind)
        } else {
            None
        }
    }
}

/// Tokenizes a whole line.
///
/// See [`Lexer::make_tokens`] for the shape of the result.
pub fn split_into_tokens(source: &str) -> Vec<Token<'_>> {
    Lexer::new(source).make_tokens()
}
