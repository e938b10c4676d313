//! Recursive-descent parser for the shell command language.
//!
//! ```text
//! statements := list (';' list)*
//! list       := command (('&&'|'||') command)*
//! command    := '!'* word+ | '(' statements ')' | <empty>
//! ```
//!
//! A line that ends right after `&&` or `||` does not fail: parsing stops at
//! that point and hands back a [`PartialParse`] that continues the very same
//! list once the next line arrives.

use crate::ast::{
    Command, CommandList, ListOp, SimpleCommand, Statements, SubshellCommand, SyntaxTree,
};
use crate::lexer::{Lexer, Token, TokenKind};
use log::{debug, trace};
use thiserror::Error;

/// Errors that can occur while building a [`SyntaxTree`].
///
/// Positions are 0-based columns of the offending token in the line that was
/// being parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    /// A token that cannot appear at this point, usually left over after a
    /// complete statement sequence.
    #[error("col {position}: syntax error (token '{text}')")]
    UnexpectedToken { position: usize, text: String },
    /// A command was required next to `&&`/`||` (or instead of a stray `)`).
    #[error("col {position}: syntax error (expected command, not '{text}')")]
    ExpectedCommand { position: usize, text: String },
    /// A subshell body was not followed by `)`.
    #[error("col {position}: syntax error (expected ')' after subshell command, not '{text}')")]
    UnclosedSubshell { position: usize, text: String },
}

impl SyntaxError {
    fn unexpected_token(token: &Token<'_>) -> Self {
        SyntaxError::UnexpectedToken {
            position: token.position,
            text: token.text.to_string(),
        }
    }

    fn expected_command(token: &Token<'_>) -> Self {
        SyntaxError::ExpectedCommand {
            position: token.position,
            text: token.text.to_string(),
        }
    }

    fn unclosed_subshell(token: &Token<'_>) -> Self {
        SyntaxError::UnclosedSubshell {
            position: token.position,
            text: token.text.to_string(),
        }
    }

    /// Column of the offending token.
    pub fn position(&self) -> usize {
        match self {
            SyntaxError::UnexpectedToken { position, .. }
            | SyntaxError::ExpectedCommand { position, .. }
            | SyntaxError::UnclosedSubshell { position, .. } => *position,
        }
    }
}

/// Result of feeding a line to the parser.
#[derive(Debug)]
pub enum ParseOutcome {
    /// The input formed a complete statement sequence.
    Complete(SyntaxTree),
    /// The input ended right after `&&` or `||`; call [`PartialParse::resume`]
    /// with the next line.
    NeedsMoreInput(PartialParse),
}

/// A parse suspended after a dangling `&&`/`||`.
///
/// Holds the statements built so far. The open list is the last list of the
/// statements found by following the last command into `nesting` levels of
/// subshells.
#[derive(Debug)]
pub struct PartialParse {
    root: Statements,
    nesting: usize,
    end: usize,
}

impl PartialParse {
    /// Continues the suspended list with the commands in `source`.
    ///
    /// On a syntax error the partial tree is dropped along with `self`.
    pub fn resume(self, source: &str) -> Result<ParseOutcome, SyntaxError> {
        let tokens = lex(source)?;
        trace!("resume tokens: {:?}", tokens);
        AstBuilder::new(tokens).resume_ast(self)
    }

    /// Abandons the parse because no more input will come.
    pub fn into_error(self) -> SyntaxError {
        SyntaxError::ExpectedCommand {
            position: self.end,
            text: String::new(),
        }
    }

    /// Statements parsed so far, the open list included.
    pub fn statements(&self) -> &Statements {
        &self.root
    }

    /// How many subshells enclose the open list.
    pub fn nesting(&self) -> usize {
        self.nesting
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Progress {
    Complete,
    /// Input ran out right after a list operator in a list `nesting`
    /// subshells deep.
    Suspended { nesting: usize },
}

impl Progress {
    fn is_suspended(self) -> bool {
        matches!(self, Progress::Suspended { .. })
    }
}

enum Parsed {
    Empty,
    Complete(Command),
    /// A subshell whose body suspended; it is still open.
    Suspended(Command, Progress),
}

struct AstBuilder<'a> {
    tokens: Vec<Token<'a>>,
    pos: usize,
    eof: Token<'a>,
}

impl<'a> AstBuilder<'a> {
    fn new(tokens: Vec<Token<'a>>) -> Self {
        let eof = match tokens.last() {
            Some(token) if token.kind == TokenKind::Eof => *token,
            _ => panic!("internal error: token sequence has no end-of-input token"),
        };
        AstBuilder {
            tokens,
            pos: 0,
            eof,
        }
    }

    fn build_ast(mut self) -> Result<ParseOutcome, SyntaxError> {
        let mut root = Statements::default();
        let progress = self.parse_statements(&mut root, 0)?;
        self.finish(root, progress)
    }

    fn resume_ast(mut self, partial: PartialParse) -> Result<ParseOutcome, SyntaxError> {
        let PartialParse { mut root, nesting, .. } = partial;
        let progress = self.resume_statements(&mut root, 0, nesting)?;
        self.finish(root, progress)
    }

    fn finish(self, root: Statements, progress: Progress) -> Result<ParseOutcome, SyntaxError> {
        match progress {
            Progress::Suspended { nesting } => {
                debug!("line ended after a list operator, waiting for more input");
                Ok(ParseOutcome::NeedsMoreInput(PartialParse {
                    root,
                    nesting,
                    end: self.eof.position,
                }))
            }
            Progress::Complete => {
                let token = self.peek();
                if token.kind != TokenKind::Eof {
                    return Err(SyntaxError::unexpected_token(&token));
                }
                Ok(ParseOutcome::Complete(SyntaxTree { root }))
            }
        }
    }

    fn peek(&self) -> Token<'a> {
        self.tokens.get(self.pos).copied().unwrap_or(self.eof)
    }

    /// Advances past the current token. Never moves past `Eof`.
    fn consume(&mut self) -> Token<'a> {
        let token = self.peek();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.peek().kind == kind {
            self.consume();
            true
        } else {
            false
        }
    }

    fn eat_list_op(&mut self) -> Option<ListOp> {
        let op = match self.peek().kind {
            TokenKind::AmpAmp => ListOp::And,
            TokenKind::PipePipe => ListOp::Or,
            _ => return None,
        };
        self.consume();
        Some(op)
    }

    /// statements := list (';' list)*
    fn parse_statements(
        &mut self,
        statements: &mut Statements,
        nesting: usize,
    ) -> Result<Progress, SyntaxError> {
        loop {
            let mut list = CommandList::default();
            let progress = self.parse_list(&mut list, nesting)?;
            if !list.is_empty() {
                statements.lists.push(list);
            }
            if progress.is_suspended() || !self.eat(TokenKind::Semi) {
                return Ok(progress);
            }
        }
    }

    /// Re-enters the frames that were live when the parse suspended: the open
    /// list at `target` nesting first, then every enclosing level on the way
    /// back out to the root.
    fn resume_statements(
        &mut self,
        statements: &mut Statements,
        nesting: usize,
        target: usize,
    ) -> Result<Progress, SyntaxError> {
        let list = statements
            .lists
            .last_mut()
            .expect("internal error: suspended statements have no open list");

        let progress = if nesting == target {
            self.resume_list(list, nesting)?
        } else {
            let Some(Command::Subshell(subshell)) = list.commands.last_mut() else {
                panic!("internal error: suspended list does not end in a subshell");
            };
            match self.resume_statements(&mut subshell.body, nesting + 1, target)? {
                Progress::Complete => {
                    self.expect_closing_paren()?;
                    self.parse_list_tail(list, nesting)?
                }
                suspended => suspended,
            }
        };

        if progress.is_suspended() || !self.eat(TokenKind::Semi) {
            return Ok(progress);
        }
        self.parse_statements(statements, nesting)
    }

    /// list := command (('&&'|'||') command)*
    fn parse_list(
        &mut self,
        list: &mut CommandList,
        nesting: usize,
    ) -> Result<Progress, SyntaxError> {
        match self.parse_command(nesting)? {
            Parsed::Empty => {
                let next = self.peek();
                if next.is_list_op() {
                    return Err(SyntaxError::expected_command(&next));
                }
                return Ok(Progress::Complete);
            }
            Parsed::Complete(command) => list.commands.push(command),
            Parsed::Suspended(command, progress) => {
                list.commands.push(command);
                return Ok(progress);
            }
        }
        self.parse_list_tail(list, nesting)
    }

    fn parse_list_tail(
        &mut self,
        list: &mut CommandList,
        nesting: usize,
    ) -> Result<Progress, SyntaxError> {
        while let Some(op) = self.eat_list_op() {
            list.ops.push(op);
            if self.at_end() {
                trace!("suspending after '{}' at nesting {}", op.as_str(), nesting);
                return Ok(Progress::Suspended { nesting });
            }
            let progress = self.parse_operand(list, nesting)?;
            if progress.is_suspended() {
                return Ok(progress);
            }
        }
        Ok(Progress::Complete)
    }

    fn resume_list(
        &mut self,
        list: &mut CommandList,
        nesting: usize,
    ) -> Result<Progress, SyntaxError> {
        // a blank continuation line keeps waiting
        if self.at_end() {
            return Ok(Progress::Suspended { nesting });
        }
        let progress = self.parse_operand(list, nesting)?;
        if progress.is_suspended() {
            return Ok(progress);
        }
        self.parse_list_tail(list, nesting)
    }

    /// Parses the command on the right of a list operator.
    fn parse_operand(
        &mut self,
        list: &mut CommandList,
        nesting: usize,
    ) -> Result<Progress, SyntaxError> {
        match self.parse_command(nesting)? {
            Parsed::Empty => Err(SyntaxError::expected_command(&self.peek())),
            Parsed::Complete(command) => {
                list.commands.push(command);
                Ok(Progress::Complete)
            }
            Parsed::Suspended(command, progress) => {
                list.commands.push(command);
                Ok(progress)
            }
        }
    }

    /// command := '!'* word+ | '(' statements ')' | <empty>
    fn parse_command(&mut self, nesting: usize) -> Result<Parsed, SyntaxError> {
        let start = self.pos;
        let remaining = &self.tokens[start..];
        let word_count = remaining
            .iter()
            .position(|token| token.kind != TokenKind::Word)
            .unwrap_or(remaining.len());
        self.pos += word_count;

        if word_count == 0 {
            let next = self.peek();
            return match next.kind {
                TokenKind::LParen => self.parse_subshell(nesting),
                TokenKind::RParen if nesting == 0 => Err(SyntaxError::expected_command(&next)),
                _ => Ok(Parsed::Empty),
            };
        }

        let words = &self.tokens[start..self.pos];
        let bangs = words.iter().take_while(|token| token.text == "!").count();
        if bangs == words.len() {
            return Ok(Parsed::Empty);
        }

        Ok(Parsed::Complete(Command::Simple(SimpleCommand {
            words: words[bangs..]
                .iter()
                .map(|token| token.text.to_string())
                .collect(),
            negated: bangs % 2 == 1,
        })))
    }

    /// subshell := '(' statements ')'
    fn parse_subshell(&mut self, nesting: usize) -> Result<Parsed, SyntaxError> {
        self.consume();
        let mut body = Statements::default();
        let progress = self.parse_statements(&mut body, nesting + 1)?;
        let command = Command::Subshell(SubshellCommand { body });
        if progress.is_suspended() {
            return Ok(Parsed::Suspended(command, progress));
        }
        self.expect_closing_paren()?;
        Ok(Parsed::Complete(command))
    }

    fn expect_closing_paren(&mut self) -> Result<(), SyntaxError> {
        let token = self.peek();
        if token.kind != TokenKind::RParen {
            return Err(SyntaxError::unclosed_subshell(&token));
        }
        self.consume();
        Ok(())
    }
}

/// Lexes a line for parsing.
///
/// A scan that stopped on a lone `&` or `|` is reported as a syntax error at
/// that character.
fn lex(source: &str) -> Result<Vec<Token<'_>>, SyntaxError> {
    let mut lexer = Lexer::new(source);
    let tokens = lexer.make_tokens();
    if tokens.last().is_some_and(|token| token.kind == TokenKind::Eof) {
        return Ok(tokens);
    }
    let position = lexer.position();
    let text = source[position..]
        .chars()
        .next()
        .map(String::from)
        .unwrap_or_default();
    Err(SyntaxError::UnexpectedToken { position, text })
}

/// Parses one line of input.
pub fn parse(source: &str) -> Result<ParseOutcome, SyntaxError> {
    let tokens = lex(source)?;
    trace!("tokens: {:?}", tokens);
    construct_ast(tokens)
}

/// Builds a syntax tree from an already lexed line.
///
/// # Panics
///
/// The sequence must end with [`TokenKind::Eof`], as every complete lexer
/// scan does; anything else is an internal invariant violation.
pub fn construct_ast(tokens: Vec<Token<'_>>) -> Result<ParseOutcome, SyntaxError> {
    AstBuilder::new(tokens).build_ast()
}
