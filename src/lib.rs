//! A tiny interactive shell.
//!
//! Input lines go through a [`lexer`], a recursive-descent [`parser`] that can
//! pause after a dangling `&&`/`||` and pick up again on the next line, and a
//! tree-walking [`Interpreter`] that runs builtins in-process, launches external
//! programs and forks for `( ... )` subshells.
//!
//! The public modules [`command`] and [`env`] expose traits and types for
//! implementing your own commands; [`repl`] drives the interpreter from any
//! [`repl::LineSource`].

pub mod ast;
mod builtin;
pub mod command;
pub mod config;
pub mod env;
mod external;
mod interpreter;
pub mod lexer;
pub mod logging;
pub mod parser;
mod process;
pub mod repl;
#[cfg(test)]
mod testing;

/// Just a convenient re-export of the command runner.
///
/// See [`Interpreter`] for the high-level API and examples.
pub use interpreter::Interpreter;
pub use parser::{ParseOutcome, PartialParse, SyntaxError, parse};
