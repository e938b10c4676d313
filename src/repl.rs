//! Line-oriented driver: reads lines, feeds them to the parser and runs
//! whatever becomes complete.

use crate::command::ExitCode;
use crate::interpreter::Interpreter;
use crate::parser::{ParseOutcome, PartialParse, SyntaxError, parse};
use anyhow::{Context, Result};
use log::{debug, info, warn};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::Write;
use std::mem;
use std::path::PathBuf;

pub const PROMPT: &str = "$ ";
/// Shown after a command failed.
pub const FAILED_PROMPT: &str = "\x1b[31m$ \x1b[0m";
/// Shown while a line is being continued.
pub const CONTINUATION_PROMPT: &str = "> ";

pub const SYNTAX_ERROR_STATUS: ExitCode = 2;
pub const INTERRUPTED_STATUS: ExitCode = 130;

/// One read from a [`LineSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Text(String),
    /// The user pressed Ctrl-C.
    Interrupted,
    Eof,
}

/// Where the driver gets its input from.
pub trait LineSource {
    fn read_line(&mut self, prompt: &str) -> Result<Line>;

    /// Records a complete input line.
    fn add_history(&mut self, _line: &str) -> Result<()> {
        Ok(())
    }

    /// Called once the driver is done with the source.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Interactive line editor with optional persistent history.
pub struct Editor {
    rl: DefaultEditor,
    history: Option<PathBuf>,
}

impl Editor {
    pub fn new(history: Option<PathBuf>) -> Result<Self> {
        let mut rl = DefaultEditor::new()?;
        if let Some(path) = &history {
            // a missing file just means a fresh history
            if let Err(err) = rl.load_history(path) {
                debug!("no history loaded from {}: {err}", path.display());
            }
        }
        Ok(Self { rl, history })
    }
}

impl LineSource for Editor {
    fn read_line(&mut self, prompt: &str) -> Result<Line> {
        match self.rl.readline(prompt) {
            Ok(line) => Ok(Line::Text(line)),
            Err(ReadlineError::Interrupted) => Ok(Line::Interrupted),
            Err(ReadlineError::Eof) => Ok(Line::Eof),
            Err(err) => Err(err).context("reading input"),
        }
    }

    fn add_history(&mut self, line: &str) -> Result<()> {
        self.rl.add_history_entry(line)?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if let Some(path) = &self.history {
            self.rl
                .save_history(path)
                .with_context(|| format!("saving history to {}", path.display()))?;
        }
        Ok(())
    }
}

/// The lines of a script given on the command line.
pub struct ScriptLines {
    lines: std::vec::IntoIter<String>,
}

impl ScriptLines {
    pub fn new(script: &str) -> Self {
        let lines: Vec<String> = script.lines().map(str::to_string).collect();
        Self {
            lines: lines.into_iter(),
        }
    }
}

impl LineSource for ScriptLines {
    fn read_line(&mut self, _prompt: &str) -> Result<Line> {
        Ok(self.lines.next().map_or(Line::Eof, Line::Text))
    }
}

/// Runs lines from `source` on `shell` until the input ends or a command
/// requests exit. Returns the status the shell should exit with.
///
/// Command output goes to `stdout`; syntax errors go to `stderr`. The
/// source is closed however the loop ends.
pub fn drive(
    shell: &mut Interpreter,
    source: &mut dyn LineSource,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> Result<ExitCode> {
    let result = read_eval_loop(shell, source, stdout, stderr);
    let closed = source.close();
    let status = result?;
    closed?;
    Ok(status)
}

fn read_eval_loop(
    shell: &mut Interpreter,
    source: &mut dyn LineSource,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> Result<ExitCode> {
    let mut status = 0;
    let mut pending: Option<PartialParse> = None;
    // text of a line continued with a trailing backslash
    let mut joined = String::new();

    loop {
        let prompt = if pending.is_some() || !joined.is_empty() {
            CONTINUATION_PROMPT
        } else if status == 0 {
            PROMPT
        } else {
            FAILED_PROMPT
        };

        let line = match source.read_line(prompt)? {
            Line::Text(line) => line,
            Line::Interrupted => {
                debug!("interrupted, dropping pending input");
                pending = None;
                joined.clear();
                status = INTERRUPTED_STATUS;
                continue;
            }
            Line::Eof if !joined.is_empty() => mem::take(&mut joined),
            Line::Eof => {
                if let Some(partial) = pending.take() {
                    status = report(stderr, &partial.into_error())?;
                }
                break;
            }
        };

        if let Some(head) = line.strip_suffix('\\') {
            joined.push_str(head);
            continue;
        }
        joined.push_str(&line);
        let text = mem::take(&mut joined);

        if pending.is_none() && text.trim().is_empty() {
            continue;
        }
        if !text.trim().is_empty() {
            source.add_history(&text)?;
        }

        let outcome = match pending.take() {
            Some(partial) => partial.resume(&text),
            None => parse(&text),
        };
        match outcome {
            Ok(ParseOutcome::Complete(tree)) => {
                status = match shell.execute_with_output(&tree, stdout) {
                    Ok(status) => status,
                    Err(err) => {
                        warn!("execution failed: {err:#}");
                        writeln!(stderr, "minish: {err:#}")?;
                        1
                    }
                };
                stdout.flush()?;
                if let Some(requested) = shell.exit_status() {
                    info!("exiting with status {requested}");
                    status = requested;
                    break;
                }
            }
            Ok(ParseOutcome::NeedsMoreInput(partial)) => pending = Some(partial),
            Err(err) => status = report(stderr, &err)?,
        }
    }

    Ok(status)
}

fn report(stderr: &mut dyn Write, err: &SyntaxError) -> Result<ExitCode> {
    debug!("syntax error: {err:?}");
    writeln!(stderr, "{err}")?;
    Ok(SYNTAX_ERROR_STATUS)
}
