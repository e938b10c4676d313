//! Helpers shared by the unit tests.

use crate::command::{CommandFactory, ExecutableCommand, ExitCode};
use crate::env::Environment;
use anyhow::Result;
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;
use std::sync::{Mutex, MutexGuard, OnceLock};

/// Serializes tests that touch the process working directory.
pub fn lock_current_dir() -> MutexGuard<'static, ()> {
    static MUTEX: OnceLock<Mutex<()>> = OnceLock::new();
    MUTEX
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub fn test_env() -> Environment {
    Environment {
        vars: HashMap::new(),
        current_dir: std::env::current_dir().unwrap(),
        exit_status: None,
    }
}

/// Log of command lines run through a [`FakeCommands`] factory.
pub type CallLog = Rc<RefCell<Vec<String>>>;

/// Factory for in-process fake commands, recording every invocation.
///
/// - `true` / `false` succeed / fail;
/// - `status N` returns `N`;
/// - `say WORDS..` writes the words and succeeds;
/// - `quit N` requests the shell to exit with `N`.
///
/// Any other name is not recognized.
pub struct FakeCommands {
    pub calls: CallLog,
}

impl FakeCommands {
    pub fn new() -> (Self, CallLog) {
        let calls = CallLog::default();
        (
            Self {
                calls: calls.clone(),
            },
            calls,
        )
    }
}

struct FakeCommand {
    name: String,
    args: Vec<String>,
}

impl CommandFactory for FakeCommands {
    fn try_create(
        &self,
        _env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>> {
        if !matches!(name, "true" | "false" | "status" | "say" | "quit") {
            return None;
        }
        let line = std::iter::once(name)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        self.calls.borrow_mut().push(line);
        Some(Box::new(FakeCommand {
            name: name.to_string(),
            args: args.iter().map(|x| x.to_string()).collect(),
        }))
    }
}

impl ExecutableCommand for FakeCommand {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        let number = || self.args.first().and_then(|x| x.parse().ok()).unwrap_or(0);
        Ok(match self.name.as_str() {
            "true" => 0,
            "false" => 1,
            "status" => number(),
            "say" => {
                writeln!(stdout, "{}", self.args.join(" "))?;
                0
            }
            "quit" => {
                env.request_exit(number());
                number()
            }
            _ => unreachable!("factory filters names"),
        })
    }
}
