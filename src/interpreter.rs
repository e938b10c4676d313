use crate::ast::{Command, CommandList, SimpleCommand, Statements, SubshellCommand, SyntaxTree};
use crate::command::{CommandFactory, ExitCode, negate};
use crate::env::Environment;
use crate::process::{fork_shell, wait_child};
use crate::repl::{self, Editor, LineSource, ScriptLines};
use anyhow::anyhow;
use log::{debug, warn};
use nix::unistd::ForkResult;
use std::io::{self, Write};
use std::path::PathBuf;

/// Factory allows creating instances of ExecutableCommand.
///
/// Only supports commands defined in this crate: builtins and the external launcher.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// A minimal shell interpreter that executes syntax trees of builtins,
/// external programs and subshells.
///
/// The interpreter maintains an [`Environment`] and a list of [`CommandFactory`] objects
/// that are queried in order to create commands by name. See [`Default`] for the
/// factories included out of the box.
///
/// Example
/// ```no_run
/// use minish::{Interpreter, ParseOutcome, parse};
/// let mut sh = Interpreter::default();
/// if let Ok(ParseOutcome::Complete(tree)) = parse("true && echo yes") {
///     let code = sh.execute(&tree).unwrap();
///     assert_eq!(code, 0);
/// }
/// ```
pub struct Interpreter {
    env: Environment,
    commands: Vec<Box<dyn CommandFactory>>,
}

impl Interpreter {
    /// Create a new interpreter with a custom set of command factories.
    pub fn new(commands: Vec<Box<dyn CommandFactory>>) -> Self {
        Self::with_env(Environment::new(), commands)
    }

    pub fn with_env(env: Environment, commands: Vec<Box<dyn CommandFactory>>) -> Self {
        Self { env, commands }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Status requested by `exit` (or a failed `exec`), if any.
    pub fn exit_status(&self) -> Option<ExitCode> {
        self.env.exit_status
    }

    /// Run a single command invocation by name with arguments.
    ///
    /// Returns the command's exit code or an error if no factory recognizes
    /// the name or the command fails to execute.
    pub fn run(&mut self, name: &str, args: &[&str]) -> anyhow::Result<ExitCode> {
        self.run_with_output(name, args, &mut io::stdout())
    }

    pub fn run_with_output(
        &mut self,
        name: &str,
        args: &[&str],
        stdout: &mut dyn Write,
    ) -> anyhow::Result<ExitCode> {
        for factory in &self.commands {
            if let Some(cmd) = factory.try_create(&self.env, name, args) {
                return cmd.execute(stdout, &mut self.env);
            }
        }
        Err(anyhow!("command not found: {}", name))
    }

    /// Executes a parsed line, returning the status of the last command run.
    ///
    /// When a command requests termination the walk stops right there and
    /// the requested status is returned.
    pub fn execute(&mut self, tree: &SyntaxTree) -> anyhow::Result<ExitCode> {
        self.execute_with_output(tree, &mut io::stdout())
    }

    pub fn execute_with_output(
        &mut self,
        tree: &SyntaxTree,
        stdout: &mut dyn Write,
    ) -> anyhow::Result<ExitCode> {
        debug!("executing {:?}", tree);
        self.execute_statements(&tree.root, stdout)
    }

    /// Interactive read-eval-print loop over a line editor.
    ///
    /// Returns the status the shell should terminate with.
    pub fn repl(&mut self, history: Option<PathBuf>) -> anyhow::Result<ExitCode> {
        let mut editor = Editor::new(history)?;
        self.drive(&mut editor)
    }

    /// Runs `script` as if its lines were typed at the prompt.
    pub fn run_source(&mut self, script: &str) -> anyhow::Result<ExitCode> {
        self.drive(&mut ScriptLines::new(script))
    }

    /// Reads, parses and executes lines from `source` until it is exhausted
    /// or a command asks the shell to exit.
    pub fn drive(&mut self, source: &mut dyn LineSource) -> anyhow::Result<ExitCode> {
        repl::drive(self, source, &mut io::stdout(), &mut io::stderr())
    }

    fn execute_statements(
        &mut self,
        statements: &Statements,
        stdout: &mut dyn Write,
    ) -> anyhow::Result<ExitCode> {
        let mut status = 0;
        for list in &statements.lists {
            status = self.execute_list(list, stdout)?;
            if let Some(requested) = self.env.exit_status {
                return Ok(requested);
            }
        }
        Ok(status)
    }

    fn execute_list(
        &mut self,
        list: &CommandList,
        stdout: &mut dyn Write,
    ) -> anyhow::Result<ExitCode> {
        debug_assert!(list.is_well_formed(), "malformed list {:?}", list);
        let mut status = 0;
        for (i, command) in list.commands.iter().enumerate() {
            status = self.execute_command(command, stdout)?;
            if let Some(requested) = self.env.exit_status {
                return Ok(requested);
            }
            if let Some(op) = list.ops.get(i)
                && op.short_circuits(status)
            {
                debug!("'{}' skips the rest of the list after status {status}", op.as_str());
                break;
            }
        }
        Ok(status)
    }

    fn execute_command(
        &mut self,
        command: &Command,
        stdout: &mut dyn Write,
    ) -> anyhow::Result<ExitCode> {
        match command {
            Command::Simple(simple) => self.execute_simple_command(simple, stdout),
            Command::Subshell(subshell) => self.execute_subshell_command(subshell, stdout),
        }
    }

    fn execute_simple_command(
        &mut self,
        command: &SimpleCommand,
        stdout: &mut dyn Write,
    ) -> anyhow::Result<ExitCode> {
        let Some((name, args)) = command.words.split_first() else {
            return Err(anyhow!("empty simple command"));
        };
        let args: Vec<&str> = args.iter().map(|s| s.as_str()).collect();
        let status = self.run_with_output(name, &args, stdout)?;
        Ok(if command.negated { negate(status) } else { status })
    }

    fn execute_subshell_command(
        &mut self,
        subshell: &SubshellCommand,
        stdout: &mut dyn Write,
    ) -> anyhow::Result<ExitCode> {
        stdout.flush()?;
        match fork_shell()? {
            ForkResult::Child => {
                let status = match self.execute_statements(&subshell.body, stdout) {
                    Ok(status) => status,
                    Err(err) => {
                        warn!("subshell failed: {err:#}");
                        1
                    }
                };
                let _ = stdout.flush();
                std::process::exit(status);
            }
            ForkResult::Parent { child } => {
                debug!("waiting for subshell {child}");
                wait_child(child)
            }
        }
    }
}

impl Default for Interpreter {
    /// Create an interpreter with the default set of commands:
    /// - built-ins: `cd`, `exit`, `exec`
    /// - external command launcher, which accepts any other name
    fn default() -> Self {
        use crate::builtin::*;
        use crate::external::ExternalCommand;
        Self::new(vec![
            Box::new(Factory::<Cd>::default()),
            Box::new(Factory::<Exit>::default()),
            Box::new(Factory::<Exec>::default()),
            Box::new(Factory::<ExternalCommand>::default()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{ParseOutcome, parse};
    use crate::testing::{CallLog, FakeCommands, test_env};

    fn fake_shell() -> (Interpreter, CallLog) {
        let (fakes, calls) = FakeCommands::new();
        (Interpreter::with_env(test_env(), vec![Box::new(fakes)]), calls)
    }

    fn tree(source: &str) -> SyntaxTree {
        match parse(source).unwrap() {
            ParseOutcome::Complete(tree) => tree,
            other => panic!("expected a complete parse of {source:?}, got {other:?}"),
        }
    }

    fn execute(sh: &mut Interpreter, source: &str) -> (ExitCode, String) {
        let mut out = Vec::new();
        let code = sh.execute_with_output(&tree(source), &mut out).unwrap();
        (code, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_and_or_chain_runs_every_command() {
        let (mut sh, calls) = fake_shell();
        let (code, out) = execute(&mut sh, "true && false || say ok");
        assert_eq!(code, 0);
        assert_eq!(out, "ok\n");
        assert_eq!(*calls.borrow(), ["true", "false", "say ok"]);
    }

    #[test]
    fn test_short_circuit_skips_rest_of_list() {
        let (mut sh, calls) = fake_shell();
        let (code, out) = execute(&mut sh, "false && say a || say b");
        assert_eq!(code, 1);
        assert_eq!(out, "");
        assert_eq!(*calls.borrow(), ["false"]);

        calls.borrow_mut().clear();
        let (code, _) = execute(&mut sh, "true || false && false");
        assert_eq!(code, 0);
        assert_eq!(*calls.borrow(), ["true"]);
    }

    #[test]
    fn test_list_status_is_last_executed_status() {
        let (mut sh, _) = fake_shell();
        assert_eq!(execute(&mut sh, "status 7 || true").0, 0);
        assert_eq!(execute(&mut sh, "true && status 42").0, 42);
        assert_eq!(execute(&mut sh, "status 3 && true").0, 3);
    }

    #[test]
    fn test_statements_run_in_order() {
        let (mut sh, calls) = fake_shell();
        let (code, out) = execute(&mut sh, "say one; false && say two; say three; false");
        assert_eq!(code, 1);
        assert_eq!(out, "one\nthree\n");
        assert_eq!(*calls.borrow(), ["say one", "false", "say three", "false"]);
    }

    #[test]
    fn test_trailing_semicolon_keeps_last_status() {
        let (mut sh, _) = fake_shell();
        assert_eq!(execute(&mut sh, "false;").0, 1);
    }

    #[test]
    fn test_negation() {
        let (mut sh, _) = fake_shell();
        assert_eq!(execute(&mut sh, "! true").0, 1);
        assert_eq!(execute(&mut sh, "! status 5").0, 0);
        assert_eq!(execute(&mut sh, "! ! true").0, 0);
        assert_eq!(execute(&mut sh, "! false && say negated").1, "negated\n");
    }

    #[test]
    fn test_exit_request_stops_the_walk() {
        let (mut sh, calls) = fake_shell();
        let (code, out) = execute(&mut sh, "say a; quit 4 || say b; say c");
        assert_eq!(code, 4);
        assert_eq!(out, "a\n");
        assert_eq!(*calls.borrow(), ["say a", "quit 4"]);
        assert_eq!(sh.exit_status(), Some(4));
    }

    #[test]
    fn test_negated_exit_keeps_requested_status() {
        let (mut sh, _) = fake_shell();
        assert_eq!(execute(&mut sh, "! quit 0").0, 0);
    }

    #[test]
    fn test_unknown_command_is_an_error() {
        let (mut sh, _) = fake_shell();
        let err = sh
            .execute_with_output(&tree("nope"), &mut Vec::new())
            .unwrap_err();
        assert_eq!(err.to_string(), "command not found: nope");
    }

    #[test]
    fn test_factories_are_tried_in_order() {
        let (first, first_calls) = FakeCommands::new();
        let (second, second_calls) = FakeCommands::new();
        let mut sh = Interpreter::with_env(test_env(), vec![Box::new(first), Box::new(second)]);
        sh.run_with_output("true", &[], &mut Vec::new()).unwrap();
        assert_eq!(first_calls.borrow().len(), 1);
        assert!(second_calls.borrow().is_empty());
    }

    #[test]
    fn test_default_table_dispatches_builtins_first() {
        let mut sh = Interpreter::with_env(test_env(), Interpreter::default().commands);
        let mut out = Vec::new();
        let code = sh.run_with_output("exit", &["257"], &mut out).unwrap();
        assert_eq!(code, 1);
        assert_eq!(sh.exit_status(), Some(1));

        let mut sh = Interpreter::with_env(test_env(), Interpreter::default().commands);
        let code = sh.run_with_output("cd", &["a", "b"], &mut out).unwrap();
        assert_eq!(code, 1);
        assert_eq!(String::from_utf8(out).unwrap(), "cd: too many arguments\n");
    }

    #[test]
    fn test_default_table_reports_missing_programs() {
        let mut env = test_env();
        env.set_var("PATH", "/bin:/usr/bin");
        let mut sh = Interpreter::with_env(env, Interpreter::default().commands);
        let mut out = Vec::new();
        let code = sh
            .execute_with_output(&tree("no-such-program-77 && exit 3"), &mut out)
            .unwrap();
        assert_eq!(code, 1);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "no-such-program-77: No such file or directory\n"
        );
        assert_eq!(sh.exit_status(), None);
    }
}
