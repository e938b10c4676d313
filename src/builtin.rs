use crate::command::{CommandFactory, ExecutableCommand, ExitCode};
use crate::env::Environment;
use crate::interpreter::Factory;
use crate::process::os_error_text;
use anyhow::{Result, anyhow, bail};
use argh::{EarlyExit, FromArgs};
use log::info;
use std::env;
use std::io::Write;
use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::process;

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed directly
/// in-process without spawning a child process, so their effects on the
/// [`Environment`] are visible to the rest of the session.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "cd" or "exit".
    fn name() -> &'static str;

    /// Executes the command.
    ///
    /// Usage errors are returned as `Err` with the complete user-facing
    /// message; they are printed and turned into status 1.
    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        match T::execute(*self, stdout, env) {
            Ok(x) => Ok(x),
            Err(e) => {
                writeln!(stdout, "{e}")?;
                Ok(1)
            }
        }
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn try_create(
        &self,
        _env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>> {
        if name != T::name() {
            return None;
        }
        // every word is an operand, even ones that look like flags (`exit -1`),
        // and builtins only take greedy positionals, so argh cannot bail out
        let operands: Vec<&str> = std::iter::once("--").chain(args.iter().copied()).collect();
        match T::from_args(&[name], &operands) {
            Ok(cmd) => Some(Box::new(cmd)),
            Err(EarlyExit { output, .. }) => {
                unreachable!("internal error: {name} rejected its operands: {output}")
            }
        }
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
/// If no target is provided, changes to the directory specified by the HOME environment variable.
pub struct Cd {
    #[argh(positional, greedy)]
    /// directory to switch to; absolute or relative to the current directory.
    pub args: Vec<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        let target = match self.args.as_slice() {
            [] => env.home().ok_or_else(|| anyhow!("cd: HOME not set"))?,
            [dir] => PathBuf::from(dir),
            _ => bail!("cd: too many arguments"),
        };

        let new_dir = if target.is_absolute() {
            target.clone()
        } else {
            env.current_dir.join(&target)
        };

        env::set_current_dir(&new_dir)
            .map_err(|err| anyhow!("cd: {}: {}", target.display(), os_error_text(&err)))?;
        env.current_dir = env::current_dir().unwrap_or(new_dir);
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Exit the shell with the given status, reduced modulo 256 (0 when omitted).
pub struct Exit {
    #[argh(positional, greedy)]
    /// exit status as a base-10 integer.
    pub args: Vec<String>,
}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        let status = match self.args.as_slice() {
            [] => 0,
            [code] => {
                let code: i64 = code.parse().map_err(|_| anyhow!("exit: invalid argument"))?;
                code.rem_euclid(256) as ExitCode
            }
            _ => bail!("exit: too many arguments"),
        };
        info!("exit requested with status {status}");
        env.request_exit(status);
        Ok(status)
    }
}

#[derive(FromArgs)]
/// Replace the shell with the given command.
pub struct Exec {
    #[argh(positional, greedy)]
    /// program to run, followed by its arguments.
    pub command: Vec<String>,
}

impl BuiltinCommand for Exec {
    fn name() -> &'static str {
        "exec"
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        let Some((program, args)) = self.command.split_first() else {
            return Ok(0);
        };

        info!("exec {:?}", self.command);
        stdout.flush()?;
        // only returns on failure
        let err = process::Command::new(program)
            .args(args)
            .envs(env.vars.iter())
            .exec();

        writeln!(stdout, "{}: {}", program, os_error_text(&err))?;
        env.request_exit(1);
        Ok(1)
    }
}
