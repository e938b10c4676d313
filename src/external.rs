use crate::command::{CommandFactory, ExecutableCommand, ExitCode, signal_status};
use crate::env::Environment;
use crate::interpreter::Factory;
use crate::process::os_error_text;
use anyhow::Result;
use log::{info, warn};
use nix::errno::Errno;
use std::borrow::Cow;
use std::ffi::OsStr;
use std::io::Write;
use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

/// Command that is not a builtin.
///
/// `program` is `None` when the name could not be resolved; running such a
/// command reports the failure and yields status 1.
pub struct ExternalCommand {
    name: String,
    program: Option<PathBuf>,
    args: Vec<String>,
}

impl ExternalCommand {
    pub fn new(name: String, program: Option<PathBuf>, args: Vec<String>) -> Self {
        Self {
            name,
            program,
            args,
        }
    }
}

impl CommandFactory for Factory<ExternalCommand> {
    fn try_create(
        &self,
        env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>> {
        let search_paths = env.get_var("PATH").unwrap_or_default();
        let program =
            find_command_path(OsStr::new(&search_paths), Path::new(name)).map(Cow::into_owned);
        Some(Box::new(ExternalCommand::new(
            name.to_string(),
            program,
            args.iter().map(|x| x.to_string()).collect(),
        )))
    }
}

impl ExecutableCommand for ExternalCommand {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<ExitCode> {
        let Some(program) = self.program else {
            warn!("{}: not found in PATH", self.name);
            writeln!(stdout, "{}: {}", self.name, Errno::ENOENT.desc())?;
            return Ok(1);
        };

        stdout.flush()?;
        info!("spawning {} {:?}", program.display(), self.args);
        let spawned = std::process::Command::new(&program)
            .arg0(&self.name)
            .args(&self.args)
            .envs(env.vars.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .current_dir(&env.current_dir)
            .spawn();
        let mut child = match spawned {
            Ok(child) => child,
            Err(err) => {
                warn!("{}: spawn failed: {err}", program.display());
                writeln!(stdout, "{}: {}", self.name, os_error_text(&err))?;
                return Ok(1);
            }
        };

        let exit_status = child.wait()?;
        match exit_status.code() {
            Some(x) => Ok(x),
            None => Ok(terminated_by_signal(exit_status)),
        }
    }
}

fn terminated_by_signal(exit_status: ExitStatus) -> ExitCode {
    if let Some(signal) = exit_status.signal() {
        signal_status(signal)
    } else if exit_status.core_dumped() {
        255
    } else {
        -1
    }
}

/// Resolve a command path the way a typical shell would.
///
/// Behavior:
/// - Absolute path: returns it if it exists.
/// - Relative with multiple components (e.g., `bin/sh`): returns it if it exists.
/// - `./foo`: returns it if it exists.
/// - Single path component (no separators): search each directory in `search_paths` (PATH)
///   and return the first existing match.
/// - Empty path: returns `None`.
///
/// Returns either a borrowed reference to the provided `path` or an owned `PathBuf`
/// when the result is discovered via PATH lookup.
pub fn find_command_path<'a>(search_paths: &OsStr, path: &'a Path) -> Option<Cow<'a, Path>> {
    if path.is_absolute() {
        return find_by_path(path).map(Cow::Borrowed);
    }

    if path.starts_with("./") && path.exists() {
        return Some(Cow::Borrowed(path));
    }

    let mut components = path.components();
    let first = components.next();
    let second = components.next();
    match (first, second) {
        (None, None) => None,
        // single component -> search in PATH
        (Some(x), None) => find_in_path(search_paths, x.as_os_str()).map(Cow::Owned),
        // multiple components -> relative to the current dir
        _ => find_by_path(path).map(Cow::Borrowed),
    }
}

fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_paths)
        .map(|dir| dir.join(cmd))
        .find(|path| path.is_file())
}

fn find_by_path(path: &Path) -> Option<&Path> {
    if path.exists() { Some(path) } else { None }
}
