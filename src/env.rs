use crate::command::ExitCode;
use std::collections::HashMap;
use std::env as stdenv;
use std::path::PathBuf;

/// Session state shared by the interpreter and every command it runs.
///
/// The environment contains:
/// - `vars`: a snapshot of the process environment, passed on to spawned programs.
/// - `current_dir`: the working directory, kept in step with the process by `cd`.
/// - `exit_status`: set when a command asked the shell to terminate.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Key-value store of environment variables (e.g., PATH, HOME).
    pub vars: HashMap<String, String>,
    /// The current working directory for command execution.
    pub current_dir: PathBuf,
    /// Status the shell should terminate with, once requested by `exit` or a
    /// failed `exec`.
    pub exit_status: Option<ExitCode>,
}

impl Environment {
    /// Capture the current process state into a new `Environment` instance.
    pub fn new() -> Self {
        let vars = stdenv::vars().collect();
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            vars,
            current_dir,
            exit_status: None,
        }
    }

    /// Get the value of an environment variable.
    ///
    /// Looks up the key in `self.vars` first, falling back to `std::env::var`.
    pub fn get_var(&self, key: &str) -> Option<String> {
        self.vars
            .get(key)
            .cloned()
            .or_else(|| stdenv::var(key).ok())
    }

    /// Set or override an environment variable in `self.vars`.
    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    /// The user's home directory, from `HOME`.
    pub fn home(&self) -> Option<PathBuf> {
        self.get_var("HOME")
            .filter(|home| !home.is_empty())
            .map(PathBuf::from)
    }

    /// Asks the shell to terminate with `status`. The first request wins.
    pub fn request_exit(&mut self, status: ExitCode) {
        self.exit_status.get_or_insert(status);
    }

    pub fn should_exit(&self) -> bool {
        self.exit_status.is_some()
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
