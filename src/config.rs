//! Command-line options of the `minish` binary.

use crate::env::Environment;
use argh::FromArgs;
use log::LevelFilter;
use std::path::PathBuf;

/// File name of the history kept in the home directory.
pub const HISTORY_FILE: &str = ".minish_history";

#[derive(FromArgs, Debug)]
/// A small interactive shell with `&&`/`||` lists, `;` sequences and subshells.
pub struct Options {
    #[argh(option, short = 'c')]
    /// run the given command text instead of reading from the terminal.
    pub command: Option<String>,

    #[argh(option)]
    /// history file; defaults to ~/.minish_history.
    pub history: Option<PathBuf>,

    #[argh(switch)]
    /// do not load or save the history.
    pub no_history: bool,

    #[argh(option)]
    /// append log records to this file instead of the terminal.
    pub log_file: Option<PathBuf>,

    #[argh(option, default = "LevelFilter::Warn")]
    /// most verbose log level to emit (off, error, warn, info, debug, trace).
    pub log_level: LevelFilter,
}

impl Options {
    /// The history file to use, if any.
    pub fn history_path(&self, env: &Environment) -> Option<PathBuf> {
        if self.no_history {
            return None;
        }
        self.history
            .clone()
            .or_else(|| env.home().map(|home| home.join(HISTORY_FILE)))
    }
}
