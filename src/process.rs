//! Process-control primitives: fork, wait and OS error text.

use crate::command::{ExitCode, signal_status};
use anyhow::{Context, Result};
use log::trace;
use nix::errno::Errno;
use nix::sys::wait::{WaitStatus, waitpid};
use nix::unistd::{ForkResult, Pid, fork};
use std::io;

/// Forks the shell process.
pub fn fork_shell() -> Result<ForkResult> {
    // SAFETY: the child only walks an already built syntax tree and then
    // leaves through `std::process::exit`; it never returns into the caller.
    unsafe { fork() }.context("fork")
}

/// Blocks until `child` terminates and returns its exit status.
pub fn wait_child(child: Pid) -> Result<ExitCode> {
    loop {
        match waitpid(child, None) {
            Ok(WaitStatus::Exited(_, code)) => return Ok(code),
            Ok(WaitStatus::Signaled(_, signal, _)) => return Ok(signal_status(signal as i32)),
            Ok(other) => trace!("ignoring wait status {:?}", other),
            Err(Errno::EINTR) => continue,
            Err(err) => return Err(err).with_context(|| format!("waitpid {child}")),
        }
    }
}

/// The bare OS description of an error, e.g. `No such file or directory`.
pub fn os_error_text(err: &io::Error) -> String {
    match err.raw_os_error() {
        Some(code) => Errno::from_raw(code).desc().to_string(),
        None => err.to_string(),
    }
}
