use std::io;
use std::process::Command;

/// Runs host shell commands on behalf of scripts
pub trait Shell {
    /// Run `command` to completion and return its exit status.
    /// A command killed by a signal reports -1.
    fn run(&self, command: &str) -> io::Result<i32>;
}

/// Runs commands through the platform shell, blocking until they finish
pub struct SystemShell;

impl Shell for SystemShell {
    fn run(&self, command: &str) -> io::Result<i32> {
        tracing::info!(command, "running shell command");

        #[cfg(windows)]
        let status = Command::new("cmd").args(["/C", command]).status()?;
        #[cfg(not(windows))]
        let status = Command::new("sh").args(["-c", command]).status()?;

        let code = status.code().unwrap_or(-1);
        tracing::debug!(command, code, "shell command finished");
        Ok(code)
    }
}
