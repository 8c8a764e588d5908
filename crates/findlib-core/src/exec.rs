//! Running package-manager commands.
//!
//! Backends talk to the host only through [`CommandRunner`], so tests can
//! substitute canned output for real package databases.

use std::collections::HashSet;
use std::io;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// Outcome class of a finished command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    /// Exit code zero and nothing on stderr.
    Ok,
    /// Exit code zero but something was written to stderr.
    Warning,
    /// Non-zero exit code.
    Failed,
}

/// Output from running a command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; -1 when the process was killed by a signal.
    pub exit_code: i32,
    /// Captured stdout with one trailing line terminator removed.
    pub stdout: String,
    /// Captured stderr with one trailing line terminator removed.
    pub stderr: String,
}

impl CommandOutput {
    /// Build an output, chomping the captured streams.
    pub fn new(exit_code: i32, stdout: &str, stderr: &str) -> Self {
        Self {
            exit_code,
            stdout: chomp(stdout).to_string(),
            stderr: chomp(stderr).to_string(),
        }
    }

    pub fn status(&self) -> CommandStatus {
        if self.exit_code != 0 {
            CommandStatus::Failed
        } else if self.stderr.is_empty() {
            CommandStatus::Ok
        } else {
            CommandStatus::Warning
        }
    }

    /// Stdout of a command that did not fail.
    pub fn stdout_if_ok(&self) -> Option<&str> {
        (self.status() != CommandStatus::Failed).then_some(self.stdout.as_str())
    }
}

/// Strip one trailing `\r\n`, `\n` or `\r`.
pub fn chomp(s: &str) -> &str {
    s.strip_suffix("\r\n")
        .or_else(|| s.strip_suffix('\n'))
        .or_else(|| s.strip_suffix('\r'))
        .unwrap_or(s)
}

/// Runs shell command lines and locates programs.
pub trait CommandRunner: Send + Sync {
    /// Run `command` through the host shell and capture its output.
    fn run(&self, command: &str) -> io::Result<CommandOutput>;

    /// Whether `program` is on the search path.
    fn program_exists(&self, program: &str) -> bool;

    /// Run `command` and return its stdout, or `None` if it failed, could
    /// not be started, or printed nothing.
    fn stdout(&self, command: &str) -> Option<String> {
        match self.run(command) {
            Ok(output) => match output.stdout_if_ok() {
                Some(stdout) if !stdout.is_empty() => Some(stdout.to_string()),
                _ => None,
            },
            Err(e) => {
                tracing::debug!(command, error = %e, "failed to spawn command");
                None
            }
        }
    }
}

/// The real runner: `sh -c` (or `cmd /C`) plus a `PATH` lookup.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellRunner;

impl CommandRunner for ShellRunner {
    fn run(&self, command: &str) -> io::Result<CommandOutput> {
        let (shell, shell_arg) = if cfg!(windows) {
            ("cmd.exe", "/C")
        } else {
            ("sh", "-c")
        };

        tracing::trace!(command, "running");
        let output = Command::new(shell)
            .arg(shell_arg)
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()?;

        Ok(CommandOutput::new(
            output.status.code().unwrap_or(-1),
            &String::from_utf8_lossy(&output.stdout),
            &String::from_utf8_lossy(&output.stderr),
        ))
    }

    fn program_exists(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}

/// Quote `arg` for a POSIX shell command line.
pub fn shell_quote(arg: &str) -> String {
    if !arg.is_empty()
        && arg
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"-_.+/:@".contains(&b))
    {
        return arg.to_string();
    }
    format!("'{}'", arg.replace('\'', r"'\''"))
}

/// Every executable on `PATH` matching one of `names`, in `PATH` order.
pub fn program_paths(names: &[&str]) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let mut paths = Vec::new();
    for name in names {
        let Ok(found) = which::which_all(name) else {
            continue;
        };
        for path in found {
            if seen.insert(path.clone()) {
                paths.push(path);
            }
        }
    }
    paths
}
