//! Execution boundary for the external `git` binary.
//!
//! Every repository operation goes through the [`CommandRunner`] trait so the
//! parsing and patch-building layers can be exercised against canned output.
//! The production implementation, [`GitCommand`], shells out synchronously
//! and captures stdout/stderr; callers never observe partial results.

use error_set::error_set;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, warn};

error_set! {
    /// Errors from git command execution
    CommandError := {
        #[display("Failed to run git {command}: {message}")]
        SpawnFailed { command: String, message: String },
        #[display("git {command} failed: {stderr}")]
        ExitFailure { command: String, stdout: String, stderr: String },
        #[display("Invalid UTF-8 in git {command} output: {message}")]
        InvalidUtf8 { command: String, message: String },
        #[display("Failed to get stdin handle for git {command}")]
        StdinUnavailable { command: String },
        #[display("Failed to write input to git {command}: {message}")]
        WriteFailed { command: String, message: String },
        #[display("Failed to wait for git {command}: {message}")]
        WaitFailed { command: String, message: String },
    }
}

/// Synchronous command execution against one repository.
///
/// `run` executes `git <args>` and returns stdout on a zero exit; a non-zero
/// exit becomes [`CommandError::ExitFailure`] carrying the captured stderr
/// (and stdout, which git uses for conflict reports). `run_with_input` feeds
/// `input` to the child's stdin, used for `git apply` with patch text.
pub trait CommandRunner {
    fn run(&self, args: &[&str]) -> Result<String, CommandError>;
    fn run_with_input(&self, args: &[&str], input: &str) -> Result<String, CommandError>;
}

/// Production runner: invokes `git -C <repo> <args>`.
pub struct GitCommand {
    repo_path: PathBuf,
}

impl GitCommand {
    pub fn new(repo_path: impl AsRef<Path>) -> Self {
        Self {
            repo_path: repo_path.as_ref().to_path_buf(),
        }
    }

    fn subcommand(args: &[&str]) -> String {
        args.first().copied().unwrap_or("").to_string()
    }

    fn collect(args: &[&str], output: std::process::Output) -> Result<String, CommandError> {
        let command = Self::subcommand(args);
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
            warn!(command = %command, %stderr, "git exited non-zero");
            return Err(CommandError::ExitFailure {
                command,
                stdout,
                stderr,
            });
        }

        String::from_utf8(output.stdout).map_err(|e| CommandError::InvalidUtf8 {
            command,
            message: e.to_string(),
        })
    }
}

impl CommandRunner for GitCommand {
    fn run(&self, args: &[&str]) -> Result<String, CommandError> {
        debug!(?args, "running git");

        let output = Command::new("git")
            .arg("-C")
            .arg(&self.repo_path)
            .args(args)
            .output()
            .map_err(|e| CommandError::SpawnFailed {
                command: Self::subcommand(args),
                message: e.to_string(),
            })?;

        Self::collect(args, output)
    }

    fn run_with_input(&self, args: &[&str], input: &str) -> Result<String, CommandError> {
        use std::io::Write;

        debug!(?args, input_bytes = input.len(), "running git with stdin");

        let command = Self::subcommand(args);
        let mut child = Command::new("git")
            .arg("-C")
            .arg(&self.repo_path)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| CommandError::SpawnFailed {
                command: command.clone(),
                message: e.to_string(),
            })?;

        child
            .stdin
            .take()
            .ok_or(CommandError::StdinUnavailable {
                command: command.clone(),
            })?
            .write_all(input.as_bytes())
            .map_err(|e| CommandError::WriteFailed {
                command: command.clone(),
                message: e.to_string(),
            })?;

        let output = child
            .wait_with_output()
            .map_err(|e| CommandError::WaitFailed {
                command,
                message: e.to_string(),
            })?;

        Self::collect(args, output)
    }
}
