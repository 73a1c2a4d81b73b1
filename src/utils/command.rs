//! External command execution.
//!
//! Every OS-level side effect the deployment needs from outside the process
//! (service control, ownership changes, the identity query) is described as a
//! [`ShellCommand`] and handed to a [`CommandRunner`]. The production runner,
//! [`SystemCommandRunner`], spawns the program with `tokio::process` and waits
//! for it to exit; tests swap in a recording double so no process is spawned.
//!
//! Runners only report what happened. Deciding whether a non-zero exit status
//! is fatal belongs to [`ExecutionContext::execute`](crate::core::ExecutionContext::execute),
//! which honours [`ShellCommand::best_effort`].

use anyhow::{Context, Result};
use futures::future::BoxFuture;
use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

use crate::core::AggregateError;

/// A program invocation with its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    program: String,
    args: Vec<String>,
    best_effort: bool,
}

impl ShellCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            best_effort: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Marks the command as ignorable: a non-zero exit status is logged
    /// instead of failing the stage. Reserved for idempotent actions.
    pub const fn best_effort(mut self) -> Self {
        self.best_effort = true;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    pub const fn is_best_effort(&self) -> bool {
        self.best_effort
    }

    /// `whoami`
    pub fn whoami() -> Self {
        Self::new("whoami")
    }

    /// `service <name> stop`, best-effort since stopping a stopped service is a no-op.
    pub fn service_stop(service: &str) -> Self {
        Self::new("service").args([service, "stop"]).best_effort()
    }

    /// `service <name> start`
    pub fn service_start(service: &str) -> Self {
        Self::new("service").args([service, "start"])
    }

    /// `chown -R <uid>:<gid> <path>`
    pub fn chown_recursive(uid: &str, gid: &str, path: impl Into<PathBuf>) -> Self {
        let path: PathBuf = path.into();
        Self::new("chown").args(["-R".to_string(), format!("{uid}:{gid}"), path.display().to_string()])
    }
}

impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// What a finished command produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// A successful run printing `stdout`.
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A failed run with the given exit code.
    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.code == Some(0)
    }

    /// Human-readable exit status.
    pub fn status_description(&self) -> String {
        match self.code {
            Some(code) => format!("exit code {code}"),
            None => "a signal".to_string(),
        }
    }
}

/// Capability to run external commands.
///
/// Implementations block the calling task until the child exits and never
/// apply a timeout of their own.
pub trait CommandRunner: Send + Sync {
    /// Runs `command` to completion.
    ///
    /// An `Err` means the command couldn't be run at all (missing program,
    /// spawn failure). A non-zero exit status is reported through
    /// [`CommandOutput::code`].
    fn run<'a>(&'a self, command: &'a ShellCommand) -> BoxFuture<'a, Result<CommandOutput>>;
}

/// Runs commands as real child processes.
#[derive(Debug, Clone, Default)]
pub struct SystemCommandRunner;

impl SystemCommandRunner {
    pub fn new() -> Self {
        Self
    }

    async fn spawn(command: &ShellCommand) -> Result<CommandOutput> {
        let program = which::which(command.program()).map_err(|_| AggregateError::CommandFailed {
            command: command.to_string(),
            status: "not started".to_string(),
            stderr: format!("Program '{}' was not found in PATH", command.program()),
        })?;

        let start = std::time::Instant::now();
        tracing::debug!(target: "command", "Executing command: {}", command);

        let output = Command::new(&program)
            .args(command.arguments())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .with_context(|| format!("Failed to execute {command}"))?;

        let result = CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };

        if !result.stdout.is_empty() {
            tracing::debug!(target: "command", "{}", result.stdout.trim());
        }
        if !result.stderr.is_empty() {
            tracing::debug!(target: "command", "{}", result.stderr.trim());
        }
        tracing::debug!(
            target: "command",
            "{} finished with {} in {}ms",
            command.program(),
            result.status_description(),
            start.elapsed().as_millis()
        );

        Ok(result)
    }
}

impl CommandRunner for SystemCommandRunner {
    fn run<'a>(&'a self, command: &'a ShellCommand) -> BoxFuture<'a, Result<CommandOutput>> {
        Box::pin(Self::spawn(command))
    }
}
