//! Per-run execution context.
//!
//! An [`ExecutionContext`] is created once per command and threaded through
//! the deployment pipeline. It carries the user's output preferences, the
//! confirmation mode and the two capabilities the pipeline needs from the
//! outside world: running external commands ([`CommandRunner`]) and asking
//! the user a yes/no question ([`Prompter`]). Tests build a context around
//! recording doubles so no process is spawned and no terminal is read.

use anyhow::{Context, Result};
use colored::Colorize;
use futures::future::BoxFuture;
use std::io::{BufRead, Write};
use std::sync::Arc;

use crate::constants::SUPERUSER;
use crate::core::AggregateError;
use crate::utils::{CommandOutput, CommandRunner, ShellCommand, SystemCommandRunner};

/// Answer read from a yes/no prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
    /// Input that is neither yes nor no; the question is asked again.
    Unrecognized,
}

impl Answer {
    /// Interprets one line of user input. Empty input is the default answer (no).
    pub fn parse(input: &str) -> Self {
        match input.trim().to_ascii_lowercase().as_str() {
            "yes" | "y" => Self::Yes,
            "no" | "n" | "" => Self::No,
            _ => Self::Unrecognized,
        }
    }
}

/// Capability to ask the user a question and read one line back.
pub trait Prompter: Send + Sync {
    /// Prints `prompt` and returns the next input line, or `None` at end of input.
    fn read_line<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<Option<String>>>;
}

/// Reads answers from the process' standard input.
#[derive(Debug, Clone, Default)]
pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn read_line<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<Option<String>>> {
        let prompt = prompt.to_string();
        Box::pin(async move {
            tokio::task::spawn_blocking(move || {
                print!("{prompt}");
                std::io::stdout().flush().context("Failed to flush stdout")?;

                let mut line = String::new();
                let read = std::io::stdin()
                    .lock()
                    .read_line(&mut line)
                    .context("Failed to read from stdin")?;
                Ok(if read == 0 { None } else { Some(line) })
            })
            .await
            .context("Prompt task panicked")?
        })
    }
}

/// Output preferences plus the external capabilities of one run.
#[derive(Clone)]
pub struct ExecutionContext {
    verbose: bool,
    always_yes: bool,
    runner: Arc<dyn CommandRunner>,
    prompter: Arc<dyn Prompter>,
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("verbose", &self.verbose)
            .field("always_yes", &self.always_yes)
            .finish_non_exhaustive()
    }
}

impl ExecutionContext {
    pub fn new(runner: Arc<dyn CommandRunner>, prompter: Arc<dyn Prompter>) -> Self {
        Self {
            verbose: false,
            always_yes: false,
            runner,
            prompter,
        }
    }

    /// Context spawning real processes and reading stdin.
    pub fn system() -> Self {
        Self::new(Arc::new(SystemCommandRunner::new()), Arc::new(StdinPrompter))
    }

    #[must_use]
    pub const fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    #[must_use]
    pub const fn always_yes(mut self, always_yes: bool) -> Self {
        self.always_yes = always_yes;
        self
    }

    pub const fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub const fn is_always_yes(&self) -> bool {
        self.always_yes
    }

    /// Prints a line of user-facing output.
    pub fn out(&self, message: impl AsRef<str>) {
        println!("{}", message.as_ref());
    }

    /// Prints the label opening a stage bracket.
    pub fn stage_started(&self, label: &str) {
        println!("- {label}");
    }

    /// Prints the line closing a stage bracket.
    pub fn stage_done(&self) {
        println!("  {}", "done".green());
    }

    /// Asks a yes/no question; no is the default.
    ///
    /// In always-yes mode the question is printed and answered without
    /// reading input. End of input counts as no.
    pub async fn confirm(&self, question: &str) -> Result<bool> {
        let prompt = format!("{question} (yes/NO): ");

        if self.always_yes {
            println!("{prompt}yes");
            return Ok(true);
        }

        loop {
            let Some(line) = self.prompter.read_line(&prompt).await? else {
                tracing::debug!("End of input at confirmation prompt, assuming no");
                return Ok(false);
            };
            match Answer::parse(&line) {
                Answer::Yes => return Ok(true),
                Answer::No => return Ok(false),
                Answer::Unrecognized => {
                    tracing::debug!("Unrecognized answer '{}', asking again", line.trim());
                }
            }
        }
    }

    /// Runs `command` and checks its exit status.
    ///
    /// A non-zero status fails with [`AggregateError::CommandFailed`] unless
    /// the command is best-effort, in which case it is logged and the output
    /// returned.
    pub async fn execute(&self, command: &ShellCommand) -> Result<CommandOutput> {
        let output = self.runner.run(command).await?;

        if output.succeeded() {
            return Ok(output);
        }

        if command.is_best_effort() {
            tracing::warn!(
                "Ignoring failure of '{}' ({}): {}",
                command,
                output.status_description(),
                output.stderr.trim()
            );
            return Ok(output);
        }

        Err(AggregateError::CommandFailed {
            command: command.to_string(),
            status: output.status_description(),
            stderr: output.stderr.trim().to_string(),
        }
        .into())
    }

    /// Fails with [`AggregateError::PrivilegeRequired`] unless the identity
    /// query reports the superuser.
    pub async fn require_superuser(&self) -> Result<()> {
        let output = self
            .execute(&ShellCommand::whoami())
            .await
            .context("Failed to determine the current user")?;
        let identity = output.stdout.trim();

        if identity == SUPERUSER {
            tracing::debug!("Running as {}", identity);
            Ok(())
        } else {
            Err(AggregateError::PrivilegeRequired {
                identity: identity.to_string(),
            }
            .into())
        }
    }
}
