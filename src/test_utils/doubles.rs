//! Recording and scripted stand-ins for external capabilities.

use anyhow::Result;
use chrono::{TimeZone, Utc};
use futures::future::BoxFuture;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::core::{AggregateError, Prompter};
use crate::releases::{Release, ReleaseSource, rank};
use crate::utils::{CommandOutput, CommandRunner, ShellCommand};

/// Records every command instead of running it.
///
/// `whoami` answers with the configured identity (`root` by default). Other
/// commands succeed unless registered with [`fail_on`](Self::fail_on).
#[derive(Debug)]
pub struct RecordingRunner {
    identity: String,
    failures: HashMap<String, i32>,
    commands: Mutex<Vec<String>>,
}

impl Default for RecordingRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self {
            identity: "root".to_string(),
            failures: HashMap::new(),
            commands: Mutex::new(Vec::new()),
        }
    }

    /// Identity reported by `whoami`.
    #[must_use]
    pub fn identity(mut self, identity: &str) -> Self {
        self.identity = identity.to_string();
        self
    }

    /// Makes the command whose full command line is `command` exit with `code`.
    #[must_use]
    pub fn fail_on(mut self, command: &str, code: i32) -> Self {
        self.failures.insert(command.to_string(), code);
        self
    }

    /// Command lines run so far, in order.
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    /// Command lines run so far, excluding identity queries.
    pub fn side_effects(&self) -> Vec<String> {
        self.commands().into_iter().filter(|c| c != "whoami").collect()
    }
}

impl CommandRunner for RecordingRunner {
    fn run<'a>(&'a self, command: &'a ShellCommand) -> BoxFuture<'a, Result<CommandOutput>> {
        Box::pin(async move {
            let line = command.to_string();
            self.commands.lock().unwrap().push(line.clone());

            if command.program() == "whoami" {
                return Ok(CommandOutput::success(format!("{}\n", self.identity)));
            }
            Ok(match self.failures.get(&line) {
                Some(&code) => CommandOutput::failure(code, format!("{line}: simulated failure")),
                None => CommandOutput::success(""),
            })
        })
    }
}

/// Answers prompts from a fixed script; end of input once exhausted.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().map(|a| format!("{a}\n")).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Prompts shown so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl Prompter for ScriptedPrompter {
    fn read_line<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<Option<String>>> {
        Box::pin(async move {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.answers.lock().unwrap().pop_front())
        })
    }
}

/// Release source serving a fixed list of tags.
#[derive(Debug)]
pub struct StaticReleases {
    releases: Vec<Release>,
    unreachable: bool,
    fetches: AtomicUsize,
}

impl StaticReleases {
    /// Releases from `(tag, prerelease)` pairs, all published at the same instant.
    pub fn new(tags: &[(&str, bool)]) -> Self {
        let published_at = Utc.with_ymd_and_hms(2019, 5, 14, 10, 0, 0).unwrap();
        Self {
            releases: tags
                .iter()
                .map(|(tag, pre)| Release::new(*tag, published_at, false, *pre))
                .collect(),
            unreachable: false,
            fetches: AtomicUsize::new(0),
        }
    }

    /// A source whose every fetch fails with a network error.
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::new(&[])
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl ReleaseSource for StaticReleases {
    async fn fetch(&self, include_pre_releases: bool) -> Result<Vec<Release>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.unreachable {
            return Err(AggregateError::NetworkError {
                operation: "Querying available releases".to_string(),
                reason: "connection refused".to_string(),
            }
            .into());
        }
        Ok(rank(self.releases.clone(), include_pre_releases))
    }
}
