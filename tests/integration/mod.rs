//! Integration test suite for aggregate-cli
//!
//! End-to-end tests of the install, update and list operations. External
//! commands are recorded instead of run, confirmation answers are scripted,
//! and packages and release lists are served by local mockito servers, so the
//! suite needs neither root nor network access.
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! - **install**: fresh installations, preconditions, cancellation
//! - **update**: backups, the no-action guard, stop-on-first-failure
//! - **list**: catalog listing and endpoint override
//! - **cli**: the binary's exit codes and error reports

mod cli;
mod install;
mod update;

use aggregate_cli::core::ExecutionContext;
use aggregate_cli::test_utils::{RecordingRunner, ScriptedPrompter, war_fixture};
use std::sync::Arc;

/// Context around recording doubles, answering `answers` at prompts.
pub fn test_context(answers: &[&str]) -> (ExecutionContext, Arc<RecordingRunner>, Arc<ScriptedPrompter>) {
    test_context_with(RecordingRunner::new(), answers)
}

pub fn test_context_with(
    runner: RecordingRunner,
    answers: &[&str],
) -> (ExecutionContext, Arc<RecordingRunner>, Arc<ScriptedPrompter>) {
    aggregate_cli::test_utils::init_test_logging(None);
    let runner = Arc::new(runner);
    let prompter = Arc::new(ScriptedPrompter::new(answers));
    let ctx = ExecutionContext::new(runner.clone(), prompter.clone());
    (ctx, runner, prompter)
}

/// A small WAR package for `version`.
pub fn aggregate_war(version: &str) -> Vec<u8> {
    war_fixture(&[
        ("index.html", &format!("Aggregate {version}")),
        ("WEB-INF/web.xml", "<web-app/>"),
        ("WEB-INF/classes/logging.properties", "handlers=java.util.logging.ConsoleHandler\n"),
    ])
}
