//! Test utilities for aggregate-cli
//!
//! Test doubles for the capabilities an [`ExecutionContext`](crate::core::ExecutionContext)
//! and a [`ReleaseSource`](crate::releases::ReleaseSource) abstract over, plus
//! on-disk fixtures for deployments and WAR packages. Available to unit tests
//! and, through the `test-utils` feature, to the integration suite.
//!
//! # Example
//!
//! ```rust,no_run
//! use aggregate_cli::core::ExecutionContext;
//! use aggregate_cli::test_utils::{RecordingRunner, ScriptedPrompter};
//! use std::sync::Arc;
//!
//! let runner = Arc::new(RecordingRunner::new().fail_on("service tomcat8 start", 1));
//! let ctx = ExecutionContext::new(runner.clone(), Arc::new(ScriptedPrompter::new(&["yes"])));
//! ```

pub mod doubles;
pub mod fixtures;

pub use doubles::{RecordingRunner, ScriptedPrompter, StaticReleases};
pub use fixtures::{TestDeployment, war_fixture};

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Uses `level` when given, otherwise `RUST_LOG`. Does nothing when neither
/// is set. Safe to call from every test.
///
/// ```bash
/// RUST_LOG=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}
