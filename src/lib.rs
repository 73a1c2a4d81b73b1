//! aggregate-cli - installer and updater for ODK Aggregate
//!
//! Installs an ODK Aggregate WAR package into a Tomcat webapps directory,
//! updates an existing deployment to another release after backing it up,
//! and lists the releases available on GitHub.
//!
//! # Architecture Overview
//!
//! Data flows leaf to root:
//!
//! - [`version`] parses release tags into totally ordered [`version::VersionCode`]s
//! - [`releases`] fetches the GitHub release list and ranks installable releases
//! - [`selector`] turns the user's intent (custom build, requested version or
//!   latest) into one target version and download URL
//! - [`deploy`] runs the install/update pipeline as ordered, named stages and
//!   backs up the current deployment before an update
//!
//! Supporting modules:
//!
//! - [`config`] - JSON configuration, rendered webapp configuration, state file
//! - [`core`] - error taxonomy and the per-run [`core::ExecutionContext`]
//! - [`utils`] - external command abstraction and file system helpers
//! - [`cli`] - clap command-line surface
//! - [`constants`] - endpoints, file names and timeouts
//!
//! # Failure policy
//!
//! Every error is fatal and propagates to the binary, which prints it with a
//! suggestion and exits with status 1. A deployment stops at its first failing
//! stage and isn't rolled back. Declining the confirmation prompt is not an
//! error and exits with status 0.

pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod deploy;
pub mod releases;
pub mod selector;
pub mod utils;
pub mod version;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
