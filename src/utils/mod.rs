//! Process and filesystem utilities
//!
//! # Modules
//!
//! - [`command`] - External command description and execution
//! - [`fs`] - Atomic file writes and directory helpers

pub mod command;
pub mod fs;

pub use command::{CommandOutput, CommandRunner, ShellCommand, SystemCommandRunner};
pub use fs::{atomic_write, ensure_dir, expand_path, remove_dir_all};
