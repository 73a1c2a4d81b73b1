//! File system helpers shared by the deployment stages.
//!
//! Writes that must never be observed half-done (the deployed-version state
//! file, rendered configuration) go through [`atomic_write`]. Paths read from
//! the configuration file are expanded with [`expand_path`] before use.

pub mod atomic;
pub mod dirs;

pub use atomic::atomic_write;
pub use dirs::{ensure_dir, ensure_parent_dir, expand_path, remove_dir_all};
