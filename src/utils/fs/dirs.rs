//! Directory creation, removal and path expansion.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Creates `path` and all its parents. Fails if `path` exists as a file.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path).with_context(|| {
            format!(
                "Failed to create directory: {}\n\nCheck directory permissions and path validity",
                path.display()
            )
        })?;
    } else if !path.is_dir() {
        return Err(anyhow::anyhow!("Path exists but is not a directory: {}", path.display()));
    }
    Ok(())
}

pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        ensure_dir(parent)?;
    }
    Ok(())
}

/// Removes a directory tree. A missing directory is not an error.
pub fn remove_dir_all(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path)
            .with_context(|| format!("Failed to remove directory: {}", path.display()))?;
    }
    Ok(())
}

/// Expands `~` and `$VAR` references in a configured path.
pub fn expand_path(raw: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(raw).with_context(|| {
        format!(
            "Failed to expand environment variables in path: {raw}\n\n\
            Check that every referenced variable is set (e.g. $HOME)"
        )
    })?;
    Ok(PathBuf::from(expanded.into_owned()))
}
