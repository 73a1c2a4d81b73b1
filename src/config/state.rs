//! The deployed-version state file.
//!
//! `<home>/aggregate.version` holds the release tag of the last successful
//! deployment on a single line. A missing file means nothing is installed.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::core::AggregateError;
use crate::utils::atomic_write;
use crate::version::VersionCode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Returns the installed version, or `None` when nothing is installed.
    ///
    /// Tags that don't follow the version grammar are read as legacy
    /// versions. An empty file is a configuration error.
    pub fn read(&self) -> Result<Option<VersionCode>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read {}", self.path.display()));
            }
        };

        let literal = content.lines().next().unwrap_or_default().trim();
        if literal.is_empty() {
            return Err(AggregateError::ConfigurationError {
                message: format!("State file {} is empty", self.path.display()),
            }
            .into());
        }

        Ok(Some(VersionCode::parse_or_legacy(literal)))
    }

    /// Records `version` as installed, replacing the file atomically.
    pub fn write(&self, version: &VersionCode) -> Result<()> {
        atomic_write(&self.path, version.literal().as_bytes())
            .with_context(|| format!("Failed to record installed version {version}"))?;
        tracing::info!("Recorded installed version {} in {}", version, self.path.display());
        Ok(())
    }
}
